use rustc_hash::FxHashMap;

use super::graphlet::{CensusVector, Graphlet, Shape, GRAPHLET_COUNT};
use crate::types::{GraphletError, NodeId, Result};

/// Per-node census vectors with running totals and an undo journal.
///
/// The journal holds the pre-transaction value of every vector touched since
/// [`Tallies::begin`], which is enough to restore the exact prior state.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tallies {
    vectors: FxHashMap<NodeId, CensusVector>,
    totals: [u64; GRAPHLET_COUNT],
    journal: Option<Journal>,
}

#[derive(Clone, Debug, Default)]
struct Journal {
    touched: FxHashMap<NodeId, Option<CensusVector>>,
    totals: [u64; GRAPHLET_COUNT],
}

impl Tallies {
    pub(crate) fn from_vectors(vectors: FxHashMap<NodeId, CensusVector>) -> Self {
        let mut totals = [0u64; GRAPHLET_COUNT];
        for vector in vectors.values() {
            for (total, count) in totals.iter_mut().zip(vector.0) {
                *total += count;
            }
        }
        Self {
            vectors,
            totals,
            journal: None,
        }
    }

    pub(crate) fn vector(&self, node: NodeId) -> Option<&CensusVector> {
        self.vectors.get(&node)
    }

    pub(crate) fn vectors(&self) -> impl Iterator<Item = (NodeId, &CensusVector)> {
        self.vectors.iter().map(|(node, vector)| (*node, vector))
    }

    pub(crate) fn totals(&self) -> &[u64; GRAPHLET_COUNT] {
        &self.totals
    }

    /// Starts a transaction, accepting whatever the previous one did.
    pub(crate) fn begin(&mut self) {
        self.journal = Some(Journal {
            touched: FxHashMap::default(),
            totals: self.totals,
        });
    }

    pub(crate) fn touched(&self) -> usize {
        self.journal.as_ref().map_or(0, |j| j.touched.len())
    }

    fn slot(&mut self, node: NodeId) -> &mut CensusVector {
        if let Some(journal) = self.journal.as_mut() {
            journal
                .touched
                .entry(node)
                .or_insert_with(|| self.vectors.get(&node).copied());
        }
        self.vectors.entry(node).or_default()
    }

    pub(crate) fn bump(&mut self, node: NodeId, graphlet: Graphlet) {
        self.slot(node).bump(graphlet);
        self.totals[graphlet.index()] += 1;
    }

    pub(crate) fn drop_one(&mut self, node: NodeId, graphlet: Graphlet) -> Result<()> {
        self.slot(node).drop_one(graphlet)?;
        let total = &mut self.totals[graphlet.index()];
        *total = total
            .checked_sub(1)
            .ok_or(GraphletError::Invariant("graphlet total below zero"))?;
        Ok(())
    }

    /// Credits `shape` to the tallied members of `nodes`.
    pub(crate) fn record(&mut self, nodes: &[NodeId], shape: Shape) {
        for pos in shape.members() {
            self.bump(nodes[pos], shape.graphlet);
        }
    }

    /// Withdraws a credit made by [`Tallies::record`].
    pub(crate) fn retract(&mut self, nodes: &[NodeId], shape: Shape) -> Result<()> {
        for pos in shape.members() {
            self.drop_one(nodes[pos], shape.graphlet)?;
        }
        Ok(())
    }

    /// Restores the state from before the last [`Tallies::begin`].
    pub(crate) fn rollback(&mut self) -> Result<usize> {
        let journal = self
            .journal
            .take()
            .ok_or(GraphletError::NothingToRevert("census"))?;
        let restored = journal.touched.len();
        for (node, before) in journal.touched {
            match before {
                Some(vector) => {
                    self.vectors.insert(node, vector);
                }
                None => {
                    self.vectors.remove(&node);
                }
            }
        }
        self.totals = journal.totals;
        Ok(restored)
    }
}
