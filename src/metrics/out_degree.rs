use rustc_hash::FxHashMap;
use tracing::debug;

use super::{effective_edits, TopologyMetric};
use crate::network::{GraphContext, StagedBatch};
use crate::types::{GraphletError, NodeId, Result};

/// Fraction of context nodes that have at least one outgoing link.
#[derive(Clone, Debug, Default)]
pub struct OutDegreeFraction {
    counts: Option<Counts>,
    previous: Option<Counts>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Counts {
    nodes: usize,
    sources: usize,
}

impl OutDegreeFraction {
    /// Registered name.
    pub const NAME: &'static str = "out-degree-fraction";

    /// Creates an uninitialized metric.
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self) -> Result<Counts> {
        self.counts
            .ok_or(GraphletError::NotInitialized(Self::NAME))
    }

    /// Nodes with at least one incident link.
    pub fn node_count(&self) -> Result<usize> {
        Ok(self.counts()?.nodes)
    }

    /// Nodes with at least one outgoing link.
    pub fn source_count(&self) -> Result<usize> {
        Ok(self.counts()?.sources)
    }
}

fn slot<'a>(
    degree: &'a mut FxHashMap<NodeId, (usize, usize)>,
    graph: &GraphContext,
    node: NodeId,
) -> &'a mut (usize, usize) {
    degree
        .entry(node)
        .or_insert_with(|| (graph.in_degree(node), graph.out_degree(node)))
}

impl TopologyMetric for OutDegreeFraction {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn update(&mut self, graph: &GraphContext) -> Result<()> {
        let sources = graph
            .nodes()
            .iter()
            .filter(|&&node| graph.out_degree(node) > 0)
            .count();
        self.counts = Some(Counts {
            nodes: graph.node_count(),
            sources,
        });
        self.previous = None;
        Ok(())
    }

    fn incremental_update(&mut self, graph: &GraphContext, batch: &mut StagedBatch) -> Result<()> {
        let before = self.counts()?;
        let (removed, inserted) = effective_edits(graph, batch)?;

        // (in, out) degree after the batch, for every touched node
        let mut degree: FxHashMap<NodeId, (usize, usize)> = FxHashMap::default();
        for key in &removed {
            slot(&mut degree, graph, key.source).1 -= 1;
            slot(&mut degree, graph, key.target).0 -= 1;
        }
        for key in &inserted {
            slot(&mut degree, graph, key.source).1 += 1;
            slot(&mut degree, graph, key.target).0 += 1;
        }

        let mut after = before;
        for (&node, &(incoming, outgoing)) in &degree {
            let was_node = graph.contains_node(node);
            let was_source = graph.out_degree(node) > 0;
            let is_node = incoming + outgoing > 0;
            let is_source = outgoing > 0;
            match (was_node, is_node) {
                (false, true) => after.nodes += 1,
                (true, false) => after.nodes -= 1,
                _ => {}
            }
            match (was_source, is_source) {
                (false, true) => after.sources += 1,
                (true, false) => after.sources -= 1,
                _ => {}
            }
        }
        debug!(
            nodes = after.nodes,
            sources = after.sources,
            touched = degree.len(),
            "metrics.out_degree.incremental"
        );
        self.previous = Some(before);
        self.counts = Some(after);
        Ok(())
    }

    fn revert(&mut self) -> Result<()> {
        let previous = self
            .previous
            .take()
            .ok_or(GraphletError::NothingToRevert(Self::NAME))?;
        self.counts = Some(previous);
        Ok(())
    }

    fn value(&self) -> Result<f64> {
        let counts = self.counts()?;
        if counts.nodes == 0 {
            return Ok(0.0);
        }
        Ok(counts.sources as f64 / counts.nodes as f64)
    }
}
