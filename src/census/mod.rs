//! Graphlet census: per-node counts of the connected induced subgraphs on
//! two to four nodes, kept current across staged edit batches.
//!
//! [`GraphletCensus::recompute`] counts from scratch. After that,
//! [`GraphletCensus::incremental_update`] moves the counts to the state the
//! graph would have if the staged batch were committed, and
//! [`GraphletCensus::revert`] undoes the most recent update. The census has
//! no commit step: keeping the result of an update is simply not reverting.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::network::{GraphContext, StagedBatch};
use crate::types::{ContextId, GraphletError, NodeId, Result};

/// Shapes and per-node vectors.
pub mod graphlet;
/// Incremental batch updates.
pub mod incremental;
/// Transaction-scoped adjacency overlay.
pub mod overlay;

pub(crate) mod full;
mod tally;

pub use full::node_vector;
pub use graphlet::{classify_quad, classify_triad, CensusVector, Graphlet, Shape, GRAPHLET_COUNT};
pub use incremental::BatchStats;
pub use overlay::{EdgeState, Overlay};

use tally::Tallies;

/// Knobs of a [`GraphletCensus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusOptions {
    /// Recompute from scratch after every incremental update and fail on any
    /// difference. Slow; meant for debugging.
    pub verify_incremental: bool,
    /// Graphlet whose frequency the census reports as its metric value.
    pub penalized_graphlet: Graphlet,
    /// Log each batch at info level instead of debug.
    pub log_batches: bool,
}

impl Default for CensusOptions {
    fn default() -> Self {
        Self {
            verify_incremental: false,
            penalized_graphlet: Graphlet::Star,
            log_batches: false,
        }
    }
}

impl CensusOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the recompute-and-compare self check.
    pub fn verify_incremental(mut self, verify: bool) -> Self {
        self.verify_incremental = verify;
        self
    }

    /// Selects the graphlet reported as the metric value.
    pub fn penalized_graphlet(mut self, graphlet: Graphlet) -> Self {
        self.penalized_graphlet = graphlet;
        self
    }

    /// Raises per-batch logging to info level.
    pub fn log_batches(mut self, log: bool) -> Self {
        self.log_batches = log;
        self
    }
}

/// Census engine bound to one graph context.
#[derive(Debug, Default)]
pub struct GraphletCensus {
    options: CensusOptions,
    bound: Option<ContextId>,
    tallies: Tallies,
    last_batch: Option<BatchStats>,
}

impl GraphletCensus {
    /// Creates an engine; nothing is counted until [`GraphletCensus::recompute`].
    pub fn new(options: CensusOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Options the engine was built with.
    pub fn options(&self) -> &CensusOptions {
        &self.options
    }

    /// Whether a full recomputation has run.
    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    /// Context the counts describe.
    pub fn bound_context(&self) -> Option<ContextId> {
        self.bound
    }

    /// Statistics of the most recent incremental update.
    pub fn last_batch(&self) -> Option<BatchStats> {
        self.last_batch
    }

    /// Forgets all counts and the bound context.
    pub fn reset(&mut self) {
        self.bound = None;
        self.tallies = Tallies::default();
        self.last_batch = None;
    }

    fn check_context(&self, graph: &GraphContext) -> Result<()> {
        match self.bound {
            Some(expected) if expected != graph.id() => Err(GraphletError::ContextMismatch {
                expected,
                found: graph.id(),
            }),
            _ => Ok(()),
        }
    }

    fn require_initialized(&self) -> Result<()> {
        if self.bound.is_none() {
            return Err(GraphletError::NotInitialized("graphlet census"));
        }
        Ok(())
    }

    /// Counts every graphlet of the committed graph from scratch.
    ///
    /// The first call binds the engine to `graph`'s context.
    pub fn recompute(&mut self, graph: &GraphContext) -> Result<()> {
        self.check_context(graph)?;
        let started = Instant::now();
        self.tallies = full::census(graph);
        self.bound = Some(graph.id());
        self.last_batch = None;
        debug!(
            context = graph.id().0,
            nodes = graph.node_count(),
            links = graph.link_count(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "census.recompute"
        );
        Ok(())
    }

    /// Moves the counts to the graph `graph` would become if `batch` were committed.
    ///
    /// Links that are both added and deleted in `batch` are removed from it
    /// first. If an error is returned the counts may be partially updated;
    /// [`GraphletCensus::revert`] restores them.
    pub fn incremental_update(
        &mut self,
        graph: &GraphContext,
        batch: &mut StagedBatch,
    ) -> Result<BatchStats> {
        self.require_initialized()?;
        self.check_context(graph)?;
        let started = Instant::now();
        let cancelled = batch.cancel_toggled().len();
        self.tallies.begin();
        let stats = incremental::apply_batch(graph, batch, &mut self.tallies)?;
        if self.options.verify_incremental {
            self.verify(graph, batch)?;
        }
        let elapsed_us = started.elapsed().as_micros() as u64;
        if self.options.log_batches {
            info!(
                context = graph.id().0,
                cancelled,
                removed = stats.removed,
                added = stats.added,
                absorbed = stats.absorbed,
                rejected = stats.rejected,
                reshaped = stats.reshaped,
                elapsed_us,
                "census.incremental.done"
            );
        } else {
            debug!(
                context = graph.id().0,
                cancelled,
                removed = stats.removed,
                added = stats.added,
                touched = self.tallies.touched(),
                elapsed_us,
                "census.incremental.done"
            );
        }
        self.last_batch = Some(stats);
        Ok(stats)
    }

    /// Runs [`GraphletCensus::incremental_update`] on the batch staged in `graph`.
    pub fn apply_staged(&mut self, graph: &mut GraphContext) -> Result<BatchStats> {
        graph.with_staged(|graph, batch| self.incremental_update(graph, batch))
    }

    /// Restores the counts from before the most recent incremental update.
    ///
    /// Fails when no update ran since the last recomputation or revert.
    pub fn revert(&mut self) -> Result<()> {
        let restored = self.tallies.rollback()?;
        self.last_batch = None;
        debug!(restored, "census.revert");
        Ok(())
    }

    fn verify(&self, graph: &GraphContext, batch: &StagedBatch) -> Result<()> {
        let expected = full::census(&graph.materialize(batch)?);
        let zero = CensusVector::ZERO;
        let mismatch = self
            .tallies
            .vectors()
            .chain(expected.vectors())
            .map(|(node, _)| node)
            .find(|&node| {
                let actual = self.tallies.vector(node).unwrap_or(&zero);
                let wanted = expected.vector(node).unwrap_or(&zero);
                actual != wanted
            });
        if let Some(node) = mismatch {
            warn!(
                node = %graph.registry().describe(node),
                actual = ?self.tallies.vector(node),
                expected = ?expected.vector(node),
                "census.verify.mismatch"
            );
            return Err(GraphletError::Invariant(
                "incremental census diverged from recomputation",
            ));
        }
        if self.tallies.totals() != expected.totals() {
            return Err(GraphletError::Invariant(
                "incremental census totals diverged from recomputation",
            ));
        }
        Ok(())
    }

    /// Number of distinct instances of each graphlet.
    pub fn global_counts(&self) -> Result<[u64; GRAPHLET_COUNT]> {
        self.require_initialized()?;
        let totals = self.tallies.totals();
        Ok(Graphlet::ALL.map(|g| totals[g.index()] / g.multiplicity()))
    }

    /// Counts normalized within the three-node and four-node groups.
    ///
    /// The edge slot is always 1. A group is all zero only when it has no
    /// instance at all.
    pub fn frequencies(&self) -> Result<[f64; GRAPHLET_COUNT]> {
        let counts = self.global_counts()?;
        let mut freq = [0.0; GRAPHLET_COUNT];
        freq[Graphlet::Edge.index()] = 1.0;
        for group in [1..3, 3..GRAPHLET_COUNT] {
            let sum: u64 = counts[group.clone()].iter().sum();
            if sum == 0 {
                continue;
            }
            for slot in group {
                freq[slot] = counts[slot] as f64 / sum as f64;
            }
        }
        Ok(freq)
    }

    /// Frequency of one graphlet.
    pub fn frequency(&self, graphlet: Graphlet) -> Result<f64> {
        Ok(self.frequencies()?[graphlet.index()])
    }

    /// Tallies of `node`; all zero for nodes without any.
    pub fn node_vector(&self, node: NodeId) -> Result<CensusVector> {
        self.require_initialized()?;
        Ok(self.tallies.vector(node).copied().unwrap_or_default())
    }

    /// Every node that has a vector, with the vector.
    pub fn vectors(&self) -> impl Iterator<Item = (NodeId, &CensusVector)> {
        self.tallies.vectors()
    }
}
