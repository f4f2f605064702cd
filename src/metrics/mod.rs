//! Scalar topology metrics sharing the census update/revert contract.
//!
//! Every metric is computed once with [`TopologyMetric::update`], follows
//! staged batches with [`TopologyMetric::incremental_update`] and can undo the
//! most recent batch with [`TopologyMetric::revert`]. Metrics are looked up by
//! name in [`MetricRegistry`].

use rustc_hash::FxHashSet;

use crate::census::GraphletCensus;
use crate::config::EngineConfig;
use crate::network::{EdgeKey, GraphContext, StagedBatch};
use crate::types::{GraphletError, Result};

/// Largest out-degree over the link count.
pub mod fan_out;
/// Share of nodes with outgoing links.
pub mod out_degree;

pub use fan_out::MaxFanOutRatio;
pub use out_degree::OutDegreeFraction;

/// A scalar statistic of a graph context kept current across staged batches.
pub trait TopologyMetric: Send {
    /// Registered name.
    fn name(&self) -> &'static str;

    /// Recomputes from the committed graph.
    fn update(&mut self, graph: &GraphContext) -> Result<()>;

    /// Moves to the state `graph` would have with `batch` committed.
    fn incremental_update(&mut self, graph: &GraphContext, batch: &mut StagedBatch) -> Result<()>;

    /// Undoes the most recent incremental update.
    fn revert(&mut self) -> Result<()>;

    /// Current value.
    fn value(&self) -> Result<f64>;

    /// Runs [`TopologyMetric::incremental_update`] on the batch staged in `graph`.
    fn apply_staged(&mut self, graph: &mut GraphContext) -> Result<()> {
        graph.with_staged(|graph, batch| self.incremental_update(graph, batch))
    }
}

impl TopologyMetric for GraphletCensus {
    fn name(&self) -> &'static str {
        "graphlet-census"
    }

    fn update(&mut self, graph: &GraphContext) -> Result<()> {
        self.recompute(graph)
    }

    fn incremental_update(&mut self, graph: &GraphContext, batch: &mut StagedBatch) -> Result<()> {
        GraphletCensus::incremental_update(self, graph, batch).map(|_| ())
    }

    fn revert(&mut self) -> Result<()> {
        GraphletCensus::revert(self)
    }

    fn value(&self) -> Result<f64> {
        self.frequency(self.options().penalized_graphlet)
    }
}

/// Directed arcs a batch really removes and inserts, in application order.
///
/// Toggled pairs are cancelled out of `batch` first. Removing an arc that is
/// not committed is an error; self-loops and duplicate insertions are skipped
/// the way a commit skips them.
pub(crate) fn effective_edits(
    graph: &GraphContext,
    batch: &mut StagedBatch,
) -> Result<(Vec<EdgeKey>, Vec<EdgeKey>)> {
    batch.cancel_toggled();
    let mut removed = Vec::with_capacity(batch.deleted.len());
    let mut gone: FxHashSet<EdgeKey> = FxHashSet::default();
    for link in &batch.deleted {
        let key = link.key();
        if !graph.contains_edge(key.source, key.target) || !gone.insert(key) {
            return Err(graph.unknown_edge(key));
        }
        removed.push(key);
    }
    let mut inserted = Vec::with_capacity(batch.added.len());
    let mut fresh: FxHashSet<EdgeKey> = FxHashSet::default();
    for link in &batch.added {
        let key = link.key();
        let present = graph.contains_edge(key.source, key.target) && !gone.contains(&key);
        if key.is_self_loop() || present || !fresh.insert(key) {
            continue;
        }
        inserted.push(key);
    }
    Ok((removed, inserted))
}

type Constructor = fn(&EngineConfig) -> Box<dyn TopologyMetric>;

fn graphlet_census(config: &EngineConfig) -> Box<dyn TopologyMetric> {
    Box::new(GraphletCensus::new(config.census.clone()))
}

fn out_degree_fraction(_: &EngineConfig) -> Box<dyn TopologyMetric> {
    Box::new(OutDegreeFraction::new())
}

fn max_fan_out(_: &EngineConfig) -> Box<dyn TopologyMetric> {
    Box::new(MaxFanOutRatio::new())
}

static METRICS: &[(&str, Constructor)] = &[
    ("graphlet-census", graphlet_census),
    (OutDegreeFraction::NAME, out_degree_fraction),
    (MaxFanOutRatio::NAME, max_fan_out),
];

/// Static table of the metrics that can be built by name.
pub struct MetricRegistry;

impl MetricRegistry {
    /// Registered names, in table order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        METRICS.iter().map(|(name, _)| *name)
    }

    /// Builds the metric registered as `name`.
    pub fn create(name: &str, config: &EngineConfig) -> Result<Box<dyn TopologyMetric>> {
        METRICS
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, build)| build(config))
            .ok_or_else(|| GraphletError::UnknownMetric(name.to_string()))
    }

    /// Builds every metric listed in `config.metrics.enabled`.
    pub fn create_enabled(config: &EngineConfig) -> Result<Vec<Box<dyn TopologyMetric>>> {
        config
            .metrics
            .enabled
            .iter()
            .map(|name| Self::create(name, config))
            .collect()
    }
}
