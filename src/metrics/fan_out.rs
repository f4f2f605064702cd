use rustc_hash::FxHashMap;
use tracing::debug;

use super::{effective_edits, TopologyMetric};
use crate::network::{GraphContext, StagedBatch};
use crate::types::{GraphletError, NodeId, Result};

/// Largest out-degree in the context divided by its link count.
///
/// Out-degrees are kept per node so a batch only touches its endpoints. The
/// maximum is rescanned when a batch lowers the degree of a node that held it.
#[derive(Clone, Debug, Default)]
pub struct MaxFanOutRatio {
    fan_out: FxHashMap<NodeId, usize>,
    max: usize,
    links: usize,
    initialized: bool,
    undo: Option<Undo>,
}

#[derive(Clone, Debug)]
struct Undo {
    fan_out: Vec<(NodeId, usize)>,
    max: usize,
    links: usize,
}

impl MaxFanOutRatio {
    /// Registered name.
    pub const NAME: &'static str = "max-fan-out";

    /// Creates an uninitialized metric.
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest out-degree.
    pub fn max_fan_out(&self) -> Result<usize> {
        self.require_initialized()?;
        Ok(self.max)
    }

    fn require_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(GraphletError::NotInitialized(Self::NAME));
        }
        Ok(())
    }

    fn set(&mut self, node: NodeId, degree: usize) {
        if degree == 0 {
            self.fan_out.remove(&node);
        } else {
            self.fan_out.insert(node, degree);
        }
    }
}

impl TopologyMetric for MaxFanOutRatio {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn update(&mut self, graph: &GraphContext) -> Result<()> {
        self.fan_out.clear();
        for &node in graph.nodes() {
            let degree = graph.out_degree(node);
            if degree > 0 {
                self.fan_out.insert(node, degree);
            }
        }
        self.max = self.fan_out.values().copied().max().unwrap_or(0);
        self.links = graph.link_count();
        self.initialized = true;
        self.undo = None;
        Ok(())
    }

    fn incremental_update(&mut self, graph: &GraphContext, batch: &mut StagedBatch) -> Result<()> {
        self.require_initialized()?;
        let (removed, inserted) = effective_edits(graph, batch)?;

        let mut delta: FxHashMap<NodeId, isize> = FxHashMap::default();
        for key in &removed {
            *delta.entry(key.source).or_default() -= 1;
        }
        for key in &inserted {
            *delta.entry(key.source).or_default() += 1;
        }

        let mut undo = Undo {
            fan_out: Vec::with_capacity(delta.len()),
            max: self.max,
            links: self.links,
        };
        let mut rescan = false;
        for (&node, &change) in &delta {
            let old = self.fan_out.get(&node).copied().unwrap_or(0);
            let new = old
                .checked_add_signed(change)
                .ok_or(GraphletError::Invariant("out-degree dropped below zero"))?;
            undo.fan_out.push((node, old));
            self.set(node, new);
            if new > self.max {
                self.max = new;
            } else if old == self.max && new < old {
                rescan = true;
            }
        }
        if rescan {
            self.max = self.fan_out.values().copied().max().unwrap_or(0);
        }
        self.links = self.links + inserted.len() - removed.len();
        debug!(
            max = self.max,
            links = self.links,
            rescan,
            "metrics.fan_out.incremental"
        );
        self.undo = Some(undo);
        Ok(())
    }

    fn revert(&mut self) -> Result<()> {
        let undo = self
            .undo
            .take()
            .ok_or(GraphletError::NothingToRevert(Self::NAME))?;
        for (node, degree) in undo.fan_out {
            self.set(node, degree);
        }
        self.max = undo.max;
        self.links = undo.links;
        Ok(())
    }

    fn value(&self) -> Result<f64> {
        self.require_initialized()?;
        if self.links == 0 {
            return Ok(0.0);
        }
        Ok(self.max as f64 / self.links as f64)
    }
}
