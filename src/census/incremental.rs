//! Batch updates of per-node tallies without touching the committed graph.
//!
//! Every directed edit that flips undirected adjacency of a pair `{u, v}` can
//! only change the induced shape of triples and quadruples containing both
//! `u` and `v`. Those are enumerated from the overlay neighborhoods, and the
//! tallies of each are moved from the shape it had to the shape it gets.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{trace, warn};

use super::graphlet::{classify_quad, classify_triad, Graphlet, Shape, QUAD_PAIRS, TRIAD_PAIRS};
use super::overlay::Overlay;
use super::tally::Tallies;
use crate::network::{EdgeKey, GraphContext, StagedBatch};
use crate::types::{NodeId, Result};

/// What an incremental update did with a batch.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BatchStats {
    /// Deletions that removed undirected adjacency.
    pub removed: usize,
    /// Insertions that created undirected adjacency.
    pub added: usize,
    /// Edits absorbed by a mirror arc.
    pub absorbed: usize,
    /// Insertions dropped as self-loops or duplicates.
    pub rejected: usize,
    /// Triples and quadruples whose shape changed.
    pub reshaped: usize,
}

/// One undirected pair whose adjacency flips.
#[derive(Copy, Clone, Debug)]
struct Toggle {
    u: NodeId,
    v: NodeId,
    connect: bool,
}

impl Toggle {
    fn is_pair(&self, a: NodeId, b: NodeId) -> bool {
        (a == self.u && b == self.v) || (a == self.v && b == self.u)
    }
}

struct Pass<'a> {
    graph: &'a GraphContext,
    overlay: &'a Overlay,
    tallies: &'a mut Tallies,
    toggle: Toggle,
    reshaped: usize,
}

impl Pass<'_> {
    fn before(&self, a: NodeId, b: NodeId) -> bool {
        self.overlay.adjacent(self.graph, a, b)
    }

    fn after(&self, a: NodeId, b: NodeId) -> bool {
        if self.toggle.is_pair(a, b) {
            self.toggle.connect
        } else {
            self.before(a, b)
        }
    }

    fn reshape(&mut self, nodes: &[NodeId], old: Option<Shape>, new: Option<Shape>) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if let Some(shape) = old {
            self.tallies.retract(nodes, shape)?;
        }
        if let Some(shape) = new {
            self.tallies.record(nodes, shape);
        }
        self.reshaped += 1;
        Ok(())
    }

    fn triad(&mut self, w: NodeId) -> Result<()> {
        let nodes = [self.toggle.u, self.toggle.v, w];
        let old = classify_triad(TRIAD_PAIRS.map(|(i, j)| self.before(nodes[i], nodes[j])));
        let new = classify_triad(TRIAD_PAIRS.map(|(i, j)| self.after(nodes[i], nodes[j])));
        self.reshape(&nodes, old, new)
    }

    fn quad(&mut self, w: NodeId, x: NodeId) -> Result<()> {
        let nodes = [self.toggle.u, self.toggle.v, w, x];
        let old = classify_quad(QUAD_PAIRS.map(|(i, j)| self.before(nodes[i], nodes[j])));
        let new = classify_quad(QUAD_PAIRS.map(|(i, j)| self.after(nodes[i], nodes[j])));
        self.reshape(&nodes, old, new)
    }

    fn run(&mut self) -> Result<()> {
        let Toggle { u, v, connect } = self.toggle;
        if connect {
            self.tallies.bump(u, Graphlet::Edge);
            self.tallies.bump(v, Graphlet::Edge);
        } else {
            self.tallies.drop_one(u, Graphlet::Edge)?;
            self.tallies.drop_one(v, Graphlet::Edge)?;
        }

        // third nodes: each closes a triangle with {u, v} or hangs off one end
        let mut third: SmallVec<[NodeId; 32]> = self
            .overlay
            .neighbors(self.graph, u)
            .into_iter()
            .chain(self.overlay.neighbors(self.graph, v))
            .filter(|&w| w != u && w != v)
            .collect();
        third.sort_unstable();
        third.dedup();

        for &w in &third {
            self.triad(w)?;
        }

        // fourth nodes hang off u, v or the third node; {w, x} and {x, w}
        // reach the same quadruple
        let mut seen: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();
        for &w in &third {
            let around_w = self.overlay.neighbors(self.graph, w);
            for &x in third.iter().chain(around_w.iter()) {
                if x == u || x == v || x == w {
                    continue;
                }
                let pair = if w < x { (w, x) } else { (x, w) };
                if !seen.insert(pair) {
                    continue;
                }
                self.quad(w, x)?;
            }
        }
        trace!(
            u = u.0,
            v = v.0,
            connect,
            third = third.len(),
            quads = seen.len(),
            "census.incremental.toggle"
        );
        Ok(())
    }
}

fn flip(
    graph: &GraphContext,
    overlay: &mut Overlay,
    tallies: &mut Tallies,
    toggle: Toggle,
) -> Result<usize> {
    let mut pass = Pass {
        graph,
        overlay: &*overlay,
        tallies,
        toggle,
        reshaped: 0,
    };
    pass.run()?;
    let reshaped = pass.reshaped;
    if toggle.connect {
        overlay.mark_added(toggle.u, toggle.v)?;
    } else {
        overlay.mark_removed(toggle.u, toggle.v)?;
    }
    Ok(reshaped)
}

/// Applies `batch` to `tallies` as if it were committed on top of `graph`.
///
/// Deletions run first, then insertions, each in staging order. Deleting an
/// arc that is not effectively present is an `UnknownEdge` error; inserting
/// a self-loop or an arc that is already present is reported and skipped,
/// matching what a commit would do.
pub(crate) fn apply_batch(
    graph: &GraphContext,
    batch: &StagedBatch,
    tallies: &mut Tallies,
) -> Result<BatchStats> {
    let mut overlay = Overlay::new();
    let mut stats = BatchStats::default();

    for link in &batch.deleted {
        let key = link.key();
        if !overlay.arc_present(graph, key) {
            return Err(graph.unknown_edge(key));
        }
        overlay.remove_arc(key);
        if overlay.arc_present(graph, link.reversed_key()) {
            stats.absorbed += 1;
            continue;
        }
        let toggle = Toggle {
            u: key.source,
            v: key.target,
            connect: false,
        };
        stats.reshaped += flip(graph, &mut overlay, tallies, toggle)?;
        stats.removed += 1;
    }

    for link in &batch.added {
        let key: EdgeKey = link.key();
        if key.is_self_loop() || overlay.arc_present(graph, key) {
            warn!(
                source = key.source.0,
                target = key.target.0,
                "census.incremental.insert_rejected"
            );
            stats.rejected += 1;
            continue;
        }
        overlay.add_arc(key);
        if overlay.arc_present(graph, link.reversed_key()) {
            stats.absorbed += 1;
            continue;
        }
        let toggle = Toggle {
            u: key.source,
            v: key.target,
            connect: true,
        };
        stats.reshaped += flip(graph, &mut overlay, tallies, toggle)?;
        stats.added += 1;
    }
    Ok(stats)
}
