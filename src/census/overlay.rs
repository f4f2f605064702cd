use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::network::{EdgeKey, GraphContext};
use crate::types::{GraphletError, NodeId, Result};

/// Neighbor list collected through the overlay.
pub type Neighbors = SmallVec<[NodeId; 16]>;

/// How a node pair differs from the committed graph within one transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeState {
    /// Same as committed.
    Unchanged,
    /// Committed adjacency treated as absent.
    Removed,
    /// Adjacency treated as present although not committed.
    Added,
}

/// Transaction-scoped view of "the graph after this batch".
///
/// Undirected pairs live in `tabu` (removed) or `added`. Directed arcs are
/// tracked separately so a deletion or insertion can tell whether its mirror
/// arc keeps the undirected pair alive.
#[derive(Debug, Default)]
pub struct Overlay {
    tabu: FxHashMap<NodeId, FxHashSet<NodeId>>,
    added: FxHashMap<NodeId, FxHashSet<NodeId>>,
    removed_arcs: FxHashSet<EdgeKey>,
    added_arcs: FxHashSet<EdgeKey>,
}

fn has(map: &FxHashMap<NodeId, FxHashSet<NodeId>>, u: NodeId, v: NodeId) -> bool {
    map.get(&u).is_some_and(|set| set.contains(&v))
}

fn insert_pair(map: &mut FxHashMap<NodeId, FxHashSet<NodeId>>, u: NodeId, v: NodeId) -> bool {
    let fresh = map.entry(u).or_default().insert(v);
    map.entry(v).or_default().insert(u);
    fresh
}

fn remove_pair(map: &mut FxHashMap<NodeId, FxHashSet<NodeId>>, u: NodeId, v: NodeId) -> bool {
    let Some(set) = map.get_mut(&u) else {
        return false;
    };
    if !set.remove(&v) {
        return false;
    }
    if let Some(set) = map.get_mut(&v) {
        set.remove(&u);
    }
    true
}

impl Overlay {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay state of the undirected pair `{u, v}`.
    pub fn state(&self, u: NodeId, v: NodeId) -> EdgeState {
        if has(&self.added, u, v) {
            EdgeState::Added
        } else if has(&self.tabu, u, v) {
            EdgeState::Removed
        } else {
            EdgeState::Unchanged
        }
    }

    /// Whether `u` and `v` are adjacent once the overlay is applied.
    pub fn adjacent(&self, graph: &GraphContext, u: NodeId, v: NodeId) -> bool {
        (graph.is_adjacent(u, v) && !has(&self.tabu, u, v)) || has(&self.added, u, v)
    }

    /// Effective undirected neighbors of `u`.
    pub fn neighbors(&self, graph: &GraphContext, u: NodeId) -> Neighbors {
        let tabu = self.tabu.get(&u);
        let mut out: Neighbors = graph
            .undirected(u)
            .filter(|v| !tabu.is_some_and(|set| set.contains(v)))
            .collect();
        if let Some(added) = self.added.get(&u) {
            // a pair removed then re-added is filtered above and listed here
            out.extend(added.iter().copied());
        }
        out
    }

    /// Whether the directed arc is present once the overlay is applied.
    pub fn arc_present(&self, graph: &GraphContext, key: EdgeKey) -> bool {
        (graph.contains_edge(key.source, key.target) && !self.removed_arcs.contains(&key))
            || self.added_arcs.contains(&key)
    }

    /// Records that the directed arc is deleted.
    pub fn remove_arc(&mut self, key: EdgeKey) {
        if !self.added_arcs.remove(&key) {
            self.removed_arcs.insert(key);
        }
    }

    /// Records that the directed arc is inserted.
    pub fn add_arc(&mut self, key: EdgeKey) {
        if !self.removed_arcs.remove(&key) {
            self.added_arcs.insert(key);
        }
    }

    /// Marks `{u, v}` as no longer adjacent.
    pub fn mark_removed(&mut self, u: NodeId, v: NodeId) -> Result<()> {
        if remove_pair(&mut self.added, u, v) {
            return Ok(());
        }
        if !insert_pair(&mut self.tabu, u, v) {
            return Err(GraphletError::Invariant("edge already marked removed"));
        }
        Ok(())
    }

    /// Marks `{u, v}` as adjacent.
    pub fn mark_added(&mut self, u: NodeId, v: NodeId) -> Result<()> {
        if !insert_pair(&mut self.added, u, v) {
            return Err(GraphletError::Invariant("edge already marked added"));
        }
        Ok(())
    }
}
