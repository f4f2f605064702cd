use rustc_hash::FxHashSet;

use crate::types::NodeId;

/// Neighbor sets of one node within one context.
///
/// `bidirectional` and `undirected` are derived from the two directed sets and
/// kept in sync on every arc change.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
    incoming: FxHashSet<NodeId>,
    outgoing: FxHashSet<NodeId>,
    bidirectional: FxHashSet<NodeId>,
    undirected: FxHashSet<NodeId>,
}

impl Adjacency {
    /// Sources of arcs ending here.
    pub fn incoming(&self) -> &FxHashSet<NodeId> {
        &self.incoming
    }

    /// Targets of arcs starting here.
    pub fn outgoing(&self) -> &FxHashSet<NodeId> {
        &self.outgoing
    }

    /// Neighbors connected in both directions.
    pub fn bidirectional(&self) -> &FxHashSet<NodeId> {
        &self.bidirectional
    }

    /// Neighbors connected in either direction.
    pub fn undirected(&self) -> &FxHashSet<NodeId> {
        &self.undirected
    }

    /// Whether the node has no neighbor left.
    pub fn is_isolated(&self) -> bool {
        self.undirected.is_empty()
    }

    fn refresh(&mut self, other: NodeId) {
        let inbound = self.incoming.contains(&other);
        let outbound = self.outgoing.contains(&other);
        if inbound && outbound {
            self.bidirectional.insert(other);
        } else {
            self.bidirectional.remove(&other);
        }
        if inbound || outbound {
            self.undirected.insert(other);
        } else {
            self.undirected.remove(&other);
        }
    }
}

/// Per-context adjacency, indexed densely by [`NodeId`].
#[derive(Clone, Debug, Default)]
pub struct AdjacencyTable {
    slots: Vec<Option<Adjacency>>,
}

impl AdjacencyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjacency of `node`, if it has ever been touched in this context.
    pub fn get(&self, node: NodeId) -> Option<&Adjacency> {
        self.slots.get(node.index()).and_then(Option::as_ref)
    }

    fn entry(&mut self, node: NodeId) -> &mut Adjacency {
        let index = node.index();
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index].get_or_insert_with(Adjacency::default)
    }

    /// Records `source -> target`.
    pub fn insert_arc(&mut self, source: NodeId, target: NodeId) {
        let out = self.entry(source);
        out.outgoing.insert(target);
        out.refresh(target);
        let inc = self.entry(target);
        inc.incoming.insert(source);
        inc.refresh(source);
    }

    /// Forgets `source -> target`, dropping slots of nodes left isolated.
    ///
    /// Returns the endpoints that became isolated.
    pub fn remove_arc(&mut self, source: NodeId, target: NodeId) -> [Option<NodeId>; 2] {
        let mut isolated = [None, None];
        if let Some(Some(adj)) = self.slots.get_mut(source.index()) {
            adj.outgoing.remove(&target);
            adj.refresh(target);
            if adj.is_isolated() {
                isolated[0] = Some(source);
            }
        }
        if let Some(Some(adj)) = self.slots.get_mut(target.index()) {
            adj.incoming.remove(&source);
            adj.refresh(source);
            if adj.is_isolated() {
                isolated[1] = Some(target);
            }
        }
        for node in isolated.iter().flatten() {
            self.slots[node.index()] = None;
        }
        isolated
    }

    /// Whether `a` and `b` are connected in either direction.
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.get(a).is_some_and(|adj| adj.undirected.contains(&b))
    }
}
