use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use super::adjacency::{Adjacency, AdjacencyTable};
use super::link::{self, EdgeKey, Link};
use super::staging::StagedBatch;
use crate::primitives::{ContextLease, NodeRegistry};
use crate::types::{ContextId, GraphletError, NodeId, Result};

/// Outcome of [`GraphContext::commit`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CommitSummary {
    /// Staged insertions that were applied.
    pub added: usize,
    /// Staged removals that were applied.
    pub removed: usize,
    /// Staged insertions dropped as self-loops or duplicates.
    pub rejected: usize,
    /// Add/delete pairs that cancelled out.
    pub toggled: usize,
}

/// One directed graph over the shared node set, plus its staged edits.
///
/// The committed graph keeps links in rank order with a hash index for
/// membership. The node set holds exactly the nodes with at least one
/// incident link. Dropping the context returns its handle to the registry.
pub struct GraphContext {
    registry: Arc<NodeRegistry>,
    lease: ContextLease,
    links: Vec<Link>,
    index: FxHashSet<EdgeKey>,
    nodes: Vec<NodeId>,
    adjacency: AdjacencyTable,
    staged: StagedBatch,
    moved: Vec<EdgeKey>,
}

impl GraphContext {
    /// Creates an empty context bound to `registry`.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        let lease = registry.acquire_context();
        Self {
            registry,
            lease,
            links: Vec::new(),
            index: FxHashSet::default(),
            nodes: Vec::new(),
            adjacency: AdjacencyTable::new(),
            staged: StagedBatch::new(),
            moved: Vec::new(),
        }
    }

    /// Handle of this context.
    pub fn id(&self) -> ContextId {
        self.lease.id
    }

    /// Registry the node ids belong to.
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Checks whether `key` could be inserted into the committed graph.
    pub fn check_insertable(&self, key: EdgeKey) -> Result<()> {
        if key.is_self_loop() {
            return Err(GraphletError::SelfLoop {
                label: self.registry.describe(key.source),
            });
        }
        if self.index.contains(&key) {
            return Err(self.duplicate_error(key));
        }
        Ok(())
    }

    pub(crate) fn duplicate_error(&self, key: EdgeKey) -> GraphletError {
        GraphletError::DuplicateEdge {
            from: self.registry.describe(key.source),
            to: self.registry.describe(key.target),
        }
    }

    pub(crate) fn unknown_edge(&self, key: EdgeKey) -> GraphletError {
        GraphletError::UnknownEdge {
            from: self.registry.describe(key.source),
            to: self.registry.describe(key.target),
        }
    }

    /// Appends `link` to the committed graph.
    ///
    /// Self-loops and duplicates are reported and dropped; the return value
    /// says whether the link was inserted.
    pub fn add_edge(&mut self, link: Link) -> Result<bool> {
        let key = link.key();
        match self.check_insertable(key) {
            Ok(()) => {}
            Err(err) if err.is_structural() => {
                warn!(context = self.lease.id.0, error = %err, "context.add_edge.rejected");
                return Ok(false);
            }
            Err(err) => return Err(err),
        }
        for node in [key.source, key.target] {
            if self.adjacency.get(node).is_none() {
                self.nodes.push(node);
            }
        }
        self.adjacency.insert_arc(key.source, key.target);
        self.index.insert(key);
        self.links.push(link);
        Ok(true)
    }

    /// Interns both labels and appends an unclassified link at `rank`.
    pub fn add_labeled(&mut self, source: &str, target: &str, rank: usize) -> Result<bool> {
        let source = self.registry.intern(source);
        let target = self.registry.intern(target);
        self.add_edge(Link::ranked(source, target, rank))
    }

    /// Removes a committed link. Endpoints left without neighbors leave the node set.
    pub fn remove_edge(&mut self, key: EdgeKey) -> Result<Link> {
        if !self.index.remove(&key) {
            return Err(self.unknown_edge(key));
        }
        let pos = self
            .links
            .iter()
            .position(|link| link.key() == key)
            .ok_or(GraphletError::Invariant("link index out of sync"))?;
        let link = self.links.remove(pos);
        let isolated = self.adjacency.remove_arc(key.source, key.target);
        for node in isolated.into_iter().flatten() {
            self.nodes.retain(|n| *n != node);
        }
        Ok(link)
    }

    /// Stages an insertion for the next commit.
    pub fn stage_add(&mut self, link: Link) {
        self.staged.stage_add(link);
    }

    /// Stages the removal of a committed link.
    ///
    /// A link already staged for removal, and not re-added since, is
    /// rejected with `UnknownEdge`: the commit could only remove it once.
    pub fn stage_delete(&mut self, key: EdgeKey) -> Result<()> {
        let link = self.link(key).cloned().ok_or_else(|| self.unknown_edge(key))?;
        let staged = |links: &[Link]| links.iter().filter(|l| l.key() == key).count();
        if staged(self.staged.deleted.as_slice()) > staged(self.staged.added.as_slice()) {
            return Err(self.unknown_edge(key));
        }
        self.staged.stage_delete(link);
        Ok(())
    }

    /// Moves a committed link to `rank` until the next commit or revert.
    pub fn stage_rank(&mut self, key: EdgeKey, rank: usize) -> Result<()> {
        self.pending_link(key)?.props.stage_rank(rank);
        Ok(())
    }

    /// Moves a committed link to another partition until the next commit or
    /// revert.
    pub fn stage_partition(
        &mut self,
        key: EdgeKey,
        current: usize,
        lower: usize,
        upper: usize,
    ) -> Result<()> {
        self.pending_link(key)?
            .props
            .stage_partition(current, lower, upper);
        Ok(())
    }

    fn pending_link(&mut self, key: EdgeKey) -> Result<&mut Link> {
        let Some(pos) = self.links.iter().position(|l| l.key() == key) else {
            return Err(self.unknown_edge(key));
        };
        if !self.moved.contains(&key) {
            self.moved.push(key);
        }
        Ok(&mut self.links[pos])
    }

    /// Applies staged insertions, then staged removals, and clears staging.
    ///
    /// A link staged both ways is dropped from the batch first and stays as
    /// committed.
    pub fn commit(&mut self) -> Result<CommitSummary> {
        let mut batch = std::mem::take(&mut self.staged);
        let mut summary = CommitSummary {
            toggled: batch.cancel_toggled().len(),
            ..CommitSummary::default()
        };
        for mut link in batch.added {
            link.props.commit();
            if self.add_edge(link)? {
                summary.added += 1;
            } else {
                summary.rejected += 1;
            }
        }
        for link in batch.deleted {
            self.remove_edge(link.key())?;
            summary.removed += 1;
        }
        for key in std::mem::take(&mut self.moved) {
            if let Some(link) = self.link_mut(key) {
                link.props.commit();
            }
        }
        debug!(
            context = self.lease.id.0,
            added = summary.added,
            removed = summary.removed,
            rejected = summary.rejected,
            toggled = summary.toggled,
            links = self.links.len(),
            "context.commit.done"
        );
        Ok(summary)
    }

    /// Discards staged edits and restores staged ranks and partitions.
    /// Returns the number of discarded edits.
    pub fn revert(&mut self) -> Result<usize> {
        let discarded = self.staged.len();
        self.staged.clear();
        let moved = std::mem::take(&mut self.moved);
        for &key in &moved {
            if let Some(link) = self.link_mut(key) {
                link.props.revert()?;
            }
        }
        debug!(
            context = self.lease.id.0,
            discarded,
            restored = moved.len(),
            "context.revert"
        );
        Ok(discarded)
    }

    /// Lends the committed graph and the staged batch at the same time.
    ///
    /// Edits `f` makes to the batch are kept; the graph itself cannot change.
    pub fn with_staged<R>(&mut self, f: impl FnOnce(&GraphContext, &mut StagedBatch) -> R) -> R {
        let mut batch = std::mem::take(&mut self.staged);
        let out = f(self, &mut batch);
        self.staged = batch;
        out
    }

    /// Edits staged for the next commit.
    pub fn staged(&self) -> &StagedBatch {
        &self.staged
    }

    /// Mutable access to the staged edits.
    pub fn staged_mut(&mut self) -> &mut StagedBatch {
        &mut self.staged
    }

    /// Adjacency of `node` in the committed graph.
    pub fn neighbors(&self, node: NodeId) -> Option<&Adjacency> {
        self.adjacency.get(node)
    }

    /// Committed undirected neighbors of `node`.
    pub fn undirected(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|adj| adj.undirected().iter().copied())
    }

    /// Whether `a` and `b` are connected in either direction.
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency.is_adjacent(a, b)
    }

    /// Whether the committed graph holds `source -> target`.
    pub fn contains_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.index.contains(&EdgeKey::new(source, target))
    }

    /// Whether both `a -> b` and `b -> a` are committed.
    pub fn is_bidirectional(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|adj| adj.bidirectional().contains(&b))
    }

    /// Committed link with the given endpoints.
    pub fn link(&self, key: EdgeKey) -> Option<&Link> {
        if !self.index.contains(&key) {
            return None;
        }
        self.links.iter().find(|l| l.key() == key)
    }

    /// Mutable committed link with the given endpoints.
    pub fn link_mut(&mut self, key: EdgeKey) -> Option<&mut Link> {
        if !self.index.contains(&key) {
            return None;
        }
        self.links.iter_mut().find(|l| l.key() == key)
    }

    /// Nodes with at least one incident link, in order of first appearance.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Whether `node` has an incident link.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.adjacency.get(node).is_some()
    }

    /// Committed links in their current order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub(crate) fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of committed links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether no link is committed.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Committed out-degree of `node`.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map_or(0, |adj| adj.outgoing().len())
    }

    /// Committed in-degree of `node`.
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map_or(0, |adj| adj.incoming().len())
    }

    /// Copies the committed links into a new context with its own handle.
    pub fn duplicate(&self) -> GraphContext {
        let mut copy = GraphContext::new(self.registry.clone());
        copy.links.reserve(self.links.len());
        for link in &self.links {
            let key = link.key();
            for node in [key.source, key.target] {
                if copy.adjacency.get(node).is_none() {
                    copy.nodes.push(node);
                }
            }
            copy.adjacency.insert_arc(key.source, key.target);
            copy.index.insert(key);
            copy.links.push(link.clone());
        }
        copy
    }

    /// Copy of the committed graph with `batch` applied the way a commit would.
    pub fn materialize(&self, batch: &StagedBatch) -> Result<GraphContext> {
        let mut copy = self.duplicate();
        copy.staged = batch.clone();
        copy.commit()?;
        Ok(copy)
    }

    /// Stable-sorts links by current rank.
    pub fn sort_by_rank(&mut self) {
        self.links.sort_by(link::by_rank);
    }

    /// Stable-sorts links by source then target label.
    pub fn sort_by_label(&mut self) {
        let registry = self.registry.clone();
        self.links.sort_by(link::by_label(&registry));
    }

    /// Tie-breaks by original rank inside windows of `interval` positions.
    ///
    /// Windows start at `start` and stop at `end` (exclusive, clamped to the
    /// link count). Afterwards every link's rank is set to its position.
    pub fn rerank_within_intervals(
        &mut self,
        interval: usize,
        start: usize,
        end: usize,
    ) -> Result<()> {
        if interval == 0 {
            return Err(GraphletError::Config("rerank interval must be positive".into()));
        }
        let end = end.min(self.links.len());
        let mut lo = start;
        while lo < end {
            let hi = (lo + interval).min(end);
            self.links[lo..hi].sort_by_key(|l| l.props.original_rank());
            lo = hi;
        }
        for (pos, link) in self.links.iter_mut().enumerate() {
            link.props.set_rank(pos);
        }
        Ok(())
    }
}

impl Drop for GraphContext {
    fn drop(&mut self) {
        self.registry.release_context(self.lease);
    }
}

impl std::fmt::Debug for GraphContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphContext")
            .field("id", &self.lease.id)
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("staged", &self.staged.len())
            .finish()
    }
}
