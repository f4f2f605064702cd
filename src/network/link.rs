use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::primitives::NodeRegistry;
use crate::types::{GraphletError, NodeId, Result};

/// Directed `(source, target)` pair used to index links.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EdgeKey {
    /// Regulator end of the edge.
    pub source: NodeId,
    /// Regulated end of the edge.
    pub target: NodeId,
}

impl EdgeKey {
    /// Creates a key.
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }

    /// The mirror arc `target -> source`.
    pub fn reversed(self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }

    /// Whether both ends are the same node.
    pub fn is_self_loop(self) -> bool {
        self.source == self.target
    }
}

/// Partition bookkeeping carried for the optimizer that owns the links.
///
/// The graph model never interprets these values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PartitionSlot {
    /// Partition the link currently sits in.
    pub current: Option<usize>,
    /// Lower rank bound of the current partition.
    pub lower: Option<usize>,
    /// Upper rank bound of the current partition.
    pub upper: Option<usize>,
    previous: Option<(Option<usize>, Option<usize>, Option<usize>)>,
}

impl PartitionSlot {
    /// Partition the link sat in before the pending move, if any.
    pub fn previous(&self) -> Option<usize> {
        self.previous.and_then(|(current, _, _)| current)
    }
}

/// Mutable per-link state. Does not take part in link equality.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkProperties {
    /// Whether the link is known to be a true interaction.
    pub true_link: bool,
    rank: usize,
    original_rank: usize,
    previous_rank: Option<usize>,
    partition: PartitionSlot,
}

impl LinkProperties {
    /// Properties for a link first seen at `rank`.
    pub fn new(true_link: bool, rank: usize) -> Self {
        Self {
            true_link,
            rank,
            original_rank: rank,
            previous_rank: None,
            partition: PartitionSlot::default(),
        }
    }

    /// Current rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Rank the link was loaded with.
    pub fn original_rank(&self) -> usize {
        self.original_rank
    }

    /// Rank before the pending move; only set mid-transaction.
    pub fn previous_rank(&self) -> Option<usize> {
        self.previous_rank
    }

    /// Partition bookkeeping.
    pub fn partition(&self) -> &PartitionSlot {
        &self.partition
    }

    /// Whether a staged rank or partition move awaits commit or revert.
    pub fn is_pending(&self) -> bool {
        self.previous_rank.is_some() || self.partition.previous.is_some()
    }

    /// Overwrites the rank without recording a previous value.
    pub fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }

    /// Moves the link to `rank`, remembering the first pre-transaction rank.
    pub fn stage_rank(&mut self, rank: usize) {
        if self.previous_rank.is_none() {
            self.previous_rank = Some(self.rank);
        }
        self.rank = rank;
    }

    /// Assigns a partition without recording a previous value.
    pub fn set_partition(&mut self, current: usize, lower: usize, upper: usize) {
        self.partition.current = Some(current);
        self.partition.lower = Some(lower);
        self.partition.upper = Some(upper);
    }

    /// Moves the link to another partition, remembering where it came from.
    pub fn stage_partition(&mut self, current: usize, lower: usize, upper: usize) {
        if self.partition.previous.is_none() {
            let PartitionSlot {
                current: prev,
                lower: prev_lower,
                upper: prev_upper,
                ..
            } = self.partition;
            self.partition.previous = Some((prev, prev_lower, prev_upper));
        }
        self.set_partition(current, lower, upper);
    }

    /// Makes the pending move permanent.
    pub fn commit(&mut self) {
        self.previous_rank = None;
        self.partition.previous = None;
    }

    /// Restores the pre-transaction rank and partition, whichever moved.
    ///
    /// Reverting twice in a row, or without a staged move, is an error.
    pub fn revert(&mut self) -> Result<()> {
        if !self.is_pending() {
            return Err(GraphletError::NothingToRevert("link move"));
        }
        if let Some(previous) = self.previous_rank.take() {
            self.rank = previous;
        }
        if let Some((current, lower, upper)) = self.partition.previous.take() {
            self.partition.current = current;
            self.partition.lower = lower;
            self.partition.upper = upper;
        }
        Ok(())
    }
}

/// A directed edge plus its properties.
///
/// Two links are equal when their endpoints match; properties are ignored.
#[derive(Clone, Debug)]
pub struct Link {
    /// Regulator end.
    pub source: NodeId,
    /// Regulated end.
    pub target: NodeId,
    /// Rank, classification and partition state.
    pub props: LinkProperties,
}

impl Link {
    /// Creates a link with explicit properties.
    pub fn new(source: NodeId, target: NodeId, props: LinkProperties) -> Self {
        Self {
            source,
            target,
            props,
        }
    }

    /// Creates an unclassified link at `rank`.
    pub fn ranked(source: NodeId, target: NodeId, rank: usize) -> Self {
        Self::new(source, target, LinkProperties::new(false, rank))
    }

    /// Index key of this link.
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source, self.target)
    }

    /// Key of the mirror arc.
    pub fn reversed_key(&self) -> EdgeKey {
        self.key().reversed()
    }

    /// Whether `other` runs between the same nodes in the opposite direction.
    pub fn is_opposite(&self, other: &Link) -> bool {
        self.source == other.target && self.target == other.source
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Orders links by current rank, ties broken by original rank.
pub fn by_rank(a: &Link, b: &Link) -> Ordering {
    a.props
        .rank()
        .cmp(&b.props.rank())
        .then_with(|| a.props.original_rank().cmp(&b.props.original_rank()))
}

/// Orders links by source label, then target label, as resolved by `registry`.
pub fn by_label(registry: &NodeRegistry) -> impl Fn(&Link, &Link) -> Ordering + '_ {
    move |a, b| {
        let label = |node: NodeId| registry.label(node);
        label(a.source)
            .cmp(&label(b.source))
            .then_with(|| label(a.target).cmp(&label(b.target)))
    }
}
