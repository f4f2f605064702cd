//! Directed graph model: links, per-context adjacency, staged edits.
//!
//! A [`GraphContext`] is one logical graph over the nodes of a shared
//! [`NodeRegistry`](crate::primitives::NodeRegistry). Edits are staged in a
//! [`StagedBatch`] and become visible only on commit.

/// Per-node neighbor sets.
pub mod adjacency;
/// Graph contexts and their commit/revert cycle.
pub mod context;
/// Links, link properties and link orderings.
pub mod link;
/// Ranked edge-list parsing.
pub mod loader;
/// Nested rank windows.
pub mod partition;
/// Staged edit batches.
pub mod staging;

pub use adjacency::{Adjacency, AdjacencyTable};
pub use context::{CommitSummary, GraphContext};
pub use link::{EdgeKey, Link, LinkProperties, PartitionSlot};
pub use loader::{load_pairs, load_path, load_reader, LoadOptions, LoadReport};
pub use partition::RankPartition;
pub use staging::StagedBatch;
