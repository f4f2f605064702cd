//! Low-level primitives shared by the graph model and the metrics.
//!
//! Currently holds the node registry, the only structure that independent
//! optimization runs share.

/// Label interning and context-handle allocation.
///
/// Maps unique labels to dense node ids and leases the handles that key
/// graph contexts.
pub mod registry;

pub use registry::{ContextLease, NodeRegistry, RegistrySnapshot};
