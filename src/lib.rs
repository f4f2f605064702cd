//! Incremental graphlet census for directed graphs under transactional edits.
//!
//! A [`GraphContext`] holds a committed link set and a [`StagedBatch`] of
//! proposed additions and deletions. A [`GraphletCensus`] counts, per node,
//! the connected induced subgraphs on two to four nodes of the undirected
//! view of the context, and can move those counts to the post-batch graph
//! without committing the batch, then revert them. The sibling scalar
//! metrics in [`metrics`] follow the same update/revert contract.
//!
//! ```no_run
//! use incgraph::{load_pairs, GraphletCensus, NodeRegistry};
//!
//! let (mut graph, _) = load_pairs(NodeRegistry::shared(), [("a", "b"), ("b", "c")])?;
//! let mut census = GraphletCensus::default();
//! census.recompute(&graph)?;
//! graph.add_labeled("c", "a", 3)?;
//! # Ok::<(), incgraph::GraphletError>(())
//! ```

#![warn(missing_docs)]

pub mod census;
pub mod config;
pub mod data_generator;
pub mod logging;
pub mod metrics;
pub mod network;
pub mod primitives;
pub mod types;

pub use census::{BatchStats, CensusOptions, CensusVector, Graphlet, GraphletCensus};
pub use config::{ConfigError, EngineConfig};
pub use logging::{init_logging, LoggingOptions};
pub use metrics::{MaxFanOutRatio, MetricRegistry, OutDegreeFraction, TopologyMetric};
pub use network::{
    load_pairs, load_path, load_reader, EdgeKey, GraphContext, Link, LoadOptions, LoadReport,
    RankPartition, StagedBatch,
};
pub use primitives::NodeRegistry;
pub use types::{ContextId, GraphletError, NodeId, Result};
