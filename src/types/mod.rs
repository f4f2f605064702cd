//! Identifier newtypes and the crate-wide error type.

use std::fmt;

/// Dense index of an interned node label.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u32);

/// Handle identifying one graph context (one logical view of the node set).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ContextId(pub u32);

impl NodeId {
    /// Position of this node in per-context arrays.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Errors raised by the graph model and the census engine.
///
/// Variants fall in three groups. Structural input errors (`SelfLoop`,
/// `DuplicateEdge`, `Malformed`) describe a bad record that callers usually
/// report and drop. Precondition and consistency errors (`NotInitialized`,
/// `NothingToRevert`, `ContextMismatch`, `UnknownEdge`, `UnknownMetric`,
/// `Invariant`) mean the caller broke the API contract or the overlay
/// bookkeeping is broken; they must not be retried.
#[derive(thiserror::Error, Debug)]
pub enum GraphletError {
    /// An edge whose endpoints carry the same label.
    #[error("self-loop on {label}")]
    SelfLoop {
        /// Label of the offending node.
        label: String,
    },
    /// An edge that is already present.
    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge {
        /// Source label.
        from: String,
        /// Target label.
        to: String,
    },
    /// A source record that could not be parsed.
    #[error("malformed record at line {line}: {reason}")]
    Malformed {
        /// 1-based line (record) number.
        line: u64,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// A query or update issued before the first full recomputation.
    #[error("not initialized: {0}")]
    NotInitialized(&'static str),
    /// A revert without a pending transaction.
    #[error("nothing to revert: {0}")]
    NothingToRevert(&'static str),
    /// An engine bound to one context was handed another one.
    #[error("context mismatch: bound to {expected}, got {found}")]
    ContextMismatch {
        /// Context the engine was computed over.
        expected: ContextId,
        /// Context passed by the caller.
        found: ContextId,
    },
    /// An edge that was expected to exist in the committed graph.
    #[error("unknown edge {from} -> {to}")]
    UnknownEdge {
        /// Source label.
        from: String,
        /// Target label.
        to: String,
    },
    /// A metric name missing from the registry.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    /// Internal bookkeeping went inconsistent.
    #[error("invariant violated: {0}")]
    Invariant(&'static str),
    /// Invalid configuration or option combination.
    #[error("config: {0}")]
    Config(String),
    /// I/O failure while reading a source graph.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Delimited-text decoding failure.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

impl GraphletError {
    /// Whether this error signals a broken API contract rather than bad input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            GraphletError::NotInitialized(_)
                | GraphletError::NothingToRevert(_)
                | GraphletError::ContextMismatch { .. }
                | GraphletError::UnknownEdge { .. }
                | GraphletError::UnknownMetric(_)
                | GraphletError::Invariant(_)
        )
    }

    /// Whether this error describes a single bad input record.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphletError::SelfLoop { .. }
                | GraphletError::DuplicateEdge { .. }
                | GraphletError::Malformed { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphletError>;
