//! Error types for the call tree.

use tracedit_trace::TraceError;

use crate::node::NodeId;

/// Errors that abort building a call tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The trace reader failed.
    #[error("trace read failed: {0}")]
    Read(#[from] TraceError),

    /// A call index did not increase over the previous call.
    #[error("call index {found} does not follow {previous}")]
    NonMonotonicCallIndex { previous: u64, found: u64 },

    /// A call was appended to a node other than the last frame.
    #[error("call {call_index} is not in the open frame")]
    CallOutsideOpenFrame { call_index: u64 },
}

/// Errors from queries against a built tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node id belongs to another tree or is out of range.
    #[error("invalid node reference {0}")]
    InvalidNodeReference(NodeId),
}

/// Convenience alias for tree query results.
pub type TreeResult<T> = Result<T, TreeError>;
