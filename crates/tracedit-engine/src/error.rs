use tracedit_tree::{NodeId, TreeError};

/// Errors reported by a [`Replayer`](crate::Replayer).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// No replay engine is available in this environment.
    #[error("replay is not available")]
    Unavailable,

    /// Replay ran but could not reach the target call.
    #[error("replay failed at call {call_index}: {reason}")]
    Failed { call_index: u64, reason: String },
}

/// Errors produced while resolving a node's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Only call nodes can be replayed to; frames and the root need a
    /// snapshot from the trace or a session.
    #[error("node {0} has no current snapshot and is not a call")]
    NotReplayable(NodeId),

    /// The replayer failed. The node's container was left invalid.
    #[error("replay to call {call_index} failed: {source}")]
    Replay {
        call_index: u64,
        #[source]
        source: ReplayError,
    },

    /// The container lost its snapshot between computation and lookup.
    #[error("node {0} holds no snapshot")]
    NoSnapshot(NodeId),
}

/// Errors produced while editing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// There is no snapshot at the node to edit.
    #[error("node {0} holds no snapshot to edit")]
    NoSnapshot(NodeId),
}
