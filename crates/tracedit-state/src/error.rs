use tracedit_types::SnapshotUuid;

/// Errors from snapshot encoding, decoding and validation.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// JSON document encoding or decoding failed.
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),

    /// Binary encoding or decoding failed.
    #[error("binary snapshot error: {0}")]
    Binary(String),

    /// A payload could not be read from or written to the blob store.
    #[error("blob store error: {0}")]
    Store(#[from] tracedit_store::StoreError),

    /// The document has no usable `uuid` field.
    #[error("snapshot document has no valid uuid")]
    MissingUuid,

    /// The snapshot was captured with a different pointer size than the trace.
    #[error("pointer size mismatch: trace uses {expected} bytes, snapshot uses {found}")]
    PointerSizeMismatch { expected: u8, found: u8 },

    /// The snapshot is not well-formed.
    #[error("malformed snapshot {uuid:?}: {reason}")]
    Malformed { uuid: SnapshotUuid, reason: String },
}

/// Result alias for snapshot operations.
pub type StateResult<T> = Result<T, StateError>;
