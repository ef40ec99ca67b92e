use std::path::PathBuf;

use tracedit_types::BlobId;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    /// Content hash mismatch on read (data corruption).
    #[error("content mismatch for blob {0}")]
    ContentMismatch(BlobId),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store root is missing or not a directory.
    #[error("invalid store root: {}", .0.display())]
    InvalidRoot(PathBuf),

    /// Storage backend is read-only.
    #[error("store is read-only")]
    ReadOnly,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
