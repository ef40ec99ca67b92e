//! Error types for trace access.

use std::path::PathBuf;

/// Errors that can occur while reading a trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("cannot read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The trace description is not valid JSON or does not match the schema.
    #[error("invalid trace description: {0}")]
    Format(#[from] serde_json::Error),

    /// The trace was written by an unsupported format version.
    #[error("unsupported trace format version {0}")]
    UnsupportedVersion(u32),

    /// The packet stream is damaged.
    #[error("corrupt trace at packet {position}: {reason}")]
    Corrupt { position: usize, reason: String },

    /// Seek target is past the last frame.
    #[error("frame {requested} out of range (last frame is {max})")]
    FrameOutOfRange { requested: u64, max: u64 },

    /// A blob referenced by the trace could not be read.
    #[error("blob store error: {0}")]
    Store(#[from] tracedit_store::StoreError),

    /// An embedded state snapshot could not be decoded.
    #[error("embedded snapshot error: {0}")]
    Snapshot(#[from] tracedit_state::StateError),
}

/// Convenience alias for trace results.
pub type TraceResult<T> = Result<T, TraceError>;
