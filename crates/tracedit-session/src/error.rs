use std::fmt;
use std::path::PathBuf;

use tracedit_types::TraceUuid;

/// Errors that abort a whole save or load.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session document cannot be read or is not a session document.
    #[error("cannot read session {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// The document was written by an unsupported format version.
    #[error("unsupported session format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u64, supported: u64 },

    /// The session belongs to a different trace file than the open one.
    #[error("session was saved against {expected}, but {open} is open")]
    BaseTraceMismatch { expected: PathBuf, open: PathBuf },

    /// The base trace file changed since the session was saved.
    #[error("trace uuid mismatch: session expects {expected}, open trace is {found}")]
    TraceUuidMismatch { expected: TraceUuid, found: TraceUuid },

    /// The session document could not be written.
    #[error("cannot write session {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be encoded.
    #[error("cannot encode snapshot for {target}: {source}")]
    Encode {
        target: RecordTarget,
        #[source]
        source: tracedit_state::StateError,
    },

    #[error("blob store error: {0}")]
    Store(#[from] tracedit_store::StoreError),

    #[error("invalid payload name: {0}")]
    PayloadName(#[from] tracedit_types::TypeError),

    #[error("session document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Tree(#[from] tracedit_tree::TreeError),
}

/// Convenience alias for session results.
pub type SessionResult<T> = Result<T, SessionError>;

/// The tree position a snapshot record refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordTarget {
    Call(u64),
    Frame(u64),
}

impl fmt::Display for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(index) => write!(f, "call {index}"),
            Self::Frame(number) => write!(f, "frame {number}"),
        }
    }
}

/// Problems with a single snapshot record. The record is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("malformed snapshot record: {0}")]
    MalformedRecord(String),

    #[error("payload uuid {payload} does not match record uuid {record}")]
    UuidMismatch { record: String, payload: String },

    #[error("{0} is not in the open trace")]
    NodeNotFound(RecordTarget),

    #[error("cannot read payload {rel_path}: {reason}")]
    PayloadUnreadable { rel_path: String, reason: String },

    #[error("{0} has no stored snapshot and none from the trace")]
    MissingFrameSnapshot(RecordTarget),
}

/// A record left out of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the document's snapshot list.
    pub position: usize,
    pub error: RecordError,
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records applied to the tree.
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl LoadReport {
    /// Returns `true` if every record was loaded.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
