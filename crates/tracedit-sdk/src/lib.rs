//! High-level editor API for tracedit.
//!
//! [`Editor`] is the entry point for front ends: it opens a trace, keeps the
//! current selection, resolves and edits snapshots, and saves and loads
//! sessions.

pub mod config;
pub mod editor;
pub mod error;

pub use config::{EditorConfig, SessionConfig};
pub use editor::{Editor, OpenTrace};
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use tracedit_engine::{
    Propagation, RecordingReplayer, ReplayError, ReplayRequest, Replayer, UnavailableReplayer,
};
pub use tracedit_session::{LoadReport, SaveSummary, SessionFile};
pub use tracedit_state::StateSnapshot;
pub use tracedit_trace::{MemoryTrace, TraceMetadata, TraceReader};
pub use tracedit_tree::{CallTree, NodeId, NodeKind, SearchOptions};
pub use tracedit_types::{SnapshotUuid, TraceUuid};
