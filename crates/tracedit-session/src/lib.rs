//! Session files for tracedit.
//!
//! A session records the snapshots computed and edited on top of a base
//! trace, so a debugging session can be resumed later. It consists of a JSON
//! session document and a session-data folder next to it:
//!
//! ```text
//! game.session.json
//! game.session-sessiondata/
//!     snapshot_call_30_5e0b21c48f7d9a13.json   snapshot payload documents
//!     snapshot_frame_0_07c2d9e1a4b8f356.json
//!     3f1c...e9                  content-addressed bulk payloads
//! ```
//!
//! The session document names the base trace (path relative to the session
//! file, plus its UUID) and lists one record per snapshot container with its
//! flags and, when the state itself was stored, the payload document name.
//! Payload names carry a hash of their contents, so saving again only adds
//! files and never rewrites one an older document refers to.
//!
//! # Loading
//!
//! Loading validates the whole document and decodes every record before any
//! container in the tree is touched. Version, trace path and trace UUID
//! mismatches abort the load. Problems with individual records are reported
//! in the [`LoadReport`] and the record is skipped.

pub mod document;
pub mod error;
pub mod layout;
pub mod load;
pub mod paths;
pub mod save;

pub use document::{
    BaseTraceFile, SessionData, SessionDocument, SessionFile, SessionMetadata, SnapshotRecord,
    SESSION_FORMAT_VERSION,
};
pub use error::{LoadReport, RecordError, RecordTarget, SessionError, SessionResult, SkippedRecord};
pub use layout::{data_dir, data_folder_name, payload_name, SessionContext, DEFAULT_DATA_FOLDER_SUFFIX};
pub use load::load;
pub use save::{save, SaveSummary};
