//! Trace access for tracedit.
//!
//! The editor never parses the raw binary trace container itself. It reads
//! packets through the [`TraceReader`] trait, which yields API call packets
//! and state-snapshot packets in execution order and can seek to the start
//! of any frame.
//!
//! This crate also carries the static entrypoint classification table used
//! by navigation (draw calls, swap-buffers, make-current) and the extraction
//! of the keyframe snapshot stored at the start of a trimmed trace.

pub mod classify;
pub mod error;
pub mod keyframe;
pub mod memory;
pub mod packet;
pub mod reader;

pub use classify::{classify, EntrypointClass};
pub use error::{TraceError, TraceResult};
pub use keyframe::read_keyframe_snapshot;
pub use memory::{MemoryTrace, MemoryTraceBuilder};
pub use packet::{CallPacket, SofPacket, TraceMetadata, TracePacket, TRACE_FORMAT_VERSION};
pub use reader::TraceReader;
