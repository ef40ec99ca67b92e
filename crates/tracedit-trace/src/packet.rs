use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracedit_types::{BlobId, TraceUuid};

/// Trace format version understood by this reader.
pub const TRACE_FORMAT_VERSION: u32 = 1;

/// Start-of-file packet of a trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SofPacket {
    pub version: u32,
    pub uuid: TraceUuid,
    /// Pointer size (bytes) of the traced process.
    pub pointer_size: u8,
}

impl Default for SofPacket {
    fn default() -> Self {
        Self {
            version: TRACE_FORMAT_VERSION,
            uuid: TraceUuid::default(),
            pointer_size: 8,
        }
    }
}

/// One recorded API call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPacket {
    /// Global, strictly increasing position in the trace.
    pub call_index: u64,
    pub entrypoint: String,
    /// Parameters, already rendered as text.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub begin_ns: u64,
    #[serde(default)]
    pub end_ns: u64,
    /// Handle of the context current when the call was made.
    #[serde(default)]
    pub context: u64,
    #[serde(default)]
    pub backtrace_index: Option<u32>,
}

impl CallPacket {
    pub fn new(call_index: u64, entrypoint: impl Into<String>) -> Self {
        Self {
            call_index,
            entrypoint: entrypoint.into(),
            params: Vec::new(),
            begin_ns: 0,
            end_ns: 0,
            context: 0,
            backtrace_index: None,
        }
    }

    /// The call as it is shown in the call list, e.g. `glDrawArrays(GL_TRIANGLES, 0, 3)`.
    pub fn render(&self) -> String {
        format!("{}({})", self.entrypoint, self.params.join(", "))
    }

    pub fn duration_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.begin_ns)
    }
}

/// A packet read from a trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracePacket {
    Call(CallPacket),
    /// A binary state snapshot stored in the trace's blob store.
    StateSnapshot { binary_id: BlobId },
}

impl TracePacket {
    pub fn as_call(&self) -> Option<&CallPacket> {
        match self {
            Self::Call(call) => Some(call),
            Self::StateSnapshot { .. } => None,
        }
    }
}

/// What the rest of the editor needs to know about an open trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceMetadata {
    /// Absolute path of the trace file.
    pub path: PathBuf,
    pub uuid: TraceUuid,
    pub pointer_size: u8,
}

impl TraceMetadata {
    pub fn new(path: impl Into<PathBuf>, sof: &SofPacket) -> Self {
        Self {
            path: path.into(),
            uuid: sof.uuid,
            pointer_size: sof.pointer_size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The trace file name, for titles and listings.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_joins_params() {
        let mut call = CallPacket::new(3, "glDrawArrays");
        call.params = vec!["GL_TRIANGLES".into(), "0".into(), "3".into()];
        assert_eq!(call.render(), "glDrawArrays(GL_TRIANGLES, 0, 3)");
        assert_eq!(CallPacket::new(0, "glFlush").render(), "glFlush()");
    }

    #[test]
    fn call_packet_defaults_when_deserializing() {
        let call: CallPacket =
            serde_json::from_str(r#"{"call_index": 5, "entrypoint": "glFinish"}"#).unwrap();
        assert_eq!(call.call_index, 5);
        assert!(call.params.is_empty());
        assert!(call.backtrace_index.is_none());
    }

    #[test]
    fn metadata_from_sof() {
        let sof = SofPacket {
            uuid: TraceUuid::from_words([1, 2, 3, 4]),
            pointer_size: 4,
            ..SofPacket::default()
        };
        let meta = TraceMetadata::new("/traces/game.trace", &sof);
        assert_eq!(meta.uuid, sof.uuid);
        assert_eq!(meta.pointer_size, 4);
        assert_eq!(meta.file_name(), "game.trace");
    }

    #[test]
    fn duration_saturates() {
        let mut call = CallPacket::new(0, "glClear");
        call.begin_ns = 10;
        call.end_ns = 4;
        assert_eq!(call.duration_ns(), 0);
    }
}
