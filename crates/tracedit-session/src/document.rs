//! The session document.
//!
//! ```json
//! {
//!   "metadata": { "session_file_format_version": 1 },
//!   "base_trace_file": { "rel_path": "../traces/game.json", "uuid": [1, 2, 3, 4] },
//!   "session_data": {
//!     "rel_path": "debug-sessiondata",
//!     "snapshots": [
//!       { "uuid": "0190...", "is_valid": true, "is_edited": true, "is_outdated": false,
//!         "call_index": 30, "rel_path": "snapshot_call_30_5e0b21c48f7d9a13.json" }
//!     ]
//!   }
//! }
//! ```
//!
//! Older editors wrote the version as a hex string (`"0x1"`); both forms
//! are read.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracedit_types::TraceUuid;

use crate::error::{RecordError, RecordTarget, SessionError, SessionResult};
use crate::layout::session_dir;
use crate::paths;

/// Session format version written by this editor.
pub const SESSION_FORMAT_VERSION: u64 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_file_format_version: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTraceFile {
    /// Trace path relative to the session file's directory.
    pub rel_path: String,
    pub uuid: Vec<u32>,
}

impl BaseTraceFile {
    pub fn trace_uuid(&self) -> Option<TraceUuid> {
        let words: [u32; 4] = self.uuid.as_slice().try_into().ok()?;
        Some(TraceUuid::from_words(words))
    }
}

/// One snapshot container as persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub is_valid: bool,
    pub is_edited: bool,
    pub is_outdated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u64>,
    /// Payload document name inside the session-data folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel_path: Option<String>,
}

impl SnapshotRecord {
    /// The tree position this record applies to.
    pub fn target(&self) -> Result<RecordTarget, RecordError> {
        match (self.call_index, self.frame_number) {
            (Some(index), None) => Ok(RecordTarget::Call(index)),
            (None, Some(number)) => Ok(RecordTarget::Frame(number)),
            (Some(_), Some(_)) => Err(RecordError::MalformedRecord(
                "both call_index and frame_number are set".into(),
            )),
            (None, None) => Err(RecordError::MalformedRecord(
                "neither call_index nor frame_number is set".into(),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Session-data folder relative to the session file's directory.
    pub rel_path: String,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
}

/// A complete session document, as written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub metadata: SessionMetadata,
    pub base_trace_file: BaseTraceFile,
    pub session_data: SessionData,
}

/// A session document read from disk.
///
/// The header is validated on read; snapshot records are kept as raw JSON
/// so that one bad record does not make the whole document unreadable.
#[derive(Clone, Debug)]
pub struct SessionFile {
    pub path: PathBuf,
    pub version: u64,
    pub base_trace: BaseTraceFile,
    /// Session-data folder relative to the session file's directory.
    pub data_rel_path: String,
    pub records: Vec<Value>,
}

#[derive(Deserialize)]
struct Header {
    base_trace_file: BaseTraceFile,
    session_data: DataHeader,
}

#[derive(Deserialize)]
struct DataHeader {
    rel_path: String,
    #[serde(default)]
    snapshots: Vec<Value>,
}

impl SessionFile {
    /// Read and validate a session document.
    pub fn read(path: &Path) -> SessionResult<Self> {
        let unreadable = |reason: String| SessionError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        let doc: Value = serde_json::from_slice(&bytes).map_err(|e| unreadable(e.to_string()))?;
        Self::from_value(path, doc)
    }

    /// Validate an already parsed session document.
    pub fn from_value(path: &Path, doc: Value) -> SessionResult<Self> {
        let unreadable = |reason: String| SessionError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };

        let version = format_version(&doc).map_err(unreadable)?;
        if version != SESSION_FORMAT_VERSION {
            return Err(SessionError::UnsupportedVersion {
                found: version,
                supported: SESSION_FORMAT_VERSION,
            });
        }

        let header: Header = serde_json::from_value(doc).map_err(|e| unreadable(e.to_string()))?;
        if header.base_trace_file.trace_uuid().is_none() {
            return Err(unreadable(format!(
                "base trace uuid must have 4 words, found {}",
                header.base_trace_file.uuid.len()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            version,
            base_trace: header.base_trace_file,
            data_rel_path: header.session_data.rel_path,
            records: header.session_data.snapshots,
        })
    }

    /// Absolute, normalized path of the base trace.
    pub fn base_trace_path(&self) -> PathBuf {
        paths::absolute(&session_dir(&self.path).join(&self.base_trace.rel_path))
    }

    /// Absolute, normalized path of the session-data folder.
    pub fn data_dir(&self) -> PathBuf {
        paths::absolute(&session_dir(&self.path).join(&self.data_rel_path))
    }
}

/// Read `metadata.session_file_format_version` as an integer or a
/// (hex or decimal) string.
fn format_version(doc: &Value) -> Result<u64, String> {
    let value = doc
        .get("metadata")
        .and_then(|m| m.get("session_file_format_version"))
        .ok_or_else(|| "missing metadata.session_file_format_version".to_string())?;
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| format!("invalid session format version {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(version: Value) -> Value {
        json!({
            "metadata": { "session_file_format_version": version },
            "base_trace_file": { "rel_path": "game.json", "uuid": [1, 2, 3, 4] },
            "session_data": { "rel_path": "s-sessiondata", "snapshots": [ { "bogus": true } ] }
        })
    }

    #[test]
    fn integer_and_legacy_hex_versions_are_accepted() {
        for version in [json!(1), json!("0x1"), json!("1")] {
            let file = SessionFile::from_value(Path::new("/s/s.json"), doc(version)).unwrap();
            assert_eq!(file.version, 1);
        }
    }

    #[test]
    fn version_two_is_unsupported() {
        let err = SessionFile::from_value(Path::new("/s/s.json"), doc(json!(2))).unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedVersion { found: 2, supported: 1 }));
        let err = SessionFile::from_value(Path::new("/s/s.json"), doc(json!("0x2"))).unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn missing_version_is_unreadable() {
        let mut d = doc(json!(1));
        d["metadata"] = json!({});
        let err = SessionFile::from_value(Path::new("s.json"), d).unwrap_err();
        assert!(matches!(err, SessionError::Unreadable { .. }));
    }

    #[test]
    fn bad_records_do_not_fail_the_header() {
        let file = SessionFile::from_value(Path::new("/s/s.json"), doc(json!(1))).unwrap();
        assert_eq!(file.records.len(), 1);
        assert_eq!(file.base_trace_path(), PathBuf::from("/s/game.json"));
        assert_eq!(file.data_dir(), PathBuf::from("/s/s-sessiondata"));
    }

    #[test]
    fn short_trace_uuid_is_unreadable() {
        let mut d = doc(json!(1));
        d["base_trace_file"]["uuid"] = json!([1, 2]);
        let err = SessionFile::from_value(Path::new("s.json"), d).unwrap_err();
        assert!(err.to_string().contains("4 words"));
    }

    #[test]
    fn read_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionFile::read(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SessionError::Unreadable { .. }));
    }

    #[test]
    fn record_target() {
        let mut record = SnapshotRecord {
            call_index: Some(3),
            ..SnapshotRecord::default()
        };
        assert_eq!(record.target().unwrap(), RecordTarget::Call(3));
        record.frame_number = Some(0);
        assert!(matches!(record.target(), Err(RecordError::MalformedRecord(_))));
        record.call_index = None;
        assert_eq!(record.target().unwrap(), RecordTarget::Frame(0));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let record = SnapshotRecord {
            is_valid: false,
            frame_number: Some(0),
            ..SnapshotRecord::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("uuid").is_none());
        assert!(value.get("call_index").is_none());
        assert_eq!(value["frame_number"], json!(0));
    }
}
