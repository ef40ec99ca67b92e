use std::path::{Path, PathBuf};

use tracedit_store::BlobStore;
use tracedit_trace::TraceMetadata;
use tracedit_types::BlobId;

use crate::error::RecordTarget;

/// Appended to the session file stem to name the session-data folder.
pub const DEFAULT_DATA_FOLDER_SUFFIX: &str = "-sessiondata";

/// Name of the session-data folder for `session_file`, e.g.
/// `game-sessiondata` for `game.json`.
pub fn data_folder_name(session_file: &Path, suffix: &str) -> String {
    let stem = session_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{suffix}")
}

/// Name of the payload document `document` stored for a record.
///
/// The name ends in a short content hash: one name always holds the same
/// bytes.
pub fn payload_name(target: RecordTarget, document: &[u8]) -> String {
    let digest = BlobId::for_content(document);
    let short = &digest.as_str()[..16];
    match target {
        RecordTarget::Call(index) => format!("snapshot_call_{index}_{short}.json"),
        RecordTarget::Frame(number) => format!("snapshot_frame_{number}_{short}.json"),
    }
}

/// Location of the session-data folder `data_folder` belonging to
/// `session_file`.
pub fn data_dir(session_file: &Path, data_folder: &str) -> PathBuf {
    session_dir(session_file).join(data_folder)
}

/// Everything a save needs besides the tree.
pub struct SessionContext<'a> {
    /// Path of the session document.
    pub session_file: &'a Path,
    /// Session-data folder name, relative to the session file's directory.
    pub data_folder: String,
    /// The open base trace.
    pub trace: &'a TraceMetadata,
    /// Store rooted at the session-data folder.
    pub blobs: &'a dyn BlobStore,
}

impl<'a> SessionContext<'a> {
    pub fn new(session_file: &'a Path, trace: &'a TraceMetadata, blobs: &'a dyn BlobStore) -> Self {
        Self {
            session_file,
            data_folder: data_folder_name(session_file, DEFAULT_DATA_FOLDER_SUFFIX),
            trace,
            blobs,
        }
    }

    pub fn with_data_folder(mut self, data_folder: impl Into<String>) -> Self {
        self.data_folder = data_folder.into();
        self
    }

    /// Directory holding the session document.
    pub fn session_dir(&self) -> PathBuf {
        session_dir(self.session_file)
    }

    /// Path of the session-data folder.
    pub fn data_dir(&self) -> PathBuf {
        data_dir(self.session_file, &self.data_folder)
    }
}

pub(crate) fn session_dir(session_file: &Path) -> PathBuf {
    match session_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
