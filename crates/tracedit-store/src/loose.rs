use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracedit_types::BlobId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Access mode for a [`LooseFileBlobStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreMode {
    /// Reads only; `put` fails with [`StoreError::ReadOnly`].
    ReadOnly,
    /// Reads and writes; the root directory is created on open.
    ReadWrite,
}

/// Blob store keeping one file per blob inside a root directory.
///
/// The file name is the blob id. Writes go to a temporary file in the root
/// and are renamed into place, so readers never observe a partial blob.
/// Blobs whose id looks like a content hash are verified on read.
#[derive(Debug)]
pub struct LooseFileBlobStore {
    root: PathBuf,
    mode: StoreMode,
}

impl LooseFileBlobStore {
    /// Open a store rooted at `root`.
    ///
    /// In [`StoreMode::ReadWrite`] the directory (and its parents) is created
    /// if missing. In [`StoreMode::ReadOnly`] the directory must exist.
    pub fn open(root: impl Into<PathBuf>, mode: StoreMode) -> StoreResult<Self> {
        let root = root.into();
        match mode {
            StoreMode::ReadWrite => fs::create_dir_all(&root)?,
            StoreMode::ReadOnly if !root.is_dir() => return Err(StoreError::InvalidRoot(root)),
            StoreMode::ReadOnly => {}
        }
        debug!(root = %root.display(), ?mode, "opened loose blob store");
        Ok(Self { root, mode })
    }

    /// The directory holding the blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path a blob is (or would be) stored at.
    pub fn path_of(&self, id: &BlobId) -> PathBuf {
        self.root.join(id.as_str())
    }
}

fn looks_content_addressed(id: &BlobId) -> bool {
    let s = id.as_str();
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl BlobStore for LooseFileBlobStore {
    fn get(&self, id: &BlobId) -> StoreResult<Option<Vec<u8>>> {
        let data = match fs::read(self.path_of(id)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if looks_content_addressed(id) && !id.matches_content(&data) {
            return Err(StoreError::ContentMismatch(id.clone()));
        }
        Ok(Some(data))
    }

    fn put(&self, id: &BlobId, data: &[u8]) -> StoreResult<()> {
        if self.mode == StoreMode::ReadOnly {
            return Err(StoreError::ReadOnly);
        }
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_of(id)).map_err(|e| e.error)?;
        debug!(blob = %id, bytes = data.len(), "wrote blob");
        Ok(())
    }

    fn exists(&self, id: &BlobId) -> StoreResult<bool> {
        Ok(self.path_of(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseFileBlobStore::open(dir.path().join("data"), StoreMode::ReadWrite).unwrap();
        let id = BlobId::new("snapshot_frame_0.json").unwrap();
        store.put(&id, b"{\"uuid\":1}").unwrap();
        assert!(store.exists(&id).unwrap());
        assert_eq!(store.get(&id).unwrap().unwrap(), b"{\"uuid\":1}");
        assert!(dir.path().join("data/snapshot_frame_0.json").is_file());
    }

    #[test]
    fn missing_blob_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseFileBlobStore::open(dir.path(), StoreMode::ReadWrite).unwrap();
        let id = BlobId::new("nothing").unwrap();
        assert!(store.get(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn read_only_store_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseFileBlobStore::open(dir.path(), StoreMode::ReadOnly).unwrap();
        let err = store.put(&BlobId::new("x").unwrap(), b"x").unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly));
    }

    #[test]
    fn read_only_store_requires_existing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = LooseFileBlobStore::open(dir.path().join("absent"), StoreMode::ReadOnly).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoot(_)));
    }

    #[test]
    fn content_addressed_blobs_are_verified_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseFileBlobStore::open(dir.path(), StoreMode::ReadWrite).unwrap();
        let id = store.put_content(b"texels").unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap(), b"texels");

        fs::write(store.path_of(&id), b"tampered").unwrap();
        let err = store.get(&id).unwrap_err();
        assert!(matches!(err, StoreError::ContentMismatch(_)));
    }

    #[test]
    fn put_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseFileBlobStore::open(dir.path(), StoreMode::ReadWrite).unwrap();
        store.put(&BlobId::new("a.json").unwrap(), b"1").unwrap();
        store.put(&BlobId::new("a.json").unwrap(), b"2").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json".to_string()]);
    }
}
