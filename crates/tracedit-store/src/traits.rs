use tracedit_types::BlobId;

use crate::error::{StoreError, StoreResult};

/// Key-value store for snapshot payloads.
///
/// All implementations must satisfy these invariants:
/// - The store never interprets blob contents.
/// - A content-addressed id always maps to the same bytes, so writing it
///   twice is a no-op.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Read a blob by id.
    ///
    /// Returns `Ok(None)` if the blob does not exist.
    fn get(&self, id: &BlobId) -> StoreResult<Option<Vec<u8>>>;

    /// Write a blob under the given id, replacing any previous value.
    fn put(&self, id: &BlobId, data: &[u8]) -> StoreResult<()>;

    /// Check whether a blob exists in the store.
    fn exists(&self, id: &BlobId) -> StoreResult<bool>;

    /// Read a blob that must exist.
    fn get_required(&self, id: &BlobId) -> StoreResult<Vec<u8>> {
        self.get(id)?.ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Write `data` under its content-addressed id and return the id.
    ///
    /// Skips the write if the id is already present.
    fn put_content(&self, data: &[u8]) -> StoreResult<BlobId> {
        let id = BlobId::for_content(data);
        if !self.exists(&id)? {
            self.put(&id, data)?;
        }
        Ok(id)
    }
}
