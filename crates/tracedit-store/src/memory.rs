use std::collections::HashMap;
use std::sync::RwLock;

use tracedit_types::BlobId;

use crate::error::StoreResult;
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. All blobs are held in memory behind a
/// `RwLock`. Blobs are cloned on read/write.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobId, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Return a sorted list of all blob ids in the store.
    pub fn all_ids(&self) -> Vec<BlobId> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut ids: Vec<BlobId> = map.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, id: &BlobId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn put(&self, id: &BlobId, data: &[u8]) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(id.clone(), data.to_vec());
        Ok(())
    }

    fn exists(&self, id: &BlobId) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn named(name: &str) -> BlobId {
        BlobId::new(name).unwrap()
    }

    // -----------------------------------------------------------------------
    // Core get / put
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get_named_blob() {
        let store = InMemoryBlobStore::new();
        let id = named("snapshot_call_10.json");
        store.put(&id, b"{}").unwrap();
        assert_eq!(store.get(&id).unwrap().as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.get(&named("missing")).unwrap().is_none());
    }

    #[test]
    fn get_required_reports_not_found() {
        let store = InMemoryBlobStore::new();
        let err = store.get_required(&named("missing")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id.as_str() == "missing"));
    }

    #[test]
    fn put_replaces_named_blob() {
        let store = InMemoryBlobStore::new();
        let id = named("doc.json");
        store.put(&id, b"one").unwrap();
        store.put(&id, b"two").unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Content addressing
    // -----------------------------------------------------------------------

    #[test]
    fn put_content_dedups() {
        let store = InMemoryBlobStore::new();
        let a = store.put_content(b"identical").unwrap();
        let b = store.put_content(b"identical").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert!(a.matches_content(&store.get(&a).unwrap().unwrap()));
    }

    #[test]
    fn different_content_gets_different_ids() {
        let store = InMemoryBlobStore::new();
        let a = store.put_content(b"aaa").unwrap();
        let b = store.put_content(b"bbb").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.total_bytes(), 6);
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn all_ids_is_sorted() {
        let store = InMemoryBlobStore::new();
        store.put(&named("c"), b"3").unwrap();
        store.put(&named("a"), b"1").unwrap();
        store.put(&named("b"), b"2").unwrap();
        let ids: Vec<String> = store.all_ids().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn default_creates_empty_store() {
        let store = InMemoryBlobStore::default();
        assert!(store.is_empty());
        assert!(format!("{store:?}").contains("blob_count"));
    }
}
