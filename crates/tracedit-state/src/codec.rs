//! Document (JSON) and binary (bincode) forms of a [`StateSnapshot`].
//!
//! Both forms move inline payloads into a [`BlobStore`] as content-addressed
//! blobs and carry [`Payload::Blob`] references in their place. Decoding
//! reads the blobs back, so a decoded snapshot is always fully inline.

use serde_json::Value;
use tracedit_store::BlobStore;
use tracedit_types::SnapshotUuid;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::object::Payload;
use crate::snapshot::StateSnapshot;

impl StateSnapshot {
    /// Encode as a JSON document, writing payloads to `blobs`.
    pub fn to_document(&self, blobs: &dyn BlobStore) -> StateResult<Value> {
        let external = self.externalized(blobs)?;
        Ok(serde_json::to_value(&external)?)
    }

    /// Encode as pretty-printed JSON bytes, writing payloads to `blobs`.
    pub fn to_document_bytes(&self, blobs: &dyn BlobStore) -> StateResult<Vec<u8>> {
        let doc = self.to_document(blobs)?;
        Ok(serde_json::to_vec_pretty(&doc)?)
    }

    /// Decode a JSON document, reading payloads from `blobs`.
    ///
    /// If `expected_pointer_size` is given, a snapshot captured with a
    /// different pointer size is rejected. The decoded snapshot is validated.
    pub fn from_document(
        doc: &Value,
        blobs: &dyn BlobStore,
        expected_pointer_size: Option<u8>,
    ) -> StateResult<Self> {
        if document_uuid(doc).is_none() {
            return Err(StateError::MissingUuid);
        }
        let snapshot: StateSnapshot = serde_json::from_value(doc.clone())?;
        snapshot.internalized(blobs, expected_pointer_size)
    }

    /// Decode JSON bytes, reading payloads from `blobs`.
    pub fn from_document_bytes(
        bytes: &[u8],
        blobs: &dyn BlobStore,
        expected_pointer_size: Option<u8>,
    ) -> StateResult<Self> {
        let doc: Value = serde_json::from_slice(bytes)?;
        Self::from_document(&doc, blobs, expected_pointer_size)
    }

    /// Encode in binary form, writing payloads to `blobs`.
    pub fn to_binary(&self, blobs: &dyn BlobStore) -> StateResult<Vec<u8>> {
        let external = self.externalized(blobs)?;
        bincode::serialize(&external).map_err(|e| StateError::Binary(e.to_string()))
    }

    /// Decode the binary form, reading payloads from `blobs`.
    pub fn from_binary(
        bytes: &[u8],
        blobs: &dyn BlobStore,
        expected_pointer_size: Option<u8>,
    ) -> StateResult<Self> {
        let snapshot: StateSnapshot =
            bincode::deserialize(bytes).map_err(|e| StateError::Binary(e.to_string()))?;
        snapshot.internalized(blobs, expected_pointer_size)
    }

    // -----------------------------------------------------------------------
    // Payload movement
    // -----------------------------------------------------------------------

    fn externalized(&self, blobs: &dyn BlobStore) -> StateResult<Self> {
        let mut out = self.clone();
        let mut written = 0usize;
        for object in out.contexts.iter_mut().flat_map(|c| c.objects.iter_mut()) {
            if let Some(payload) = object.payload_mut() {
                if let Payload::Inline(data) = payload {
                    let id = blobs.put_content(data)?;
                    *payload = Payload::Blob(id);
                    written += 1;
                }
            }
        }
        debug!(uuid = %self.uuid, payloads = written, "externalized snapshot payloads");
        Ok(out)
    }

    fn internalized(
        mut self,
        blobs: &dyn BlobStore,
        expected_pointer_size: Option<u8>,
    ) -> StateResult<Self> {
        if let Some(expected) = expected_pointer_size {
            if expected != self.pointer_size {
                return Err(StateError::PointerSizeMismatch {
                    expected,
                    found: self.pointer_size,
                });
            }
        }
        for object in self.contexts.iter_mut().flat_map(|c| c.objects.iter_mut()) {
            if let Some(payload) = object.payload_mut() {
                if let Payload::Blob(id) = payload {
                    let data = blobs.get_required(id)?;
                    *payload = Payload::Inline(data);
                }
            }
        }
        self.validate()?;
        Ok(self)
    }
}

/// Read the `uuid` field of a snapshot document without decoding the rest.
///
/// Returns `None` when the field is absent or not a valid identity.
pub fn document_uuid(doc: &Value) -> Option<SnapshotUuid> {
    doc.get("uuid")
        .and_then(Value::as_str)
        .and_then(|s| SnapshotUuid::from_hex(s).ok())
}
