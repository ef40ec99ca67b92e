use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::TypeError;

/// Identity of a reconstructed state snapshot.
///
/// The identity survives edits: an edited snapshot keeps the UUID it was
/// created with. Session files use it to check that a payload document
/// belongs to the record that references it. The textual form is 32
/// upper-case hex digits without separators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotUuid(Uuid);

impl SnapshotUuid {
    /// A fresh, time-ordered identity.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Upper-case hex representation (32 characters).
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0.as_bytes())
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode_upper(&self.0.as_bytes()[..4])
    }

    /// Parse from hex. Both the bare and the hyphenated forms are accepted,
    /// in either case.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s.replace('-', "")).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 16] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 16,
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(arr))
    }
}

impl Default for SnapshotUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnapshotUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotUuid({})", self.short_hex())
    }
}

impl fmt::Display for SnapshotUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for SnapshotUuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SnapshotUuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Identity of a recorded trace.
///
/// Stored in the trace's start-of-file packet as four 32-bit words and
/// written into session files so a session can be checked against the trace
/// it was saved from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceUuid(pub [u32; 4]);

impl TraceUuid {
    /// Create from the four words of the start-of-file packet.
    pub const fn from_words(words: [u32; 4]) -> Self {
        Self(words)
    }

    /// The four words.
    pub fn words(&self) -> &[u32; 4] {
        &self.0
    }

    /// Returns `true` if every word is zero (an unstamped trace).
    pub fn is_nil(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl fmt::Display for TraceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.0 {
            write!(f, "{word:08X}")?;
        }
        Ok(())
    }
}

impl From<[u32; 4]> for TraceUuid {
    fn from(words: [u32; 4]) -> Self {
        Self(words)
    }
}

/// Domain tag prepended to content before hashing, so blob ids never collide
/// with hashes computed for other purposes.
const BLOB_DOMAIN: &str = "tracedit-blob-v1";

/// Key of a payload in a blob store.
///
/// Blob ids double as file names in loose-file stores, so they are restricted
/// to ASCII letters, digits, `.`, `_` and `-`, must not be empty, and must not
/// start with a dot. Content-addressed ids are the hex BLAKE3 hash of the
/// domain-separated content; named ids (e.g. `snapshot_call_30.json`) are
/// chosen by the caller.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobId(String);

impl BlobId {
    /// Create a named blob id, validating the character set.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
        if valid {
            Ok(Self(name))
        } else {
            Err(TypeError::InvalidBlobId(name))
        }
    }

    /// The content-addressed id of `data`.
    pub fn for_content(data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(BLOB_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Self(hex::encode(hasher.finalize().as_bytes()))
    }

    /// Returns `true` if `data` hashes to this id.
    pub fn matches_content(&self, data: &[u8]) -> bool {
        Self::for_content(data) == *self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BlobId> for String {
    fn from(id: BlobId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn snapshot_uuid_hex_is_32_upper_chars() {
        let id = SnapshotUuid::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 32);
        assert_eq!(hex, hex.to_uppercase());
    }

    #[test]
    fn snapshot_uuid_hex_roundtrip() {
        let id = SnapshotUuid::from_bytes([0xab; 16]);
        assert_eq!(SnapshotUuid::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(SnapshotUuid::from_hex(&id.to_hex().to_lowercase()).unwrap(), id);
    }

    #[test]
    fn snapshot_uuid_accepts_hyphenated_form() {
        let id = SnapshotUuid::from_hex("B346B680-801E-D2F5-144E-421DEA5EFDCC").unwrap();
        assert_eq!(id.to_hex(), "B346B680801ED2F5144E421DEA5EFDCC");
    }

    #[test]
    fn snapshot_uuid_rejects_wrong_length() {
        let err = SnapshotUuid::from_hex("ABCD").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 16, actual: 2 });
    }

    #[test]
    fn fresh_snapshot_uuids_differ() {
        assert_ne!(SnapshotUuid::new(), SnapshotUuid::new());
    }

    #[test]
    fn snapshot_uuid_serializes_as_string() {
        let id = SnapshotUuid::from_bytes([1; 16]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"01010101010101010101010101010101\"");
        let parsed: SnapshotUuid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn trace_uuid_serializes_as_word_array() {
        let id = TraceUuid::from_words([2761638124, 1361789091, 2623121922, 1789156619]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "[2761638124,1361789091,2623121922,1789156619]");
        assert!(!id.is_nil());
        assert!(TraceUuid::default().is_nil());
    }

    #[test]
    fn blob_id_rejects_path_like_names() {
        assert!(BlobId::new("snapshot_call_30.json").is_ok());
        assert!(BlobId::new("").is_err());
        assert!(BlobId::new("../escape").is_err());
        assert!(BlobId::new("a/b").is_err());
        assert!(BlobId::new(".hidden").is_err());
    }

    #[test]
    fn blob_id_content_hash_is_deterministic() {
        let a = BlobId::for_content(b"pixels");
        let b = BlobId::for_content(b"pixels");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.matches_content(b"pixels"));
        assert!(!a.matches_content(b"other"));
    }

    #[test]
    fn blob_id_deserialize_validates() {
        let ok: BlobId = serde_json::from_str("\"abc.json\"").unwrap();
        assert_eq!(ok.as_str(), "abc.json");
        assert!(serde_json::from_str::<BlobId>("\"../x\"").is_err());
    }

    proptest! {
        #[test]
        fn content_ids_are_always_valid_names(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let id = BlobId::for_content(&data);
            prop_assert!(BlobId::new(id.as_str()).is_ok());
        }
    }
}
