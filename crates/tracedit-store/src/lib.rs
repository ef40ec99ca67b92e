//! Blob storage for tracedit.
//!
//! Snapshots reference their large payloads (texture pixels, buffer
//! contents) by [`BlobId`](tracedit_types::BlobId) instead of embedding them.
//! Session files store their per-snapshot payload documents in the same
//! store under well-known names.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`LooseFileBlobStore`] -- one file per blob inside a directory
//!
//! # Design Rules
//!
//! 1. The store never interprets blob contents.
//! 2. Content-addressed blobs are written once; writing the same id again is a no-op.
//! 3. Writes to disk are published atomically (temp file + rename).
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod loose;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use loose::{LooseFileBlobStore, StoreMode};
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
