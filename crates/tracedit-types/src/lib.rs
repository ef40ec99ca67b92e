//! Foundation types for tracedit.
//!
//! This crate provides the identifiers shared by every other tracedit crate.
//!
//! # Key Types
//!
//! - [`SnapshotUuid`]: Identity of a reconstructed state snapshot
//! - [`TraceUuid`]: Identity of a recorded trace, taken from its start-of-file packet
//! - [`BlobId`]: Key of a payload in a blob store (content hash or document name)

pub mod error;
pub mod ids;

pub use error::TypeError;
pub use ids::{BlobId, SnapshotUuid, TraceUuid};
