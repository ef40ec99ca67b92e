//! Snapshot resolution for tracedit.
//!
//! This crate turns a position in the call tree into reconstructed GPU state.
//! It provides:
//! - the [`Replayer`] boundary to the external replay engine
//! - [`ResolutionEngine`], which computes snapshots lazily and caches them in
//!   the tree's containers, replaying from the nearest usable predecessor
//! - edit propagation, which marks every snapshot after an edit as outdated
//! - [`RecordingReplayer`] and [`UnavailableReplayer`] for tests and tooling

pub mod error;
pub mod memory;
pub mod propagation;
pub mod resolution;
pub mod traits;

pub use error::{EditError, ReplayError, ResolutionError};
pub use memory::{RecordedRequest, RecordingReplayer, UnavailableReplayer};
pub use propagation::{edit_snapshot, propagate_edits, Propagation};
pub use resolution::{nearest_predecessor, Predecessor, ResolutionEngine, ResolutionStats};
pub use traits::{ReplayBase, ReplayRequest, Replayer};
