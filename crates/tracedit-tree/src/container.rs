//! Per-node holder of a reconstructed snapshot and its status flags.

use tracedit_state::StateSnapshot;
use tracing::warn;

/// Holds at most one snapshot for a tree position.
///
/// - `is_valid` is true iff the last attach carried a snapshot.
/// - `is_edited` implies a snapshot is present.
/// - `is_outdated` means an earlier edit invalidated this snapshot; it is
///   only set by edit propagation or when restoring a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotContainer {
    snapshot: Option<StateSnapshot>,
    is_valid: bool,
    is_edited: bool,
    is_outdated: bool,
}

impl SnapshotContainer {
    /// An empty, invalid container.
    pub fn new() -> Self {
        Self::default()
    }

    /// A container holding a freshly computed snapshot.
    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        let mut container = Self::new();
        container.attach(Some(snapshot));
        container
    }

    /// Rebuild a container from persisted flags.
    ///
    /// `is_valid` follows the presence of `snapshot`, and `is_edited` is
    /// dropped when there is no snapshot to be edited.
    pub fn restored(snapshot: Option<StateSnapshot>, is_edited: bool, is_outdated: bool) -> Self {
        let has_snapshot = snapshot.is_some();
        Self {
            snapshot,
            is_valid: has_snapshot,
            is_edited: is_edited && has_snapshot,
            is_outdated,
        }
    }

    /// Replace the snapshot.
    ///
    /// Clears `is_edited` and `is_outdated`; the container becomes valid iff
    /// a snapshot is given. Attaching `None` records a failed computation.
    pub fn attach(&mut self, snapshot: Option<StateSnapshot>) {
        self.is_valid = snapshot.is_some();
        self.snapshot = snapshot;
        self.is_edited = false;
        self.is_outdated = false;
    }

    /// Mark the held snapshot as edited by the user.
    ///
    /// Calling this without a snapshot is a programming error: it panics in
    /// debug builds and is ignored otherwise.
    pub fn mark_edited(&mut self) {
        debug_assert!(self.snapshot.is_some(), "mark_edited on an empty container");
        if self.snapshot.is_none() {
            warn!("ignoring mark_edited on a container without a snapshot");
            return;
        }
        self.is_edited = true;
    }

    pub fn mark_outdated(&mut self, outdated: bool) {
        self.is_outdated = outdated;
    }

    pub fn snapshot(&self) -> Option<&StateSnapshot> {
        self.snapshot.as_ref()
    }

    /// Mutable access for editing. Callers must follow up with
    /// [`mark_edited`](Self::mark_edited).
    pub fn snapshot_mut(&mut self) -> Option<&mut StateSnapshot> {
        self.snapshot.as_mut()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn is_edited(&self) -> bool {
        self.is_edited
    }

    pub fn is_outdated(&self) -> bool {
        self.is_outdated
    }

    /// Valid, holding a snapshot, and not outdated: usable without replay.
    pub fn is_current(&self) -> bool {
        self.is_valid && self.snapshot.is_some() && !self.is_outdated
    }
}
