use std::collections::HashSet;

use tracedit_state::{ContextSnapshot, StateSnapshot};
use tracedit_tree::NodeId;
use tracedit_types::SnapshotUuid;
use tracing::debug;

use crate::error::ReplayError;
use crate::traits::{ReplayRequest, Replayer};

/// What a [`RecordingReplayer`] was asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub base: Option<NodeId>,
    pub resume_from: Option<u64>,
    pub target_call_index: u64,
}

/// In-process replayer that records every request.
///
/// Replaying carries the base snapshot forward unchanged under a fresh
/// identity, or starts from a single empty context at trace start. Targets
/// registered with [`fail_on`](Self::fail_on) fail.
#[derive(Debug)]
pub struct RecordingReplayer {
    pointer_size: u8,
    fail_on: HashSet<u64>,
    requests: Vec<RecordedRequest>,
}

impl RecordingReplayer {
    pub fn new(pointer_size: u8) -> Self {
        Self {
            pointer_size,
            fail_on: HashSet::new(),
            requests: Vec::new(),
        }
    }

    /// Make replays targeting `call_index` fail.
    pub fn fail_on(mut self, call_index: u64) -> Self {
        self.fail_on.insert(call_index);
        self
    }

    pub fn clear_failures(&mut self) {
        self.fail_on.clear();
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    pub fn replay_count(&self) -> usize {
        self.requests.len()
    }
}

impl Default for RecordingReplayer {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Replayer for RecordingReplayer {
    fn replay(&mut self, request: ReplayRequest<'_>) -> Result<StateSnapshot, ReplayError> {
        self.requests.push(RecordedRequest {
            base: request.base.map(|b| b.node),
            resume_from: request.base.map(|b| b.resume_from),
            target_call_index: request.target_call_index,
        });
        debug!(
            call = request.target_call_index,
            from = request.first_call(),
            calls = request.window(),
            "replaying"
        );

        if self.fail_on.contains(&request.target_call_index) {
            return Err(ReplayError::Failed {
                call_index: request.target_call_index,
                reason: "injected failure".into(),
            });
        }

        let mut snapshot = match request.base {
            Some(base) => base.snapshot.clone(),
            None => StateSnapshot::new(self.pointer_size)
                .with_context(ContextSnapshot::new(1))
                .with_current_context(1),
        };
        snapshot.uuid = SnapshotUuid::new();
        Ok(snapshot)
    }
}

/// Replayer for environments without a replay engine; every replay fails
/// with [`ReplayError::Unavailable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableReplayer;

impl Replayer for UnavailableReplayer {
    fn replay(&mut self, _request: ReplayRequest<'_>) -> Result<StateSnapshot, ReplayError> {
        Err(ReplayError::Unavailable)
    }
}
