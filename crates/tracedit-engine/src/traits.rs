use tracedit_state::StateSnapshot;
use tracedit_tree::{CallTree, NodeId};

use crate::error::ReplayError;

/// Starting point of a replay.
#[derive(Clone, Copy, Debug)]
pub struct ReplayBase<'a> {
    /// Node whose snapshot the replay starts from.
    pub node: NodeId,
    /// First call still to execute on top of `snapshot`.
    pub resume_from: u64,
    pub snapshot: &'a StateSnapshot,
}

/// One replay job: reach the state right after `target_call_index`.
#[derive(Clone, Copy, Debug)]
pub struct ReplayRequest<'a> {
    pub tree: &'a CallTree,
    /// `None` replays from the start of the trace.
    pub base: Option<ReplayBase<'a>>,
    pub target_call_index: u64,
}

impl ReplayRequest<'_> {
    /// First call the replay executes.
    pub fn first_call(&self) -> u64 {
        self.base.map_or(0, |b| b.resume_from)
    }

    /// Number of calls between the base and the target, inclusive.
    pub fn window(&self) -> usize {
        let first = self.first_call();
        self.tree
            .calls()
            .filter(|(_, c)| c.call_index >= first && c.call_index <= self.target_call_index)
            .count()
    }
}

/// Boundary to the replay engine that executes trace calls.
pub trait Replayer {
    /// Execute every call from the base up to and including the target call
    /// and capture the resulting state.
    fn replay(&mut self, request: ReplayRequest<'_>) -> Result<StateSnapshot, ReplayError>;
}

impl<R: Replayer + ?Sized> Replayer for Box<R> {
    fn replay(&mut self, request: ReplayRequest<'_>) -> Result<StateSnapshot, ReplayError> {
        (**self).replay(request)
    }
}
