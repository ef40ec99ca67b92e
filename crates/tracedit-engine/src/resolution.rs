use tracedit_state::StateSnapshot;
use tracedit_tree::{CallTree, NodeId, NodeKind, SnapshotContainer, TreeResult};
use tracing::{debug, debug_span, warn};

use crate::error::ResolutionError;
use crate::traits::{ReplayBase, ReplayRequest, Replayer};

/// Where a replay toward some target has to start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predecessor {
    /// The closest earlier node holding a current snapshot.
    Snapshot(NodeId),
    /// No earlier usable snapshot; replay from the first call.
    TraceStart,
}

/// Counters kept by a [`ResolutionEngine`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub cache_hits: u64,
    pub replays: u64,
    pub failures: u64,
}

/// Computes snapshots on demand and caches them in the tree.
///
/// A request is answered from the node's container when it is current.
/// Otherwise the engine replays from the nearest earlier current snapshot
/// (or the trace start) to the node's call and attaches the result. One
/// replay is attempted per request.
pub struct ResolutionEngine<R: Replayer> {
    replayer: R,
    stats: ResolutionStats,
}

impl<R: Replayer> ResolutionEngine<R> {
    pub fn new(replayer: R) -> Self {
        Self {
            replayer,
            stats: ResolutionStats::default(),
        }
    }

    pub fn replayer(&self) -> &R {
        &self.replayer
    }

    pub fn replayer_mut(&mut self) -> &mut R {
        &mut self.replayer
    }

    pub fn into_replayer(self) -> R {
        self.replayer
    }

    pub fn stats(&self) -> ResolutionStats {
        self.stats
    }

    /// The snapshot representing the state right after `node`.
    ///
    /// On replay failure the node's container is left without a snapshot
    /// and the error is returned; a stale cached value is never handed out.
    pub fn resolve<'t>(
        &mut self,
        tree: &'t mut CallTree,
        node: NodeId,
    ) -> Result<&'t StateSnapshot, ResolutionError> {
        let _span = debug_span!("resolve", node = %node).entered();

        if is_current(tree, node)? {
            self.stats.cache_hits += 1;
            debug!("snapshot cache hit");
            return cached(tree, node);
        }

        let call_index = match &tree.node(node)?.kind {
            NodeKind::Call(call) => call.call_index,
            NodeKind::Frame(_) | NodeKind::Root => {
                return Err(ResolutionError::NotReplayable(node));
            }
        };

        let predecessor = nearest_predecessor(tree, node)?;
        let outcome = {
            let base = match predecessor {
                Predecessor::Snapshot(base_node) => Some(ReplayBase {
                    node: base_node,
                    resume_from: resume_point(tree, base_node)?,
                    snapshot: cached(tree, base_node)?,
                }),
                Predecessor::TraceStart => None,
            };
            let request = ReplayRequest {
                tree: &*tree,
                base,
                target_call_index: call_index,
            };
            self.replayer.replay(request)
        };

        match outcome {
            Ok(snapshot) => {
                debug!(call = call_index, uuid = %snapshot.uuid, ?predecessor, "replayed snapshot");
                tree.ensure_container(node)?.attach(Some(snapshot));
                self.stats.replays += 1;
                cached(tree, node)
            }
            Err(source) => {
                warn!(call = call_index, error = %source, "snapshot replay failed");
                tree.ensure_container(node)?.attach(None);
                self.stats.failures += 1;
                Err(ResolutionError::Replay { call_index, source })
            }
        }
    }
}

fn is_current(tree: &CallTree, node: NodeId) -> TreeResult<bool> {
    Ok(tree.container(node)?.is_some_and(SnapshotContainer::is_current))
}

fn cached(tree: &CallTree, node: NodeId) -> Result<&StateSnapshot, ResolutionError> {
    tree.container(node)?
        .and_then(SnapshotContainer::snapshot)
        .ok_or(ResolutionError::NoSnapshot(node))
}

/// First call that still has to run on top of `base`'s snapshot.
///
/// A call's snapshot is the state after the call; a frame's snapshot is the
/// state before its first call.
fn resume_point(tree: &CallTree, base: NodeId) -> TreeResult<u64> {
    Ok(match &tree.node(base)?.kind {
        NodeKind::Call(call) => call.call_index + 1,
        NodeKind::Frame(frame) => frame.first_call_index,
        NodeKind::Root => 0,
    })
}

/// The nearest node strictly before `target` in execution order whose
/// container holds a current snapshot.
pub fn nearest_predecessor(tree: &CallTree, target: NodeId) -> TreeResult<Predecessor> {
    let position = tree.check(target)?;
    let found = tree
        .iter()
        .take_while(|(id, _)| id.index() < position)
        .filter(|(_, node)| node.container().is_some_and(SnapshotContainer::is_current))
        .last()
        .map(|(id, _)| id);
    Ok(found.map_or(Predecessor::TraceStart, Predecessor::Snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplayError;
    use crate::memory::{RecordingReplayer, UnavailableReplayer};
    use tracedit_trace::MemoryTrace;
    use tracedit_tree::TreeError;

    /// 100 calls; frame 0 holds calls 0..=49 and frame 1 holds 50..=99.
    fn hundred_calls() -> CallTree {
        let mut trace = MemoryTrace::builder().frames(2, 50).build();
        CallTree::build(&mut trace).unwrap()
    }

    fn at(tree: &CallTree, call_index: u64) -> NodeId {
        tree.find_by_call_index(call_index).unwrap()
    }

    fn engine() -> ResolutionEngine<RecordingReplayer> {
        ResolutionEngine::new(RecordingReplayer::default())
    }

    // -----------------------------------------------------------------------
    // Predecessor search
    // -----------------------------------------------------------------------

    #[test]
    fn predecessor_is_trace_start_without_snapshots() {
        let tree = hundred_calls();
        assert_eq!(nearest_predecessor(&tree, at(&tree, 30)).unwrap(), Predecessor::TraceStart);
    }

    #[test]
    fn predecessor_is_strictly_before_target() {
        let mut tree = hundred_calls();
        let ten = at(&tree, 10);
        let thirty = at(&tree, 30);
        tree.ensure_container(ten).unwrap().attach(Some(StateSnapshot::new(8)));
        tree.ensure_container(thirty).unwrap().attach(Some(StateSnapshot::new(8)));

        assert_eq!(nearest_predecessor(&tree, thirty).unwrap(), Predecessor::Snapshot(ten));
        assert_eq!(nearest_predecessor(&tree, ten).unwrap(), Predecessor::TraceStart);
        assert_eq!(nearest_predecessor(&tree, at(&tree, 31)).unwrap(), Predecessor::Snapshot(thirty));
    }

    #[test]
    fn predecessor_skips_invalid_and_outdated() {
        let mut tree = hundred_calls();
        let five = at(&tree, 5);
        tree.ensure_container(five).unwrap().attach(Some(StateSnapshot::new(8)));
        tree.ensure_container(at(&tree, 10)).unwrap().attach(None);
        let twenty = at(&tree, 20);
        let c = tree.ensure_container(twenty).unwrap();
        c.attach(Some(StateSnapshot::new(8)));
        c.mark_outdated(true);

        assert_eq!(nearest_predecessor(&tree, at(&tree, 30)).unwrap(), Predecessor::Snapshot(five));
    }

    #[test]
    fn predecessor_of_foreign_node_is_an_error() {
        let tree = hundred_calls();
        let other = hundred_calls();
        let foreign = at(&other, 1);
        assert_eq!(
            nearest_predecessor(&tree, foreign).unwrap_err(),
            TreeError::InvalidNodeReference(foreign)
        );
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_replays_from_nearest_snapshot() {
        let mut tree = hundred_calls();
        let ten = at(&tree, 10);
        let thirty = at(&tree, 30);
        tree.ensure_container(ten).unwrap().attach(Some(StateSnapshot::new(8)));

        let mut engine = engine();
        let uuid = engine.resolve(&mut tree, thirty).unwrap().uuid;

        let req = &engine.replayer().requests()[0];
        assert_eq!(req.base, Some(ten));
        assert_eq!(req.resume_from, Some(11));
        assert_eq!(req.target_call_index, 30);
        let container = tree.container(thirty).unwrap().unwrap();
        assert!(container.is_current());
        assert_eq!(container.snapshot().unwrap().uuid, uuid);
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut tree = hundred_calls();
        let node = at(&tree, 42);
        let mut engine = engine();
        let first = engine.resolve(&mut tree, node).unwrap().uuid;
        let second = engine.resolve(&mut tree, node).unwrap().uuid;
        assert_eq!(first, second);
        assert_eq!(engine.replayer().replay_count(), 1);
        assert_eq!(
            engine.stats(),
            ResolutionStats {
                cache_hits: 1,
                replays: 1,
                failures: 0
            }
        );
    }

    #[test]
    fn resolve_from_trace_start() {
        let mut tree = hundred_calls();
        let mut engine = engine();
        let three = at(&tree, 3);
        engine.resolve(&mut tree, three).unwrap();
        let req = &engine.replayer().requests()[0];
        assert_eq!(req.base, None);
        assert_eq!(req.resume_from, None);
    }

    #[test]
    fn frame_snapshot_resumes_at_first_call_of_frame() {
        let mut tree = hundred_calls();
        let frame = tree.find_by_frame_number(1).unwrap();
        tree.ensure_container(frame).unwrap().attach(Some(StateSnapshot::new(8)));
        let mut engine = engine();
        let sixty = at(&tree, 60);
        engine.resolve(&mut tree, sixty).unwrap();
        let req = &engine.replayer().requests()[0];
        assert_eq!(req.base, Some(frame));
        assert_eq!(req.resume_from, Some(50));
    }

    #[test]
    fn outdated_snapshot_is_recomputed() {
        let mut tree = hundred_calls();
        let node = at(&tree, 20);
        let mut engine = engine();
        let before = engine.resolve(&mut tree, node).unwrap().uuid;
        tree.container_mut(node).unwrap().unwrap().mark_outdated(true);
        let after = engine.resolve(&mut tree, node).unwrap().uuid;
        assert_ne!(before, after);
        assert!(tree.container(node).unwrap().unwrap().is_current());
    }

    #[test]
    fn failed_replay_leaves_container_invalid() {
        let mut tree = hundred_calls();
        let node = at(&tree, 30);
        tree.ensure_container(node).unwrap().attach(Some(StateSnapshot::new(8)));
        tree.container_mut(node).unwrap().unwrap().mark_outdated(true);

        let mut engine = ResolutionEngine::new(RecordingReplayer::default().fail_on(30));
        let err = engine.resolve(&mut tree, node).unwrap_err();
        assert!(matches!(err, ResolutionError::Replay { call_index: 30, .. }));

        let container = tree.container(node).unwrap().unwrap();
        assert!(!container.is_valid());
        assert!(container.snapshot().is_none());
        assert_eq!(engine.stats().failures, 1);
    }

    #[test]
    fn unavailable_replayer_reports_unavailable() {
        let mut tree = hundred_calls();
        let node = at(&tree, 1);
        let mut engine = ResolutionEngine::new(UnavailableReplayer);
        let err = engine.resolve(&mut tree, node).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::Replay {
                source: ReplayError::Unavailable,
                ..
            }
        ));
    }

    #[test]
    fn frames_are_not_replayable() {
        let mut tree = hundred_calls();
        let frame = tree.find_by_frame_number(0).unwrap();
        let mut engine = engine();
        assert_eq!(
            engine.resolve(&mut tree, frame).unwrap_err(),
            ResolutionError::NotReplayable(frame)
        );
        assert_eq!(engine.replayer().replay_count(), 0);
    }

    #[test]
    fn current_frame_snapshot_resolves_from_cache() {
        let mut tree = hundred_calls();
        let frame = tree.find_by_frame_number(0).unwrap();
        let snap = StateSnapshot::new(8);
        let uuid = snap.uuid;
        tree.ensure_container(frame).unwrap().attach(Some(snap));
        let mut engine = engine();
        assert_eq!(engine.resolve(&mut tree, frame).unwrap().uuid, uuid);
    }
}
