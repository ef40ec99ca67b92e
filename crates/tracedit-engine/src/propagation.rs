//! Edit propagation.
//!
//! Editing a snapshot changes the state every later snapshot was derived
//! from. After an edit, one pass over all containers in execution order
//! marks everything after the first edited container as outdated and clears
//! the outdated flag on the unedited containers before it. Only the first
//! edited container counts: a later container is marked outdated even if it
//! was edited itself.

use tracedit_state::StateSnapshot;
use tracedit_tree::{CallTree, NodeId};
use tracing::{debug, info};

use crate::error::EditError;

/// Outcome of one propagation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Propagation {
    /// The first edited container, if any.
    pub source: Option<NodeId>,
    /// Containers marked outdated by this pass.
    pub outdated: usize,
}

/// Recompute every container's outdated flag from the edited flags.
pub fn propagate_edits(tree: &mut CallTree) -> Propagation {
    let mut result = Propagation::default();
    for (id, container) in tree.containers_mut() {
        if result.source.is_some() {
            container.mark_outdated(true);
            result.outdated += 1;
        } else if container.is_edited() {
            result.source = Some(id);
        } else {
            container.mark_outdated(false);
        }
    }
    debug!(source = ?result.source, outdated = result.outdated, "propagated edits");
    result
}

/// Apply `edit` to the snapshot at `node`, flag it as edited and propagate.
///
/// The snapshot keeps its identity across the edit.
pub fn edit_snapshot<F>(tree: &mut CallTree, node: NodeId, edit: F) -> Result<Propagation, EditError>
where
    F: FnOnce(&mut StateSnapshot),
{
    let container = tree
        .container_mut(node)?
        .filter(|c| c.has_snapshot())
        .ok_or(EditError::NoSnapshot(node))?;
    if let Some(snapshot) = container.snapshot_mut() {
        edit(snapshot);
    }
    container.mark_edited();
    let result = propagate_edits(tree);
    info!(node = %node, outdated = result.outdated, "edited snapshot");
    Ok(result)
}
