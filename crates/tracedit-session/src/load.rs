use serde_json::Value;
use tracedit_state::codec::document_uuid;
use tracedit_state::StateSnapshot;
use tracedit_store::BlobStore;
use tracedit_trace::TraceMetadata;
use tracedit_tree::{CallTree, NodeId, SnapshotContainer};
use tracedit_types::BlobId;
use tracing::{debug, info, warn};

use crate::document::{SessionFile, SnapshotRecord};
use crate::error::{
    LoadReport, RecordError, RecordTarget, SessionError, SessionResult, SkippedRecord,
};
use crate::paths;

/// Apply a session to the tree of its base trace.
///
/// `blobs` is the store rooted at the session-data folder. The document
/// header is checked against the open trace first; any mismatch aborts the
/// load with the tree untouched. Every record is then decoded, and only
/// after that are the decoded containers placed into the tree. Records that
/// fail are skipped and listed in the report.
pub fn load(
    file: &SessionFile,
    trace: &TraceMetadata,
    blobs: &dyn BlobStore,
    tree: &mut CallTree,
) -> SessionResult<LoadReport> {
    let expected = file.base_trace_path();
    let open = paths::absolute(&trace.path);
    if expected != open {
        return Err(SessionError::BaseTraceMismatch { expected, open });
    }
    if let Some(uuid) = file.base_trace.trace_uuid() {
        if uuid != trace.uuid {
            return Err(SessionError::TraceUuidMismatch {
                expected: uuid,
                found: trace.uuid,
            });
        }
    }

    let mut report = LoadReport::default();
    let mut plan = Vec::with_capacity(file.records.len());
    for (position, raw) in file.records.iter().enumerate() {
        match plan_record(raw, trace, blobs, tree) {
            Ok(entry) => plan.push(entry),
            Err(error) => {
                warn!(position, %error, "skipping session record");
                report.skipped.push(SkippedRecord { position, error });
            }
        }
    }

    for (node, container) in plan {
        tree.set_container(node, container)?;
        report.loaded += 1;
    }

    info!(
        session = %file.path.display(),
        loaded = report.loaded,
        skipped = report.skipped.len(),
        "loaded session"
    );
    Ok(report)
}

fn plan_record(
    raw: &Value,
    trace: &TraceMetadata,
    blobs: &dyn BlobStore,
    tree: &CallTree,
) -> Result<(NodeId, SnapshotContainer), RecordError> {
    let record: SnapshotRecord = serde_json::from_value(raw.clone())
        .map_err(|e| RecordError::MalformedRecord(e.to_string()))?;
    let target = record.target()?;
    if record.rel_path.is_some() && record.uuid.is_none() {
        return Err(RecordError::MalformedRecord(format!(
            "{target} names a payload but has no uuid"
        )));
    }

    let node = match target {
        RecordTarget::Call(index) => tree.find_by_call_index(index),
        RecordTarget::Frame(number) => tree.find_by_frame_number(number),
    }
    .ok_or(RecordError::NodeNotFound(target))?;

    let snapshot = match (&record.rel_path, record.is_valid) {
        (Some(rel_path), true) => Some(read_payload(&record, rel_path, trace, blobs)?),
        (None, true) => match target {
            RecordTarget::Frame(_) => Some(trace_snapshot(&record, target, node, tree)?),
            RecordTarget::Call(_) => {
                return Err(RecordError::MalformedRecord(format!(
                    "{target} is valid but names no payload"
                )));
            }
        },
        (_, false) => None,
    };
    // A frame container without a snapshot would drop the trace keyframe.
    if snapshot.is_none() && matches!(target, RecordTarget::Frame(_)) {
        return Err(RecordError::MissingFrameSnapshot(target));
    }

    debug!(record = %target, node = %node, valid = snapshot.is_some(), "planned session record");
    Ok((
        node,
        SnapshotContainer::restored(snapshot, record.is_edited, record.is_outdated),
    ))
}

fn read_payload(
    record: &SnapshotRecord,
    rel_path: &str,
    trace: &TraceMetadata,
    blobs: &dyn BlobStore,
) -> Result<StateSnapshot, RecordError> {
    let unreadable = |reason: String| RecordError::PayloadUnreadable {
        rel_path: rel_path.to_string(),
        reason,
    };
    let id = BlobId::new(rel_path).map_err(|e| unreadable(e.to_string()))?;
    let bytes = blobs
        .get(&id)
        .map_err(|e| unreadable(e.to_string()))?
        .ok_or_else(|| unreadable("payload is missing".into()))?;
    let doc: Value = serde_json::from_slice(&bytes).map_err(|e| unreadable(e.to_string()))?;

    let payload_uuid = document_uuid(&doc).ok_or_else(|| unreadable("payload has no uuid".into()))?;
    check_uuid(record, &payload_uuid.to_hex())?;

    StateSnapshot::from_document(&doc, blobs, Some(trace.pointer_size))
        .map_err(|e| unreadable(e.to_string()))
}

/// Unedited frame snapshots are not stored; they come from the trace and
/// must already be attached to the frame.
fn trace_snapshot(
    record: &SnapshotRecord,
    target: RecordTarget,
    node: NodeId,
    tree: &CallTree,
) -> Result<StateSnapshot, RecordError> {
    let existing = tree
        .container(node)
        .ok()
        .flatten()
        .filter(|c| c.is_valid())
        .and_then(SnapshotContainer::snapshot)
        .ok_or(RecordError::MissingFrameSnapshot(target))?;
    check_uuid(record, &existing.uuid.to_hex())?;
    Ok(existing.clone())
}

fn check_uuid(record: &SnapshotRecord, found: &str) -> Result<(), RecordError> {
    match &record.uuid {
        Some(expected) if !expected.eq_ignore_ascii_case(found) => Err(RecordError::UuidMismatch {
            record: expected.clone(),
            payload: found.to_string(),
        }),
        _ => Ok(()),
    }
}
