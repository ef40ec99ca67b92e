use std::io::Write;

use tempfile::NamedTempFile;
use tracedit_tree::{CallTree, NodeKind};
use tracedit_types::BlobId;
use tracing::{debug, info};

use crate::document::{
    BaseTraceFile, SessionData, SessionDocument, SessionMetadata, SnapshotRecord,
    SESSION_FORMAT_VERSION,
};
use crate::error::{RecordTarget, SessionError, SessionResult};
use crate::layout::{payload_name, SessionContext};
use crate::paths;

/// What a save wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub records: usize,
    pub payloads: usize,
}

/// Write the session for `tree`.
///
/// Every snapshot container gets a record. Call snapshots are always stored;
/// frame snapshots only when edited, since unedited ones come from the trace.
/// Payload documents are written to the context's blob store first, under
/// content-derived names that are never rewritten; the session document is
/// then published atomically. A failed save therefore leaves the previous
/// document and every payload it names intact.
pub fn save(ctx: &SessionContext<'_>, tree: &CallTree) -> SessionResult<SaveSummary> {
    let mut summary = SaveSummary::default();
    let mut snapshots = Vec::new();

    let mut cursor = tree.find_next_with_snapshot(None)?;
    while let Some(id) = cursor {
        let node = tree.node(id)?;
        let Some(container) = node.container() else {
            cursor = tree.find_next_with_snapshot(Some(id))?;
            continue;
        };

        let (target, store_payload) = match &node.kind {
            NodeKind::Call(call) => (RecordTarget::Call(call.call_index), true),
            NodeKind::Frame(frame) => (RecordTarget::Frame(frame.frame_number), container.is_edited()),
            NodeKind::Root => {
                cursor = tree.find_next_with_snapshot(Some(id))?;
                continue;
            }
        };

        let mut record = SnapshotRecord {
            uuid: container.snapshot().map(|s| s.uuid.to_hex()),
            is_valid: container.is_valid(),
            is_edited: container.is_edited(),
            is_outdated: container.is_outdated(),
            ..SnapshotRecord::default()
        };
        match target {
            RecordTarget::Call(index) => record.call_index = Some(index),
            RecordTarget::Frame(number) => record.frame_number = Some(number),
        }

        if let (Some(snapshot), true) = (container.snapshot(), store_payload) {
            let bytes = snapshot
                .to_document_bytes(ctx.blobs)
                .map_err(|source| SessionError::Encode { target, source })?;
            let name = payload_name(target, &bytes);
            let id = BlobId::new(name.clone())?;
            if ctx.blobs.exists(&id)? {
                debug!(record = %target, payload = %name, "snapshot payload already stored");
            } else {
                ctx.blobs.put(&id, &bytes)?;
                debug!(record = %target, payload = %name, "stored snapshot payload");
            }
            record.rel_path = Some(name);
            summary.payloads += 1;
        }

        snapshots.push(record);
        cursor = tree.find_next_with_snapshot(Some(id))?;
    }
    summary.records = snapshots.len();

    let trace_rel = paths::relative_path(&ctx.session_dir(), &ctx.trace.path);
    let document = SessionDocument {
        metadata: SessionMetadata {
            session_file_format_version: SESSION_FORMAT_VERSION,
        },
        base_trace_file: BaseTraceFile {
            rel_path: paths::to_slash(&trace_rel),
            uuid: ctx.trace.uuid.words().to_vec(),
        },
        session_data: SessionData {
            rel_path: ctx.data_folder.clone(),
            snapshots,
        },
    };
    write_document(ctx, &document)?;

    info!(
        session = %ctx.session_file.display(),
        records = summary.records,
        payloads = summary.payloads,
        "saved session"
    );
    Ok(summary)
}

fn write_document(ctx: &SessionContext<'_>, document: &SessionDocument) -> SessionResult<()> {
    let json = serde_json::to_vec_pretty(document)?;
    let write_err = |source| SessionError::Write {
        path: ctx.session_file.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(ctx.session_dir()).map_err(write_err)?;
    tmp.write_all(&json).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(ctx.session_file).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tracedit_state::StateSnapshot;
    use tracedit_store::{BlobStore, InMemoryBlobStore};
    use tracedit_trace::{MemoryTrace, SofPacket, TraceMetadata};
    use tracedit_types::TraceUuid;

    fn setup() -> (CallTree, TraceMetadata) {
        let mut trace = MemoryTrace::builder().frames(2, 10).build();
        let tree = CallTree::build(&mut trace).unwrap();
        let sof = SofPacket {
            uuid: TraceUuid::from_words([1, 2, 3, 4]),
            ..SofPacket::default()
        };
        (tree, TraceMetadata::new("/traces/game.json", &sof))
    }

    fn read(path: &std::path::Path) -> Value {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn records_every_container_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("debug.json");
        let (mut tree, meta) = setup();
        for index in [12, 3] {
            let id = tree.find_by_call_index(index).unwrap();
            tree.ensure_container(id).unwrap().attach(Some(StateSnapshot::new(8)));
        }
        let failed = tree.find_by_call_index(15).unwrap();
        tree.ensure_container(failed).unwrap().attach(None);

        let blobs = InMemoryBlobStore::new();
        let summary = save(&SessionContext::new(&session, &meta, &blobs), &tree).unwrap();
        assert_eq!(summary, SaveSummary { records: 3, payloads: 2 });

        let doc = read(&session);
        assert_eq!(doc["metadata"]["session_file_format_version"], 1);
        assert_eq!(doc["base_trace_file"]["uuid"], serde_json::json!([1, 2, 3, 4]));
        assert_eq!(doc["session_data"]["rel_path"], "debug-sessiondata");
        let records = doc["session_data"]["snapshots"].as_array().unwrap();
        let indices: Vec<u64> = records.iter().map(|r| r["call_index"].as_u64().unwrap()).collect();
        assert_eq!(indices, vec![3, 12, 15]);
        let first = records[0]["rel_path"].as_str().unwrap();
        assert!(first.starts_with("snapshot_call_3_"));
        assert!(records[2].get("uuid").is_none());
        assert!(records[2].get("rel_path").is_none());
        assert_eq!(records[2]["is_valid"], false);

        let second = records[1]["rel_path"].as_str().unwrap();
        assert!(blobs.exists(&BlobId::new(second).unwrap()).unwrap());
    }

    #[test]
    fn frame_payload_only_when_edited() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("s.json");
        let (mut tree, meta) = setup();
        let f0 = tree.find_by_frame_number(0).unwrap();
        let f1 = tree.find_by_frame_number(1).unwrap();
        tree.ensure_container(f0).unwrap().attach(Some(StateSnapshot::new(8)));
        let c = tree.ensure_container(f1).unwrap();
        c.attach(Some(StateSnapshot::new(8)));
        c.mark_edited();

        let blobs = InMemoryBlobStore::new();
        let summary = save(&SessionContext::new(&session, &meta, &blobs), &tree).unwrap();
        assert_eq!(summary.payloads, 1);

        let doc = read(&session);
        let records = doc["session_data"]["snapshots"].as_array().unwrap();
        assert_eq!(records[0]["frame_number"], 0);
        assert!(records[0].get("rel_path").is_none());
        assert!(records[0].get("uuid").is_some());
        let payload = records[1]["rel_path"].as_str().unwrap();
        assert!(payload.starts_with("snapshot_frame_1_"));
    }

    #[test]
    fn trace_path_is_relative_to_session() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = dir.path().join("sessions");
        std::fs::create_dir(&sessions).unwrap();
        let session = sessions.join("s.json");
        let (tree, _) = setup();
        let meta = TraceMetadata::new(dir.path().join("traces/game.json"), &SofPacket::default());

        let blobs = InMemoryBlobStore::new();
        save(&SessionContext::new(&session, &meta, &blobs), &tree).unwrap();
        assert_eq!(read(&session)["base_trace_file"]["rel_path"], "../traces/game.json");
    }

    #[test]
    fn failed_save_keeps_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("s.json");
        std::fs::write(&session, b"previous").unwrap();
        let (tree, meta) = setup();
        let blobs = InMemoryBlobStore::new();

        let missing_dir = dir.path().join("absent/s.json");
        let err = save(&SessionContext::new(&missing_dir, &meta, &blobs), &tree).unwrap_err();
        assert!(matches!(err, SessionError::Write { .. }));
        assert_eq!(std::fs::read(&session).unwrap(), b"previous");
    }

    #[test]
    fn resave_keeps_existing_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("s.json");
        let (mut tree, meta) = setup();
        let id = tree.find_by_call_index(4).unwrap();
        tree.ensure_container(id).unwrap().attach(Some(StateSnapshot::new(8)));

        let blobs = InMemoryBlobStore::new();
        save(&SessionContext::new(&session, &meta, &blobs), &tree).unwrap();
        let old = read(&session)["session_data"]["snapshots"][0]["rel_path"].clone();
        let old_id = BlobId::new(old.as_str().unwrap()).unwrap();
        let old_bytes = blobs.get(&old_id).unwrap().unwrap();

        tree.ensure_container(id).unwrap().attach(Some(StateSnapshot::new(8)));
        save(&SessionContext::new(&session, &meta, &blobs), &tree).unwrap();
        let new = read(&session)["session_data"]["snapshots"][0]["rel_path"].clone();
        assert_ne!(new, old);
        assert_eq!(blobs.get(&old_id).unwrap().unwrap(), old_bytes);
    }

    #[test]
    fn empty_tree_saves_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("s.json");
        let (tree, meta) = setup();
        let blobs = InMemoryBlobStore::new();
        let summary = save(&SessionContext::new(&session, &meta, &blobs), &tree).unwrap();
        assert_eq!(summary, SaveSummary::default());
        assert_eq!(read(&session)["session_data"]["snapshots"], serde_json::json!([]));
    }
}
