use tracedit_state::StateSnapshot;
use tracing::{debug, info};

use crate::classify::{classify, EntrypointClass};
use crate::error::TraceResult;
use crate::packet::TracePacket;
use crate::reader::TraceReader;

/// Read the keyframe snapshot of a trimmed trace.
///
/// A trimmed trace stores the GPU state at its first call as a binary
/// state-snapshot packet ahead of any rendering. The reader is rewound to
/// frame 0 and scanned until that packet; a draw, swap-buffers or
/// make-current call seen first (or the end of the trace) means the trace
/// carries no keyframe and `Ok(None)` is returned.
pub fn read_keyframe_snapshot(reader: &mut dyn TraceReader) -> TraceResult<Option<StateSnapshot>> {
    reader.seek_to_frame(0)?;
    let pointer_size = reader.sof_packet().pointer_size;

    while let Some(packet) = reader.read_next_packet()? {
        match packet {
            TracePacket::Call(call) => match classify(&call.entrypoint) {
                EntrypointClass::Draw | EntrypointClass::SwapBuffers | EntrypointClass::MakeCurrent => {
                    debug!(call = call.call_index, "no keyframe before first state-changing call");
                    return Ok(None);
                }
                EntrypointClass::Other => {}
            },
            TracePacket::StateSnapshot { binary_id } => {
                let blobs = reader.blob_store();
                let bytes = blobs.get_required(&binary_id)?;
                let snapshot = StateSnapshot::from_binary(&bytes, blobs, Some(pointer_size))?;
                info!(uuid = %snapshot.uuid, blob = %binary_id, "read keyframe snapshot");
                return Ok(Some(snapshot));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraceError;
    use crate::memory::MemoryTrace;
    use tracedit_state::ContextSnapshot;

    fn keyframe() -> StateSnapshot {
        StateSnapshot::new(8).with_context(ContextSnapshot::new(1)).with_current_context(1)
    }

    #[test]
    fn keyframe_before_first_draw_is_found() {
        let snap = keyframe();
        let mut trace = MemoryTrace::builder()
            .call("glBindTexture", &["GL_TEXTURE_2D", "1"])
            .keyframe(&snap)
            .unwrap()
            .frames(2, 3)
            .build();
        // the reader position does not matter
        trace.seek_to_frame(1).unwrap();
        let found = read_keyframe_snapshot(&mut trace).unwrap().unwrap();
        assert_eq!(found, snap);
    }

    #[test]
    fn untrimmed_trace_has_no_keyframe() {
        let mut trace = MemoryTrace::builder().frames(2, 3).build();
        assert!(read_keyframe_snapshot(&mut trace).unwrap().is_none());
    }

    #[test]
    fn snapshot_after_draw_is_not_a_keyframe() {
        let mut trace = MemoryTrace::builder().draw().keyframe(&keyframe()).unwrap().build();
        assert!(read_keyframe_snapshot(&mut trace).unwrap().is_none());
    }

    #[test]
    fn snapshot_after_make_current_is_not_a_keyframe() {
        let mut trace = MemoryTrace::builder()
            .call("glXMakeCurrent", &["0x1", "0x2", "0x3"])
            .keyframe(&keyframe())
            .unwrap()
            .build();
        assert!(read_keyframe_snapshot(&mut trace).unwrap().is_none());
    }

    #[test]
    fn empty_trace_has_no_keyframe() {
        let mut trace = MemoryTrace::builder().build();
        assert!(read_keyframe_snapshot(&mut trace).unwrap().is_none());
    }

    #[test]
    fn pointer_size_must_match_trace() {
        let mut trace = MemoryTrace::builder()
            .pointer_size(4)
            .keyframe(&keyframe())
            .unwrap()
            .build();
        let err = read_keyframe_snapshot(&mut trace).unwrap_err();
        assert!(matches!(err, TraceError::Snapshot(_)));
    }
}
