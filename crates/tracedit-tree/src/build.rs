//! Building a [`CallTree`] from a trace.

use tracedit_trace::{TracePacket, TraceReader};
use tracing::{debug, info};

use crate::error::ParseError;
use crate::node::{ApiCall, NodeId};
use crate::tree::CallTree;

impl CallTree {
    /// Index every call of a trace.
    ///
    /// The reader is rewound to frame 0. A frame node is opened when the first
    /// call of a frame arrives and closed by a swap-buffers call, so a trace
    /// that does not end with a swap has an open last frame. State-snapshot
    /// packets are not indexed. On error no tree is produced.
    pub fn build(reader: &mut dyn TraceReader) -> Result<CallTree, ParseError> {
        reader.seek_to_frame(0)?;

        let mut tree = CallTree::new();
        let mut frame: Option<NodeId> = None;
        let mut frame_number = 0u64;
        let mut skipped = 0usize;

        while let Some(packet) = reader.read_next_packet()? {
            let call = match packet {
                TracePacket::Call(call) => ApiCall::from(call),
                TracePacket::StateSnapshot { .. } => {
                    skipped += 1;
                    continue;
                }
            };
            let current = match frame {
                Some(current) => current,
                None => {
                    let opened = tree.push_frame(frame_number, call.call_index);
                    frame = Some(opened);
                    opened
                }
            };
            let ends_frame = call.ends_frame();
            tree.push_call(current, call)?;
            if ends_frame {
                frame = None;
                frame_number += 1;
            }
        }

        debug!(snapshot_packets = skipped, "skipped state-snapshot packets");
        info!(
            calls = tree.call_count(),
            frames = tree.frame_count(),
            "indexed trace"
        );
        Ok(tree)
    }
}
