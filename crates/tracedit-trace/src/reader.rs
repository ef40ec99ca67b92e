use tracedit_store::BlobStore;

use crate::error::TraceResult;
use crate::packet::{SofPacket, TracePacket};

/// Sequential access to the packets of an open trace.
///
/// Readers are positioned: `read_next_packet` returns the packet after the
/// last one read, and `seek_to_frame` moves to the first packet of a frame.
pub trait TraceReader {
    /// The start-of-file packet.
    fn sof_packet(&self) -> &SofPacket;

    /// Read the next packet, or `Ok(None)` at end of trace.
    fn read_next_packet(&mut self) -> TraceResult<Option<TracePacket>>;

    /// Position the reader on the first packet of `frame`.
    fn seek_to_frame(&mut self, frame: u64) -> TraceResult<()>;

    /// Index of the last frame in the trace.
    fn max_frame_index(&self) -> u64;

    /// Store holding the blobs referenced by the trace (embedded snapshots
    /// and their payloads).
    fn blob_store(&self) -> &dyn BlobStore;
}
