//! In-memory trace reader.
//!
//! [`MemoryTrace`] holds a decoded packet stream. It is built either
//! programmatically through [`MemoryTraceBuilder`] or from a JSON trace
//! description on disk ([`MemoryTrace::open_json`]):
//!
//! ```json
//! { "sof": { "version": 1, "uuid": [1, 2, 3, 4], "pointer_size": 8 },
//!   "packets": [ { "Call": { "call_index": 0, "entrypoint": "glClear" } } ] }
//! ```
//!
//! Blobs referenced by the description live in a loose-file directory named
//! `<trace file stem>-blobs` next to the trace file, or in the directory named
//! by the optional `blob_dir` field (relative to the trace file).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracedit_state::StateSnapshot;
use tracedit_store::{BlobStore, InMemoryBlobStore, LooseFileBlobStore, StoreMode};
use tracing::debug;

use crate::classify::classify;
use crate::error::{TraceError, TraceResult};
use crate::packet::{CallPacket, SofPacket, TracePacket, TRACE_FORMAT_VERSION};
use crate::reader::TraceReader;

/// Suffix of the default blob directory of a JSON trace.
pub const BLOB_DIR_SUFFIX: &str = "-blobs";

#[derive(Debug, Serialize, Deserialize)]
struct TraceFile {
    sof: SofPacket,
    #[serde(default)]
    packets: Vec<TracePacket>,
    #[serde(default)]
    blob_dir: Option<String>,
}

/// A trace held entirely in memory.
pub struct MemoryTrace {
    sof: SofPacket,
    packets: Vec<TracePacket>,
    /// Packet position of the first packet of every frame.
    frame_starts: Vec<usize>,
    position: usize,
    /// Packet position at which reading fails, for exercising error paths.
    fail_at: Option<usize>,
    blobs: Box<dyn BlobStore>,
}

impl MemoryTrace {
    pub fn builder() -> MemoryTraceBuilder {
        MemoryTraceBuilder::new()
    }

    pub fn new(sof: SofPacket, packets: Vec<TracePacket>, blobs: Box<dyn BlobStore>) -> Self {
        let frame_starts = frame_starts(&packets);
        Self {
            sof,
            packets,
            frame_starts,
            position: 0,
            fail_at: None,
            blobs,
        }
    }

    /// Open a JSON trace description.
    pub fn open_json(path: &Path) -> TraceResult<Self> {
        let bytes = fs::read(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: TraceFile = serde_json::from_slice(&bytes)?;
        if file.sof.version != TRACE_FORMAT_VERSION {
            return Err(TraceError::UnsupportedVersion(file.sof.version));
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let blob_dir = match &file.blob_dir {
            Some(rel) => dir.join(rel),
            None => {
                let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                dir.join(format!("{stem}{BLOB_DIR_SUFFIX}"))
            }
        };
        let blobs: Box<dyn BlobStore> = if blob_dir.is_dir() {
            Box::new(LooseFileBlobStore::open(&blob_dir, StoreMode::ReadOnly)?)
        } else {
            Box::new(InMemoryBlobStore::new())
        };

        debug!(
            path = %path.display(),
            packets = file.packets.len(),
            blob_dir = %blob_dir.display(),
            "opened JSON trace"
        );
        Ok(Self::new(file.sof, file.packets, blobs))
    }

    /// Write this trace as a JSON description, with its blobs copied into a
    /// loose-file directory next to it.
    pub fn write_json(&self, path: &Path, blob_ids: &[tracedit_types::BlobId]) -> TraceResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        let blob_dir = dir.join(format!("{stem}{BLOB_DIR_SUFFIX}"));
        if !blob_ids.is_empty() {
            let out = LooseFileBlobStore::open(&blob_dir, StoreMode::ReadWrite)?;
            for id in blob_ids {
                out.put(id, &self.blobs.get_required(id)?)?;
            }
        }
        let file = TraceFile {
            sof: self.sof.clone(),
            packets: self.packets.clone(),
            blob_dir: None,
        };
        let json = serde_json::to_vec_pretty(&file)?;
        fs::write(path, json).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn packets(&self) -> &[TracePacket] {
        &self.packets
    }

    pub fn call_count(&self) -> usize {
        self.packets.iter().filter(|p| p.as_call().is_some()).count()
    }
}

fn frame_starts(packets: &[TracePacket]) -> Vec<usize> {
    let mut starts = vec![0];
    for (pos, packet) in packets.iter().enumerate() {
        let ends_frame = packet
            .as_call()
            .is_some_and(|c| classify(&c.entrypoint).ends_frame());
        if ends_frame && pos + 1 < packets.len() {
            starts.push(pos + 1);
        }
    }
    starts
}

impl TraceReader for MemoryTrace {
    fn sof_packet(&self) -> &SofPacket {
        &self.sof
    }

    fn read_next_packet(&mut self) -> TraceResult<Option<TracePacket>> {
        if self.fail_at == Some(self.position) {
            return Err(TraceError::Corrupt {
                position: self.position,
                reason: "truncated packet".into(),
            });
        }
        let packet = self.packets.get(self.position).cloned();
        if packet.is_some() {
            self.position += 1;
        }
        Ok(packet)
    }

    fn seek_to_frame(&mut self, frame: u64) -> TraceResult<()> {
        let start = usize::try_from(frame)
            .ok()
            .and_then(|f| self.frame_starts.get(f))
            .copied()
            .ok_or(TraceError::FrameOutOfRange {
                requested: frame,
                max: self.max_frame_index(),
            })?;
        self.position = start;
        Ok(())
    }

    fn max_frame_index(&self) -> u64 {
        self.frame_starts.len().saturating_sub(1) as u64
    }

    fn blob_store(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }
}

impl std::fmt::Debug for MemoryTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTrace")
            .field("uuid", &self.sof.uuid)
            .field("packets", &self.packets.len())
            .field("frames", &self.frame_starts.len())
            .field("position", &self.position)
            .finish()
    }
}

/// Builder for [`MemoryTrace`].
///
/// Calls get consecutive indices starting at 0 unless placed explicitly with
/// [`call_at`](Self::call_at). Every call is stamped with a synthetic
/// 1 µs-per-call timeline.
pub struct MemoryTraceBuilder {
    sof: SofPacket,
    packets: Vec<TracePacket>,
    next_index: u64,
    context: u64,
    fail_at: Option<usize>,
    blobs: Box<dyn BlobStore>,
}

impl MemoryTraceBuilder {
    pub fn new() -> Self {
        Self {
            sof: SofPacket::default(),
            packets: Vec::new(),
            next_index: 0,
            context: 1,
            fail_at: None,
            blobs: Box::new(InMemoryBlobStore::new()),
        }
    }

    pub fn sof(mut self, sof: SofPacket) -> Self {
        self.sof = sof;
        self
    }

    pub fn uuid(mut self, uuid: tracedit_types::TraceUuid) -> Self {
        self.sof.uuid = uuid;
        self
    }

    pub fn pointer_size(mut self, pointer_size: u8) -> Self {
        self.sof.pointer_size = pointer_size;
        self
    }

    /// Context handle stamped on subsequent calls.
    pub fn context(mut self, context: u64) -> Self {
        self.context = context;
        self
    }

    pub fn blob_store(mut self, blobs: Box<dyn BlobStore>) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn call(self, entrypoint: &str, params: &[&str]) -> Self {
        let index = self.next_index;
        self.call_at(index, entrypoint, params)
    }

    pub fn call_at(mut self, call_index: u64, entrypoint: &str, params: &[&str]) -> Self {
        let mut call = CallPacket::new(call_index, entrypoint);
        call.params = params.iter().map(|p| p.to_string()).collect();
        call.begin_ns = call_index * 1_000;
        call.end_ns = call.begin_ns + 500;
        call.context = self.context;
        self.packets.push(TracePacket::Call(call));
        self.next_index = call_index + 1;
        self
    }

    /// A draw call.
    pub fn draw(self) -> Self {
        self.call("glDrawArrays", &["GL_TRIANGLES", "0", "3"])
    }

    /// A swap-buffers call, ending the current frame.
    pub fn swap(self) -> Self {
        self.call("glXSwapBuffers", &["0x1"])
    }

    /// `n` frames of `calls_per_frame` calls each, the last call of every
    /// frame being a swap.
    pub fn frames(mut self, n: usize, calls_per_frame: usize) -> Self {
        for _ in 0..n {
            for i in 0..calls_per_frame.saturating_sub(1) {
                self = if i % 2 == 1 {
                    self.draw()
                } else {
                    self.call("glBindTexture", &["GL_TEXTURE_2D", "1"])
                };
            }
            self = self.swap();
        }
        self
    }

    /// Embed `snapshot` as a binary state-snapshot packet.
    pub fn keyframe(mut self, snapshot: &StateSnapshot) -> TraceResult<Self> {
        let bytes = snapshot.to_binary(self.blobs.as_ref())?;
        let binary_id = self.blobs.put_content(&bytes)?;
        self.packets.push(TracePacket::StateSnapshot { binary_id });
        Ok(self)
    }

    /// Make reading fail when the reader reaches packet `position`.
    pub fn fail_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }

    pub fn build(self) -> MemoryTrace {
        let mut trace = MemoryTrace::new(self.sof, self.packets, self.blobs);
        trace.fail_at = self.fail_at;
        trace
    }
}

impl Default for MemoryTraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
