//! Reconstructed GPU state snapshots.
//!
//! A [`StateSnapshot`] is a point-in-time capture of the state of every GL
//! context in a trace: per-context tables of textures, buffers, programs,
//! shaders and framebuffers. Snapshots are produced by replay, read from
//! trimmed traces, edited by the user, and persisted in session files.
//!
//! Large payloads ([`Payload`]) are kept inline in memory and moved into a
//! [`BlobStore`](tracedit_store::BlobStore) when a snapshot is written as a
//! JSON document or in binary form.

pub mod codec;
pub mod error;
pub mod object;
pub mod snapshot;

pub use error::{StateError, StateResult};
pub use object::{
    Attachment, BufferState, FramebufferState, ObjectCategory, Payload, ProgramState,
    ShaderState, StateObject, TextureState,
};
pub use snapshot::{ContextSnapshot, StateSnapshot};
