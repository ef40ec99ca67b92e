//! GL object state captured in a snapshot.
//!
//! [`StateObject`] is a closed sum over the object categories the editor
//! knows how to display and edit. Consumers match on it exhaustively.

use serde::{Deserialize, Serialize};
use tracedit_types::BlobId;

/// The category of a captured GL object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectCategory {
    Texture,
    Buffer,
    Program,
    Shader,
    Framebuffer,
}

impl std::fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Texture => write!(f, "texture"),
            Self::Buffer => write!(f, "buffer"),
            Self::Program => write!(f, "program"),
            Self::Shader => write!(f, "shader"),
            Self::Framebuffer => write!(f, "framebuffer"),
        }
    }
}

/// Bulk data attached to an object (texels, buffer contents).
///
/// In memory a payload is always [`Payload::Inline`]. Encoded documents
/// carry [`Payload::Blob`] references into a blob store instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Inline(Vec<u8>),
    Blob(BlobId),
}

impl Payload {
    /// The inline bytes, or `None` if the payload is still a blob reference.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Inline(data) => Some(data),
            Self::Blob(_) => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::Inline(Vec::new())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::Inline(data)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureState {
    pub handle: u32,
    /// Bind target, e.g. `GL_TEXTURE_2D`.
    pub target: String,
    pub internal_format: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub levels: u32,
    pub pixels: Payload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferState {
    pub handle: u32,
    pub target: String,
    pub usage: String,
    pub contents: Payload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramState {
    pub handle: u32,
    pub attached_shaders: Vec<u32>,
    pub link_status: bool,
    pub info_log: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderState {
    pub handle: u32,
    /// Shader stage, e.g. `GL_FRAGMENT_SHADER`.
    pub shader_type: String,
    pub source: String,
    pub compile_status: bool,
}

/// One framebuffer attachment point and the object bound to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment point, e.g. `GL_COLOR_ATTACHMENT0`.
    pub point: String,
    pub object: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferState {
    pub handle: u32,
    pub attachments: Vec<Attachment>,
}

/// A captured GL object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateObject {
    Texture(TextureState),
    Buffer(BufferState),
    Program(ProgramState),
    Shader(ShaderState),
    Framebuffer(FramebufferState),
}

impl StateObject {
    pub fn category(&self) -> ObjectCategory {
        match self {
            Self::Texture(_) => ObjectCategory::Texture,
            Self::Buffer(_) => ObjectCategory::Buffer,
            Self::Program(_) => ObjectCategory::Program,
            Self::Shader(_) => ObjectCategory::Shader,
            Self::Framebuffer(_) => ObjectCategory::Framebuffer,
        }
    }

    /// The GL name of the object within its category.
    pub fn handle(&self) -> u32 {
        match self {
            Self::Texture(t) => t.handle,
            Self::Buffer(b) => b.handle,
            Self::Program(p) => p.handle,
            Self::Shader(s) => s.handle,
            Self::Framebuffer(f) => f.handle,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Texture(t) => Some(&t.pixels),
            Self::Buffer(b) => Some(&b.contents),
            Self::Program(_) | Self::Shader(_) | Self::Framebuffer(_) => None,
        }
    }

    pub fn payload_mut(&mut self) -> Option<&mut Payload> {
        match self {
            Self::Texture(t) => Some(&mut t.pixels),
            Self::Buffer(b) => Some(&mut b.contents),
            Self::Program(_) | Self::Shader(_) | Self::Framebuffer(_) => None,
        }
    }

    /// One-line description for listings, e.g. `shader 3`.
    pub fn summary(&self) -> String {
        format!("{} {}", self.category(), self.handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture() -> StateObject {
        StateObject::Texture(TextureState {
            handle: 7,
            target: "GL_TEXTURE_2D".into(),
            internal_format: "GL_RGBA8".into(),
            width: 2,
            height: 1,
            depth: 1,
            levels: 1,
            pixels: vec![0xff; 8].into(),
        })
    }

    #[test]
    fn category_and_handle() {
        let tex = texture();
        assert_eq!(tex.category(), ObjectCategory::Texture);
        assert_eq!(tex.handle(), 7);
        assert_eq!(tex.summary(), "texture 7");
    }

    #[test]
    fn only_textures_and_buffers_carry_payloads() {
        assert!(texture().payload().is_some());
        let shader = StateObject::Shader(ShaderState {
            handle: 1,
            shader_type: "GL_VERTEX_SHADER".into(),
            source: "void main() {}".into(),
            compile_status: true,
        });
        assert!(shader.payload().is_none());
    }

    #[test]
    fn payload_bytes_only_when_inline() {
        assert_eq!(Payload::Inline(vec![1, 2]).bytes(), Some(&[1u8, 2][..]));
        let blob = Payload::Blob(BlobId::new("abc").unwrap());
        assert!(blob.bytes().is_none());
        assert!(!blob.is_inline());
    }

    #[test]
    fn category_display() {
        assert_eq!(ObjectCategory::Framebuffer.to_string(), "framebuffer");
        assert_eq!(format!("{}", ObjectCategory::Buffer), "buffer");
    }
}
