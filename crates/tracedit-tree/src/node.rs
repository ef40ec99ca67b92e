//! Call tree node types.
//!
//! A tree has one root whose children are frames; the children of a frame
//! are the calls recorded between two swap-buffers calls (the swap itself
//! included). Nodes are stored in an arena owned by
//! [`CallTree`](crate::CallTree) and addressed by [`NodeId`].

use std::fmt;

use tracedit_trace::{classify, CallPacket, EntrypointClass};

use crate::container::SnapshotContainer;

/// Address of a node in a specific [`CallTree`](crate::CallTree).
///
/// Carries the identity of the tree that issued it, so ids from a closed or
/// different tree are rejected instead of silently aliasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) tree: u64,
    pub(crate) index: usize,
}

impl NodeId {
    /// Position in execution order; the root is 0.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tree, self.index)
    }
}

/// One recorded API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiCall {
    pub call_index: u64,
    pub entrypoint: String,
    /// Rendered call text, e.g. `glDrawArrays(GL_TRIANGLES, 0, 3)`.
    pub text: String,
    pub class: EntrypointClass,
    pub begin_ns: u64,
    pub end_ns: u64,
    pub context: u64,
    pub backtrace_index: Option<u32>,
}

impl ApiCall {
    pub fn is_draw(&self) -> bool {
        self.class.is_draw()
    }

    pub fn ends_frame(&self) -> bool {
        self.class.ends_frame()
    }
}

impl From<CallPacket> for ApiCall {
    fn from(packet: CallPacket) -> Self {
        Self {
            text: packet.render(),
            class: classify(&packet.entrypoint),
            call_index: packet.call_index,
            entrypoint: packet.entrypoint,
            begin_ns: packet.begin_ns,
            end_ns: packet.end_ns,
            context: packet.context,
            backtrace_index: packet.backtrace_index,
        }
    }
}

/// A frame: the calls up to and including a swap-buffers call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameItem {
    pub frame_number: u64,
    pub first_call_index: u64,
    pub last_call_index: u64,
}

impl FrameItem {
    pub fn text(&self) -> String {
        format!("Frame {}", self.frame_number)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Frame(FrameItem),
    Call(ApiCall),
}

/// A node of the call tree.
#[derive(Clone, Debug)]
pub struct CallNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub(crate) container: Option<SnapshotContainer>,
}

impl CallNode {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            container: None,
        }
    }

    pub fn as_call(&self) -> Option<&ApiCall> {
        match &self.kind {
            NodeKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&FrameItem> {
        match &self.kind {
            NodeKind::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, NodeKind::Call(_))
    }

    pub fn is_draw(&self) -> bool {
        self.as_call().is_some_and(ApiCall::is_draw)
    }

    pub fn container(&self) -> Option<&SnapshotContainer> {
        self.container.as_ref()
    }

    /// Text shown for the node in the call list and matched by search.
    pub fn text(&self) -> String {
        match &self.kind {
            NodeKind::Root => String::new(),
            NodeKind::Frame(frame) => frame.text(),
            NodeKind::Call(call) => call.text.clone(),
        }
    }

    /// Short description for logs and listings, e.g. `call 42` or `frame 3`.
    pub fn summary(&self) -> String {
        match &self.kind {
            NodeKind::Root => "root".to_string(),
            NodeKind::Frame(frame) => format!("frame {}", frame.frame_number),
            NodeKind::Call(call) => format!("call {}", call.call_index),
        }
    }
}
