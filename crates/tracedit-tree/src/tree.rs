//! The call tree arena.
//!
//! [`CallTree`] stores nodes in a `Vec` in execution (pre-order) order and
//! keeps two exact-lookup indexes: call index to call node and frame number
//! to frame node. The root is always at arena position 0.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::container::SnapshotContainer;
use crate::error::{ParseError, TreeError, TreeResult};
use crate::node::{ApiCall, CallNode, FrameItem, NodeId, NodeKind};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Frames and calls of one trace, in execution order.
#[derive(Debug)]
pub struct CallTree {
    id: u64,
    nodes: Vec<CallNode>,
    by_call_index: HashMap<u64, NodeId>,
    by_frame: HashMap<u64, NodeId>,
    last_frame: Option<NodeId>,
    last_call_index: Option<u64>,
}

impl CallTree {
    /// An empty tree holding only the root.
    pub fn new() -> Self {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            nodes: vec![CallNode::new(NodeKind::Root, None)],
            by_call_index: HashMap::new(),
            by_frame: HashMap::new(),
            last_frame: None,
            last_call_index: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.id_at(0)
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no frames or calls.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn call_count(&self) -> usize {
        self.by_call_index.len()
    }

    pub fn frame_count(&self) -> usize {
        self.by_frame.len()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Append a frame under the root.
    pub(crate) fn push_frame(&mut self, frame_number: u64, first_call_index: u64) -> NodeId {
        let root = self.root();
        let id = self.push_node(
            NodeKind::Frame(FrameItem {
                frame_number,
                first_call_index,
                last_call_index: first_call_index,
            }),
            root,
        );
        self.by_frame.insert(frame_number, id);
        self.last_frame = Some(id);
        debug!(frame = frame_number, first_call = first_call_index, "added frame node");
        id
    }

    /// Append a call as the last child of `frame`.
    ///
    /// The frame must be the most recently pushed frame, and the call index
    /// must exceed every call index already in the tree.
    pub(crate) fn push_call(&mut self, frame: NodeId, call: ApiCall) -> Result<NodeId, ParseError> {
        if self.last_frame != Some(frame) {
            return Err(ParseError::CallOutsideOpenFrame {
                call_index: call.call_index,
            });
        }
        if let Some(previous) = self.last_call_index {
            if call.call_index <= previous {
                return Err(ParseError::NonMonotonicCallIndex {
                    previous,
                    found: call.call_index,
                });
            }
        }
        let call_index = call.call_index;
        self.last_call_index = Some(call_index);
        if let NodeKind::Frame(item) = &mut self.nodes[frame.index].kind {
            item.last_call_index = call_index;
        }
        let id = self.push_node(NodeKind::Call(call), frame);
        self.by_call_index.insert(call_index, id);
        Ok(id)
    }

    fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = self.id_at(self.nodes.len());
        self.nodes.push(CallNode::new(kind, Some(parent)));
        self.nodes[parent.index].children.push(id);
        id
    }

    // -----------------------------------------------------------------------
    // Node access
    // -----------------------------------------------------------------------

    pub(crate) fn id_at(&self, index: usize) -> NodeId {
        NodeId { tree: self.id, index }
    }

    /// Arena position of `id`, or an error if `id` is not from this tree.
    pub fn check(&self, id: NodeId) -> TreeResult<usize> {
        if id.tree != self.id || id.index >= self.nodes.len() {
            return Err(TreeError::InvalidNodeReference(id));
        }
        Ok(id.index)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.check(id).is_ok()
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&CallNode> {
        let index = self.check(id)?;
        Ok(&self.nodes[index])
    }

    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    pub fn text(&self, id: NodeId) -> TreeResult<String> {
        Ok(self.node(id)?.text())
    }

    /// All frames and calls in execution order (the root excluded).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CallNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, node)| (self.id_at(index), node))
    }

    /// Every call in execution order.
    pub fn calls(&self) -> impl Iterator<Item = (NodeId, &ApiCall)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.as_call().map(|call| (id, call)))
    }

    /// The frame a node belongs to (the node itself for frames).
    pub fn frame_of(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        let node = self.node(id)?;
        Ok(match node.kind {
            NodeKind::Root => None,
            NodeKind::Frame(_) => Some(id),
            NodeKind::Call(_) => node.parent,
        })
    }

    // -----------------------------------------------------------------------
    // Exact lookup
    // -----------------------------------------------------------------------

    pub fn find_by_call_index(&self, call_index: u64) -> Option<NodeId> {
        self.by_call_index.get(&call_index).copied()
    }

    pub fn find_by_frame_number(&self, frame_number: u64) -> Option<NodeId> {
        self.by_frame.get(&frame_number).copied()
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    pub fn container(&self, id: NodeId) -> TreeResult<Option<&SnapshotContainer>> {
        Ok(self.node(id)?.container.as_ref())
    }

    pub fn container_mut(&mut self, id: NodeId) -> TreeResult<Option<&mut SnapshotContainer>> {
        let index = self.check(id)?;
        Ok(self.nodes[index].container.as_mut())
    }

    /// The node's container, creating an empty one if it has none.
    pub fn ensure_container(&mut self, id: NodeId) -> TreeResult<&mut SnapshotContainer> {
        let index = self.check(id)?;
        Ok(self.nodes[index].container.get_or_insert_with(SnapshotContainer::new))
    }

    /// Replace the node's container, returning the previous one.
    pub fn set_container(
        &mut self,
        id: NodeId,
        container: SnapshotContainer,
    ) -> TreeResult<Option<SnapshotContainer>> {
        let index = self.check(id)?;
        Ok(self.nodes[index].container.replace(container))
    }

    pub fn take_container(&mut self, id: NodeId) -> TreeResult<Option<SnapshotContainer>> {
        let index = self.check(id)?;
        Ok(self.nodes[index].container.take())
    }

    /// Nodes owning a container, in execution order.
    pub fn containers(&self) -> impl Iterator<Item = (NodeId, &SnapshotContainer)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.container.as_ref().map(|c| (id, c)))
    }

    /// Mutable access to every container, in execution order.
    pub fn containers_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut SnapshotContainer)> + '_ {
        let tree = self.id;
        self.nodes
            .iter_mut()
            .enumerate()
            .skip(1)
            .filter_map(move |(index, node)| {
                node.container.as_mut().map(|c| (NodeId { tree, index }, c))
            })
    }
}

impl Default for CallTree {
    fn default() -> Self {
        Self::new()
    }
}
