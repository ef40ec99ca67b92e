//! Indexed call tree for tracedit.
//!
//! [`CallTree`] is built once per opened trace. It arranges every recorded
//! API call under the frame it belongs to, indexes calls by call index and
//! frames by frame number, and answers navigation queries (next/previous
//! snapshot, next/previous draw call, text search) in execution order.
//!
//! Each node may own a [`SnapshotContainer`] holding the reconstructed GPU
//! state at that point together with its validity, edited and outdated
//! flags.
//!
//! # Invariants
//!
//! - Call indices strictly increase in execution order.
//! - Arena order is execution (pre-order) order.
//! - At most one container per node.

pub mod build;
pub mod container;
pub mod error;
pub mod navigate;
pub mod node;
pub mod tree;

pub use container::SnapshotContainer;
pub use error::{ParseError, TreeError, TreeResult};
pub use navigate::{Direction, SearchOptions};
pub use node::{ApiCall, CallNode, FrameItem, NodeId, NodeKind};
pub use tree::CallTree;
