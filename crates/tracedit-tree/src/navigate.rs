//! Navigation and text search over a [`CallTree`].
//!
//! All queries walk execution order. A `from` of `None` starts at the first
//! node (forward) or the last node (backward) and considers it; a node id
//! starts strictly after (or before) that node.

use serde::{Deserialize, Serialize};

use crate::error::TreeResult;
use crate::node::{CallNode, NodeId};
use crate::tree::CallTree;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Options for [`CallTree::search`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Continue from the other end of the tree when nothing is found.
    pub wrap: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            wrap: false,
        }
    }
}

impl CallTree {
    // -----------------------------------------------------------------------
    // Snapshots and draw calls
    // -----------------------------------------------------------------------

    /// Next node owning a container, valid or not.
    pub fn find_next_with_snapshot(&self, from: Option<NodeId>) -> TreeResult<Option<NodeId>> {
        self.scan(from, Direction::Forward, false, |n| n.container().is_some())
    }

    /// Previous node owning a container, valid or not.
    pub fn find_prev_with_snapshot(&self, from: Option<NodeId>) -> TreeResult<Option<NodeId>> {
        self.scan(from, Direction::Backward, false, |n| n.container().is_some())
    }

    pub fn find_next_drawcall(&self, from: Option<NodeId>) -> TreeResult<Option<NodeId>> {
        self.scan(from, Direction::Forward, false, CallNode::is_draw)
    }

    pub fn find_prev_drawcall(&self, from: Option<NodeId>) -> TreeResult<Option<NodeId>> {
        self.scan(from, Direction::Backward, false, CallNode::is_draw)
    }

    // -----------------------------------------------------------------------
    // Text search
    // -----------------------------------------------------------------------

    /// Find the next node whose text contains `needle`.
    ///
    /// With `options.wrap` the search continues from the other end and only
    /// returns `from` itself when no other node matches. An empty needle
    /// matches nothing.
    pub fn search(
        &self,
        from: Option<NodeId>,
        needle: &str,
        direction: Direction,
        options: &SearchOptions,
    ) -> TreeResult<Option<NodeId>> {
        if needle.is_empty() {
            if let Some(from) = from {
                self.check(from)?;
            }
            return Ok(None);
        }
        let needle = if options.case_sensitive {
            needle.to_string()
        } else {
            needle.to_lowercase()
        };
        let case_sensitive = options.case_sensitive;
        self.scan(from, direction, options.wrap, |node| {
            let text = node.text();
            if case_sensitive {
                text.contains(&needle)
            } else {
                text.to_lowercase().contains(&needle)
            }
        })
    }

    /// Walk execution order from `from` and return the first node matching
    /// `pred`. The root never matches.
    fn scan<F>(
        &self,
        from: Option<NodeId>,
        direction: Direction,
        wrap: bool,
        pred: F,
    ) -> TreeResult<Option<NodeId>>
    where
        F: Fn(&CallNode) -> bool,
    {
        let start = match from {
            Some(id) => Some(self.check(id)?),
            None => None,
        };
        let len = self.len();
        let first = 1;

        // Primary range, then the wrapped-around range (empty unless `wrap`).
        let (primary, wrapped) = match (direction, start) {
            (Direction::Forward, None) => (first..len, 0..0),
            (Direction::Backward, None) => (first..len, 0..0),
            (Direction::Forward, Some(s)) => {
                let head = if wrap { first..s + 1 } else { 0..0 };
                ((s + 1).max(first)..len, head)
            }
            (Direction::Backward, Some(s)) => {
                let tail = if wrap { s.max(first)..len } else { 0..0 };
                (first..s.max(first), tail)
            }
        };
        let matches = |index: &usize| self.node(self.id_at(*index)).is_ok_and(&pred);

        let found = match direction {
            Direction::Forward => primary.chain(wrapped).find(matches),
            Direction::Backward => primary.rev().chain(wrapped.rev()).find(matches),
        };
        Ok(found.map(|index| self.id_at(index)))
    }
}
