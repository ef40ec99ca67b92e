use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracedit_types::SnapshotUuid;

use crate::error::{StateError, StateResult};
use crate::object::{ObjectCategory, StateObject};

/// Captured state of one GL context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Trace-side handle of the context.
    pub handle: u64,
    /// Context this one shares its object namespace with, if any.
    pub share_context: Option<u64>,
    pub objects: Vec<StateObject>,
}

impl ContextSnapshot {
    pub fn new(handle: u64) -> Self {
        Self {
            handle,
            share_context: None,
            objects: Vec::new(),
        }
    }

    /// Builder-style helper to set the shared context.
    pub fn sharing(mut self, share_context: u64) -> Self {
        self.share_context = Some(share_context);
        self
    }

    /// Builder-style helper to add an object.
    pub fn with_object(mut self, object: StateObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn object(&self, category: ObjectCategory, handle: u32) -> Option<&StateObject> {
        self.objects
            .iter()
            .find(|o| o.category() == category && o.handle() == handle)
    }

    pub fn object_mut(&mut self, category: ObjectCategory, handle: u32) -> Option<&mut StateObject> {
        self.objects
            .iter_mut()
            .find(|o| o.category() == category && o.handle() == handle)
    }

    pub fn objects_of(&self, category: ObjectCategory) -> impl Iterator<Item = &StateObject> {
        self.objects.iter().filter(move |o| o.category() == category)
    }
}

/// A reconstructed point-in-time capture of GPU state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub uuid: SnapshotUuid,
    /// Pointer size (bytes) of the traced process.
    pub pointer_size: u8,
    /// Handle of the context current on the traced thread, if any.
    pub current_context: Option<u64>,
    pub contexts: Vec<ContextSnapshot>,
}

impl StateSnapshot {
    /// An empty snapshot with a fresh identity.
    pub fn new(pointer_size: u8) -> Self {
        Self {
            uuid: SnapshotUuid::new(),
            pointer_size,
            current_context: None,
            contexts: Vec::new(),
        }
    }

    /// Builder-style helper to add a context.
    pub fn with_context(mut self, context: ContextSnapshot) -> Self {
        self.contexts.push(context);
        self
    }

    /// Builder-style helper to mark a context current.
    pub fn with_current_context(mut self, handle: u64) -> Self {
        self.current_context = Some(handle);
        self
    }

    pub fn context(&self, handle: u64) -> Option<&ContextSnapshot> {
        self.contexts.iter().find(|c| c.handle == handle)
    }

    pub fn context_mut(&mut self, handle: u64) -> Option<&mut ContextSnapshot> {
        self.contexts.iter_mut().find(|c| c.handle == handle)
    }

    pub fn object_count(&self) -> usize {
        self.contexts.iter().map(|c| c.objects.len()).sum()
    }

    /// The context followed by every context it transitively shares with.
    ///
    /// Shared objects live in the last context of the chain, so viewers that
    /// list objects for a context need the whole chain. Stops at a missing
    /// context or a repeated handle.
    pub fn sharing_chain(&self, handle: u64) -> Vec<&ContextSnapshot> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(handle);
        while let Some(h) = next {
            if !seen.insert(h) {
                break;
            }
            let Some(ctx) = self.context(h) else { break };
            chain.push(ctx);
            next = ctx.share_context;
        }
        chain
    }

    /// Check that the snapshot is well-formed.
    ///
    /// - context handles are unique
    /// - the current context and every shared context exist
    /// - sharing never forms a cycle
    /// - object handles are unique per category within a context
    /// - every payload is inline
    pub fn validate(&self) -> StateResult<()> {
        let malformed = |reason: String| StateError::Malformed {
            uuid: self.uuid,
            reason,
        };

        let mut handles = HashSet::new();
        for ctx in &self.contexts {
            if !handles.insert(ctx.handle) {
                return Err(malformed(format!("duplicate context {:#x}", ctx.handle)));
            }
        }

        if let Some(current) = self.current_context {
            if !handles.contains(&current) {
                return Err(malformed(format!("current context {current:#x} is not captured")));
            }
        }

        for ctx in &self.contexts {
            if let Some(shared) = ctx.share_context {
                if !handles.contains(&shared) {
                    return Err(malformed(format!(
                        "context {:#x} shares with missing context {shared:#x}",
                        ctx.handle
                    )));
                }
            }
            let chain = self.sharing_chain(ctx.handle);
            if chain.last().and_then(|c| c.share_context).is_some() {
                return Err(malformed(format!("context {:#x} has a sharing cycle", ctx.handle)));
            }

            let mut objects = HashSet::new();
            for object in &ctx.objects {
                if !objects.insert((object.category(), object.handle())) {
                    return Err(malformed(format!(
                        "duplicate {} in context {:#x}",
                        object.summary(),
                        ctx.handle
                    )));
                }
                if object.payload().is_some_and(|p| !p.is_inline()) {
                    return Err(malformed(format!("unresolved payload on {}", object.summary())));
                }
            }
        }

        Ok(())
    }

    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }
}
