//! Free list management.
//!
//! Tracks released arena slots so that splits after merges reuse memory
//! instead of growing the arena.

use crate::types::NodeId;

/// Released node slots available for reuse
#[derive(Debug, Default)]
pub struct FreeList {
    /// Stack of free node IDs (most recently freed first)
    ids: Vec<NodeId>,
}

impl FreeList {
    /// Create a new empty free list
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Add a slot to the free list
    pub fn push(&mut self, id: NodeId) {
        debug_assert!(!self.ids.contains(&id), "slot {id} freed twice");
        self.ids.push(id);
    }

    /// Get a free slot, if available
    pub fn pop(&mut self) -> Option<NodeId> {
        self.ids.pop()
    }

    /// Get the number of free slots
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the free list is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget all free slots
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
