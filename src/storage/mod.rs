//! Storage layer: node allocation.
//!
//! Nodes live in a slot arena addressed by [`NodeId`](crate::types::NodeId).
//! Released slots are tracked in a free list and reused by later splits.

mod arena;
mod freelist;

pub use arena::NodeArena;
pub use freelist::FreeList;
