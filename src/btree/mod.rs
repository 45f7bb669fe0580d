//! B+tree implementation.
//!
//! This module provides an in-memory B+tree that supports:
//! - Point lookups (get)
//! - Insertions with upward splitting (insert)
//! - Deletions with borrow/merge rebalancing (delete)
//! - Range scans over the linked leaf chain

mod cursor;
mod stats;
mod tree;

pub(crate) use cursor::Cursor;
pub use cursor::Range;
pub use stats::TreeStats;
pub use tree::BPlusTree;
