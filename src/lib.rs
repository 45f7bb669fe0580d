//! # B+Tree Index
//!
//! An in-memory B+tree over `i64` keys, built for ordered lookups and range
//! scans with few node visits per operation.
//!
//! ## Architecture
//!
//! - **Node Layer** (`node`): leaf and internal node variants
//! - **Storage Layer** (`storage`): slot arena owning every node, with a free list
//! - **B-Tree Layer** (`btree`): insert/delete/get algorithms and leaf-chain cursor
//! - **Tree** (this module): thread-safe handle serializing access through a
//!   reader/writer lock
//!
//! Internal nodes cache the maximum key of each child subtree, and all
//! leaves are linked in key order so range scans never revisit the
//! internal levels.
//!
//! ## Usage
//!
//! ```rust
//! use bptree_index::Tree;
//!
//! let tree = Tree::new(4);
//!
//! // Insert or overwrite
//! tree.insert(7, "seven");
//!
//! // Point lookup
//! assert_eq!(tree.get(7), Some("seven"));
//!
//! // Inclusive range scan
//! for record in tree.range_scan(0, 10) {
//!     println!("{} -> {}", record.key, record.value);
//! }
//!
//! // Delete (missing keys are a no-op)
//! tree.delete(7);
//! ```

pub mod btree;
pub mod error;
pub mod node;
pub mod storage;
pub mod types;

pub use error::{IndexError, Result};
pub use types::{
    BTreeConfig, Key, NodeId, Record, DEFAULT_BRANCHING_FACTOR, MIN_BRANCHING_FACTOR,
};

// Re-export main public API
pub use btree::{BPlusTree, Range, TreeStats};

use btree::Cursor;
use node::Node;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Node type for visualization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Arena slot of the node
    pub node_id: u32,
    /// Whether this is a leaf node
    pub is_leaf: bool,
    /// Record keys (leaf) or cached child maxima (internal)
    pub keys: Vec<Key>,
    /// Next leaf in the chain (only for leaf nodes)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next: Option<u32>,
    /// Child nodes (only for internal nodes)
    pub children: Vec<TreeNode>,
}

/// Thread-safe B+tree handle
///
/// Reads take the lock in shared mode. `insert`, `delete` and `clear` hold
/// it exclusively for the whole operation, including every split, merge and
/// leaf-chain relink. Clones share the same underlying tree.
pub struct Tree<V> {
    inner: Arc<RwLock<BPlusTree<V>>>,
}

impl<V> Clone for Tree<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCHING_FACTOR)
    }
}

impl<V> Tree<V> {
    /// Create a tree with branching factor `M`.
    ///
    /// Values below 3 are clamped to 3. Use [`Tree::with_config`] to get an
    /// `InvalidConfiguration` error instead.
    pub fn new(branching_factor: usize) -> Self {
        Self::from_tree(BPlusTree::new(branching_factor))
    }

    /// Create a tree from a config, rejecting invalid branching factors
    pub fn with_config(config: BTreeConfig) -> Result<Self> {
        Ok(Self::from_tree(BPlusTree::with_config(config)?))
    }

    fn from_tree(tree: BPlusTree<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Get the current B-tree configuration
    pub fn config(&self) -> BTreeConfig {
        self.inner.read().config().clone()
    }

    /// Insert or overwrite a record, returning the previous value
    pub fn insert(&self, key: Key, value: V) -> Option<V> {
        let mut tree = self.inner.write();
        tree.insert(key, value)
    }

    /// Delete a key, returning the removed value
    ///
    /// Deleting a missing key changes nothing and returns `None`.
    pub fn delete(&self, key: Key) -> Option<V> {
        let mut tree = self.inner.write();
        tree.delete(key)
    }

    /// Remove every record
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Check if a key exists
    pub fn contains(&self, key: Key) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn height(&self) -> usize {
        self.inner.read().height()
    }

    /// Get statistics about the tree
    pub fn stats(&self) -> TreeStats {
        self.inner.read().stats()
    }

    /// Verify the structural invariants
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.read().check_invariants()
    }

    /// Debug trace a key lookup
    pub fn trace_get(&self, key: Key) -> Vec<String> {
        self.inner.read().trace_get(key)
    }

    /// Export the tree structure for visualization
    pub fn export_tree(&self) -> TreeNode {
        let tree = self.inner.read();
        export_node(&*tree, tree.root())
    }

    /// Export the tree structure as JSON
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_tree())?)
    }
}

impl<V: Clone> Tree<V> {
    /// Get a value by key
    ///
    /// Returns `None` if the key does not exist.
    pub fn get(&self, key: Key) -> Option<V> {
        let tree = self.inner.read();
        tree.get(key).cloned()
    }

    /// Get a value by key, failing with `NotFound` on a miss
    pub fn try_get(&self, key: Key) -> Result<V> {
        self.get(key).ok_or(IndexError::NotFound(key))
    }

    /// Scan records with `start <= key <= end` in ascending order
    ///
    /// The scan is lazy and holds no lock between calls to `next`. Records
    /// are fetched in batches of up to M under a short read lock, and each
    /// refill re-descends from the key after the last one yielded. Every
    /// batch is consistent, but writes that land between batches are seen
    /// by the rest of the scan. Calling `insert` or `delete` on the same
    /// tree while a scan is open is allowed.
    pub fn range_scan(&self, start: Key, end: Key) -> RangeScan<'_, V> {
        RangeScan {
            tree: self,
            buffer: VecDeque::new(),
            resume: (start <= end).then_some(start),
            end,
        }
    }

    /// Scan every record in ascending order
    pub fn iter(&self) -> RangeScan<'_, V> {
        self.range_scan(Key::MIN, Key::MAX)
    }
}

/// Lazy range scan that re-acquires the read lock per batch
pub struct RangeScan<'a, V> {
    tree: &'a Tree<V>,
    /// Records fetched but not yet yielded
    buffer: VecDeque<Record<V>>,
    /// Start key of the next batch, `None` once the range is exhausted
    resume: Option<Key>,
    /// Inclusive upper bound
    end: Key,
}

impl<'a, V: Clone> RangeScan<'a, V> {
    /// Fetch up to M records starting at `start` under one read lock
    fn refill(&mut self, start: Key) {
        let tree = self.tree.inner.read();
        let batch = tree.branching_factor();
        let mut cursor = Cursor::seek(&*tree, start, self.end);

        while self.buffer.len() < batch {
            match cursor.advance(&*tree) {
                Some(record) => self.buffer.push_back(record.clone()),
                None => {
                    self.resume = None;
                    return;
                }
            }
        }
        self.resume = self.buffer.back().and_then(|r| r.key.checked_add(1));
    }
}

impl<'a, V: Clone> Iterator for RangeScan<'a, V> {
    type Item = Record<V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            let start = self.resume?;
            self.refill(start);
        }
        self.buffer.pop_front()
    }
}

fn export_node<V>(tree: &BPlusTree<V>, id: NodeId) -> TreeNode {
    match tree.arena.node(id) {
        Node::Leaf(leaf) => TreeNode {
            node_id: id.value(),
            is_leaf: true,
            keys: leaf.records().iter().map(|r| r.key).collect(),
            next: leaf.next().map(NodeId::value),
            children: Vec::new(),
        },
        Node::Internal(internal) => TreeNode {
            node_id: id.value(),
            is_leaf: false,
            keys: internal.max_keys().to_vec(),
            next: None,
            children: internal
                .children()
                .iter()
                .map(|&child| export_node(tree, child))
                .collect(),
        },
    }
}
