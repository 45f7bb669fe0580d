//! B+tree core implementation.
//!
//! This module provides the unsynchronized `BPlusTree` with operations for:
//! - get: Point lookups
//! - insert: Insertions and overwrites
//! - delete: Removals with borrow/merge rebalancing
//! - range: Ordered scans over the leaf chain
//!
//! Internal nodes route by upper bound: each child slot caches the maximum
//! key of its subtree, and a lookup descends into the first child whose
//! maximum is >= the key (or the last child when the key is beyond them all).

use super::cursor::Range;
use super::stats::{Counters, TreeStats};
use crate::error::{IndexError, Result};
use crate::node::{InternalNode, LeafNode, Node};
use crate::storage::NodeArena;
use crate::types::{BTreeConfig, Key, NodeId};
use std::collections::HashSet;

/// One step of a root-to-leaf descent
#[derive(Debug, Clone, Copy)]
struct PathEntry {
    /// Internal node visited
    node: NodeId,
    /// Child slot taken from it
    index: usize,
}

/// An in-memory B+tree keyed by `i64`
#[derive(Debug)]
pub struct BPlusTree<V> {
    pub(crate) arena: NodeArena<V>,
    /// Root node; an empty tree has an empty leaf root
    root: NodeId,
    config: BTreeConfig,
    /// ceil(M/2)
    min_fill: usize,
    /// Number of levels, 1 for a leaf root
    height: usize,
    len: usize,
    counters: Counters,
}

impl<V> BPlusTree<V> {
    /// Create a tree, clamping the branching factor to the minimum of 3
    pub fn new(branching_factor: usize) -> Self {
        Self::from_config(BTreeConfig::new(branching_factor))
    }

    /// Create a tree from a config, rejecting a branching factor below 3
    pub fn with_config(config: BTreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: BTreeConfig) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::Leaf(LeafNode::new(config.branching_factor)));
        let min_fill = config.min_fill();
        tracing::debug!(
            branching_factor = config.branching_factor,
            min_fill,
            "created B+tree"
        );
        Self {
            arena,
            root,
            config,
            min_fill,
            height: 1,
            len: 0,
            counters: Counters::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the height of the tree
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn branching_factor(&self) -> usize {
        self.config.branching_factor
    }

    /// Minimum children/records for a non-root node
    pub fn min_fill(&self) -> usize {
        self.min_fill
    }

    pub fn config(&self) -> &BTreeConfig {
        &self.config
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a key and return its value
    pub fn get(&self, key: Key) -> Option<&V> {
        let leaf = self.find_leaf(key);
        self.arena.leaf(leaf).get(key)
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Smallest key in the tree
    pub fn first_key(&self) -> Option<Key> {
        let mut current = self.root;
        loop {
            match self.arena.node(current) {
                Node::Internal(node) => current = node.child(0),
                Node::Leaf(leaf) => return leaf.min_key(),
            }
        }
    }

    /// Largest key in the tree
    pub fn last_key(&self) -> Option<Key> {
        self.arena.node(self.root).max_key()
    }

    /// Records with `start <= key <= end`, in ascending order
    pub fn range(&self, start: Key, end: Key) -> Range<'_, V> {
        Range::new(self, start, end)
    }

    /// All records in ascending order
    pub fn iter(&self) -> Range<'_, V> {
        self.range(Key::MIN, Key::MAX)
    }

    /// Insert or overwrite a record.
    ///
    /// Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: Key, value: V) -> Option<V> {
        let (path, leaf_id) = self.descend(key);

        let previous = self.arena.leaf_mut(leaf_id).set_value(key, value);
        if previous.is_some() {
            // Overwrite: no length or maximum change
            return previous;
        }

        self.len += 1;
        self.refresh_max_keys(&path, leaf_id);
        self.split_overflow(path, leaf_id);
        None
    }

    /// Delete a key from the tree.
    ///
    /// Returns the removed value; a missing key leaves the tree untouched.
    pub fn delete(&mut self, key: Key) -> Option<V> {
        let (path, leaf_id) = self.descend(key);

        let removed = self.arena.leaf_mut(leaf_id).remove(key)?;
        self.len -= 1;
        self.refresh_max_keys(&path, leaf_id);
        self.rebalance(path, leaf_id);
        Some(removed)
    }

    /// Remove every record, returning to a single empty leaf
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = self
            .arena
            .alloc(Node::Leaf(LeafNode::new(self.config.branching_factor)));
        self.height = 1;
        self.len = 0;
    }

    /// Get statistics about the tree
    pub fn stats(&self) -> TreeStats {
        let leaf_nodes = self.leaf_chain().count();
        TreeStats {
            len: self.len,
            height: self.height,
            leaf_nodes,
            internal_nodes: self.arena.live_count() - leaf_nodes,
            leaf_splits: self.counters.leaf_splits,
            internal_splits: self.counters.internal_splits,
            leaf_merges: self.counters.leaf_merges,
            internal_merges: self.counters.internal_merges,
            borrows: self.counters.borrows,
            root_splits: self.counters.root_splits,
            root_collapses: self.counters.root_collapses,
        }
    }

    /// Debug search - traces the path through the tree
    pub fn trace_get(&self, key: Key) -> Vec<String> {
        let mut trace = vec![
            format!("Searching for key: {key}"),
            format!("Root node: {}, Height: {}", self.root, self.height),
        ];

        let mut current = self.root;
        loop {
            match self.arena.node(current) {
                Node::Internal(node) => {
                    trace.push(format!(
                        "  Node {current}: internal, max_keys={:?}",
                        node.max_keys()
                    ));
                    let idx = node.find_child_index(key);
                    trace.push(format!(
                        "  -> Descending to child {} (slot {idx})",
                        node.child(idx)
                    ));
                    current = node.child(idx);
                }
                Node::Leaf(leaf) => {
                    let keys: Vec<Key> = leaf.records().iter().map(|r| r.key).collect();
                    trace.push(format!("  Node {current}: leaf, keys={keys:?}"));
                    if leaf.get(key).is_some() {
                        trace.push("  FOUND".to_string());
                    } else {
                        trace.push("  NOT FOUND in leaf".to_string());
                    }
                    return trace;
                }
            }
        }
    }

    /// Descend to the leaf that owns (or would own) `key`
    pub(crate) fn find_leaf(&self, key: Key) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(node) = self.arena.node(current) {
            current = node.child(node.find_child_index(key));
        }
        current
    }

    /// Like `find_leaf`, recording every internal node and slot visited
    fn descend(&self, key: Key) -> (Vec<PathEntry>, NodeId) {
        let mut path = Vec::with_capacity(self.height);
        let mut current = self.root;
        while let Node::Internal(node) = self.arena.node(current) {
            let index = node.find_child_index(key);
            path.push(PathEntry {
                node: current,
                index,
            });
            current = node.child(index);
        }
        (path, current)
    }

    /// Leaves in chain order, starting from the leftmost
    fn leaf_chain(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut first = self.root;
        while let Node::Internal(node) = self.arena.node(first) {
            first = node.child(0);
        }
        std::iter::successors(Some(first), move |&id| self.arena.leaf(id).next())
    }

    /// Maximum key of a non-empty subtree (only the root leaf may be empty)
    fn subtree_max(&self, id: NodeId) -> Key {
        self.arena.node(id).max_key().unwrap_or(Key::MIN)
    }

    /// Push a changed subtree maximum up the recorded path
    fn refresh_max_keys(&mut self, path: &[PathEntry], from: NodeId) {
        let mut child = from;
        for entry in path.iter().rev() {
            let Some(max) = self.arena.node(child).max_key() else {
                break;
            };
            let parent = self.arena.internal_mut(entry.node);
            if parent.max_keys()[entry.index] == max {
                break;
            }
            parent.set_max_key(entry.index, max);
            child = entry.node;
        }
    }

    /// Split `node_id` while it holds more than M entries, walking up the path
    fn split_overflow(&mut self, mut path: Vec<PathEntry>, mut node_id: NodeId) {
        let m = self.config.branching_factor;

        while self.arena.node(node_id).len() > m {
            let node = self.arena.node_mut(node_id);
            let is_leaf = node.is_leaf();
            let right = node.split_off(m);
            let right_id = self.arena.alloc(right);
            if is_leaf {
                self.arena.leaf_mut(node_id).next = Some(right_id);
            }

            let left_max = self.subtree_max(node_id);
            let right_max = self.subtree_max(right_id);
            self.counters.record_split(is_leaf);
            tracing::trace!(
                target: "bptree_index::split",
                left = node_id.value(),
                right = right_id.value(),
                left_len = self.arena.node(node_id).len(),
                right_len = self.arena.node(right_id).len(),
                leaf = is_leaf,
                "split overflowing node"
            );

            match path.pop() {
                Some(parent) => {
                    self.arena.internal_mut(parent.node).replace_with_split(
                        parent.index,
                        left_max,
                        right_id,
                        right_max,
                    );
                    node_id = parent.node;
                }
                None => {
                    let root = InternalNode::with_children(
                        m,
                        (node_id, left_max),
                        (right_id, right_max),
                    );
                    self.root = self.arena.alloc(Node::Internal(root));
                    self.height += 1;
                    self.counters.root_splits += 1;
                    tracing::trace!(
                        target: "bptree_index::root",
                        root = self.root.value(),
                        height = self.height,
                        "root split, tree grew"
                    );
                    return;
                }
            }
        }
    }

    /// Restore minimum fill from `node_id` upward after a removal
    fn rebalance(&mut self, mut path: Vec<PathEntry>, mut node_id: NodeId) {
        loop {
            let Some(parent) = path.pop() else {
                self.collapse_root();
                return;
            };
            if self.arena.node(node_id).len() >= self.min_fill {
                return;
            }
            if self.borrow_from_sibling(parent, node_id) {
                return;
            }
            self.merge_with_sibling(parent, node_id);
            node_id = parent.node;
        }
    }

    /// Move one entry from an adjacent sibling under the same parent.
    ///
    /// Tries the left sibling first. Returns false if neither can spare one.
    fn borrow_from_sibling(&mut self, parent: PathEntry, node_id: NodeId) -> bool {
        let siblings = self.arena.internal(parent.node);
        let left = parent.index.checked_sub(1).map(|i| siblings.child(i));
        let right = siblings.children().get(parent.index + 1).copied();

        if let Some(left_id) = left {
            if self.arena.node(left_id).len() > self.min_fill {
                if let Some(slot) = self.arena.node_mut(left_id).pop_last() {
                    self.arena.node_mut(node_id).push_first(slot);
                    let left_max = self.subtree_max(left_id);
                    self.arena
                        .internal_mut(parent.node)
                        .set_max_key(parent.index - 1, left_max);
                    self.counters.borrows += 1;
                    tracing::trace!(
                        target: "bptree_index::borrow",
                        from = left_id.value(),
                        to = node_id.value(),
                        direction = "left",
                        "borrowed from left sibling"
                    );
                    return true;
                }
            }
        }

        if let Some(right_id) = right {
            if self.arena.node(right_id).len() > self.min_fill {
                if let Some(slot) = self.arena.node_mut(right_id).pop_first() {
                    self.arena.node_mut(node_id).push_last(slot);
                    let node_max = self.subtree_max(node_id);
                    self.arena
                        .internal_mut(parent.node)
                        .set_max_key(parent.index, node_max);
                    self.counters.borrows += 1;
                    tracing::trace!(
                        target: "bptree_index::borrow",
                        from = right_id.value(),
                        to = node_id.value(),
                        direction = "right",
                        "borrowed from right sibling"
                    );
                    return true;
                }
            }
        }

        false
    }

    /// Merge `node_id` with an adjacent sibling, removing one parent slot.
    ///
    /// The right node of the pair is always folded into the left one, so for
    /// leaves the chain is spliced by handing the left leaf the right's `next`.
    fn merge_with_sibling(&mut self, parent: PathEntry, node_id: NodeId) {
        let left_index = parent.index.saturating_sub(1);
        let siblings = self.arena.internal(parent.node);
        let left_id = siblings.child(left_index);
        let right_id = siblings.child(left_index + 1);

        let right = self.arena.release(right_id);
        let is_leaf = right.is_leaf();
        self.arena.node_mut(left_id).absorb(right);

        let left_max = self.subtree_max(left_id);
        let parent_node = self.arena.internal_mut(parent.node);
        parent_node.remove_child(left_index + 1);
        parent_node.set_max_key(left_index, left_max);

        self.counters.record_merge(is_leaf);
        tracing::trace!(
            target: "bptree_index::merge",
            survivor = left_id.value(),
            removed = right_id.value(),
            underflowing = node_id.value(),
            leaf = is_leaf,
            merged_len = self.arena.node(left_id).len(),
            "merged sibling nodes"
        );
    }

    /// Replace an internal root that has a single child by that child
    fn collapse_root(&mut self) {
        while let Node::Internal(root) = self.arena.node(self.root) {
            if root.len() != 1 {
                break;
            }
            let child = root.child(0);
            let old_root = self.root;
            self.arena.release(old_root);
            self.root = child;
            self.height -= 1;
            self.counters.root_collapses += 1;
            tracing::trace!(
                target: "bptree_index::root",
                old_root = old_root.value(),
                root = child.value(),
                height = self.height,
                "root collapsed into its only child"
            );
        }
    }

    /// Verify every structural invariant of the tree.
    ///
    /// Checks uniform leaf depth, fill bounds, cached maxima, strict key
    /// order within and across leaves, the leaf chain, single ownership of
    /// every node and the record count.
    pub fn check_invariants(&self) -> Result<()> {
        let mut check = InvariantCheck::default();
        self.check_node(self.root, 1, true, &mut check)?;

        if check.leaf_depth != Some(self.height) {
            return Err(IndexError::invalid_ordering(format!(
                "leaf depth {:?} does not match height {}",
                check.leaf_depth, self.height
            )));
        }
        if check.records != self.len {
            return Err(IndexError::invalid_ordering(format!(
                "found {} records, expected {}",
                check.records, self.len
            )));
        }
        if check.seen.len() != self.arena.live_count() {
            return Err(IndexError::invalid_ordering(format!(
                "{} live nodes but only {} reachable",
                self.arena.live_count(),
                check.seen.len()
            )));
        }

        // The chain must visit exactly the in-order leaves, then terminate
        let mut current = check.leaves.first().copied();
        for (position, &expected) in check.leaves.iter().enumerate() {
            if current != Some(expected) {
                return Err(IndexError::invalid_ordering(format!(
                    "leaf chain position {position}: expected {expected}, found {current:?}"
                )));
            }
            current = self.arena.leaf(expected).next();
        }
        if let Some(extra) = current {
            return Err(IndexError::invalid_ordering(format!(
                "leaf chain continues past the last leaf into {extra}"
            )));
        }

        let mut previous: Option<Key> = None;
        for (key, _) in self.iter() {
            if previous.is_some_and(|p| p >= key) {
                return Err(IndexError::invalid_ordering(format!(
                    "key {key} follows {previous:?} in the leaf chain"
                )));
            }
            previous = Some(key);
        }

        Ok(())
    }

    /// Validate one subtree, returning its maximum key
    fn check_node(
        &self,
        id: NodeId,
        depth: usize,
        is_root: bool,
        check: &mut InvariantCheck,
    ) -> Result<Option<Key>> {
        if !self.arena.contains(id) {
            return Err(IndexError::invalid_ordering(format!("dangling node {id}")));
        }
        if !check.seen.insert(id) {
            return Err(IndexError::invalid_ordering(format!(
                "node {id} has more than one parent"
            )));
        }

        let m = self.config.branching_factor;
        let len = self.arena.node(id).len();
        if len > m {
            return Err(IndexError::invalid_ordering(format!(
                "node {id} holds {len} entries, max {m}"
            )));
        }
        if !is_root && len < self.min_fill {
            return Err(IndexError::invalid_ordering(format!(
                "node {id} holds {len} entries, min {}",
                self.min_fill
            )));
        }

        match self.arena.node(id) {
            Node::Leaf(leaf) => {
                match check.leaf_depth {
                    None => check.leaf_depth = Some(depth),
                    Some(d) if d != depth => {
                        return Err(IndexError::invalid_ordering(format!(
                            "leaf {id} at depth {depth}, others at {d}"
                        )));
                    }
                    Some(_) => {}
                }
                if leaf.records().windows(2).any(|w| w[0].key >= w[1].key) {
                    return Err(IndexError::invalid_ordering(format!(
                        "leaf {id} keys are not strictly ascending"
                    )));
                }
                check.leaves.push(id);
                check.records += len;
                Ok(leaf.max_key())
            }
            Node::Internal(node) => {
                if is_root && len < 2 {
                    return Err(IndexError::invalid_ordering(format!(
                        "internal root {id} has {len} children"
                    )));
                }
                if node.children().len() != node.max_keys().len() {
                    return Err(IndexError::invalid_ordering(format!(
                        "node {id} has {} children but {} cached maxima",
                        node.children().len(),
                        node.max_keys().len()
                    )));
                }
                for (&child, &cached) in node.children().iter().zip(node.max_keys()) {
                    let actual = self.check_node(child, depth + 1, false, check)?;
                    if actual != Some(cached) {
                        return Err(IndexError::invalid_ordering(format!(
                            "node {id} caches max {cached} for child {child}, actual {actual:?}"
                        )));
                    }
                }
                if node.max_keys().windows(2).any(|w| w[0] >= w[1]) {
                    return Err(IndexError::invalid_ordering(format!(
                        "node {id} cached maxima are not strictly ascending"
                    )));
                }
                Ok(node.max_key())
            }
        }
    }
}

#[derive(Default)]
struct InvariantCheck {
    seen: HashSet<NodeId>,
    leaves: Vec<NodeId>,
    leaf_depth: Option<usize>,
    records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn keys<V>(tree: &BPlusTree<V>) -> Vec<Key> {
        tree.iter().map(|(k, _)| k).collect()
    }

    fn root_max_keys<V>(tree: &BPlusTree<V>) -> Vec<Key> {
        tree.arena.internal(tree.root()).max_keys().to_vec()
    }

    #[test]
    fn test_btree_empty() -> Result<()> {
        let tree: BPlusTree<String> = BPlusTree::new(4);
        assert_eq!(tree.get(1), None);
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.first_key(), None);
        assert_eq!(tree.last_key(), None);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_clamps_branching_factor() {
        let tree: BPlusTree<()> = BPlusTree::new(1);
        assert_eq!(tree.branching_factor(), 3);
        assert_eq!(tree.min_fill(), 2);

        let err = BPlusTree::<()>::with_config(BTreeConfig {
            branching_factor: 2,
        });
        assert!(matches!(err, Err(IndexError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_btree_update() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        assert_eq!(tree.insert(5, "value1"), None);
        assert_eq!(tree.insert(5, "value2"), Some("value1"));
        assert_eq!(tree.get(5), Some(&"value2"));
        assert_eq!(tree.len(), 1);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_sequential_inserts_m4() -> Result<()> {
        let mut tree = BPlusTree::new(4);
        for k in 1..=10 {
            tree.insert(k, format!("value{k}"));
            tree.check_invariants()?;
        }

        assert_eq!(tree.get(7), Some(&"value7".to_string()));
        let scanned: Vec<(Key, String)> = tree.range(3, 6).map(|(k, v)| (k, v.clone())).collect();
        assert_eq!(
            scanned,
            vec![
                (3, "value3".to_string()),
                (4, "value4".to_string()),
                (5, "value5".to_string()),
                (6, "value6".to_string()),
            ]
        );
        assert_eq!(keys(&tree), (1..=10).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_btree_root_split_shape() -> Result<()> {
        // M = 3: the fourth record splits the root leaf 2/2
        let mut tree = BPlusTree::new(3);
        for k in 1..=4 {
            tree.insert(k, ());
        }
        assert_eq!(tree.height(), 2);
        assert_eq!(root_max_keys(&tree), vec![2, 4]);

        let stats = tree.stats();
        assert_eq!(stats.leaf_nodes, 2);
        assert_eq!(stats.internal_nodes, 1);
        assert_eq!(stats.leaf_splits, 1);
        assert_eq!(stats.root_splits, 1);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_max_key_propagates_up() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        for k in 1..=4 {
            tree.insert(k, ());
        }
        tree.insert(100, ());
        assert_eq!(root_max_keys(&tree), vec![2, 100]);
        assert_eq!(tree.last_key(), Some(100));

        tree.delete(100);
        assert_eq!(root_max_keys(&tree), vec![2, 4]);
        assert_eq!(tree.last_key(), Some(4));
        tree.check_invariants()
    }

    #[test]
    fn test_btree_delete_borrows_from_sibling() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        for k in 1..=5 {
            tree.insert(k, ());
        }
        // Leaves [1, 2] [3, 4, 5]; removing 1 underflows the left leaf
        assert_eq!(tree.delete(1), Some(()));

        let stats = tree.stats();
        assert_eq!(stats.borrows, 1);
        assert_eq!(stats.leaf_merges, 0);
        assert_eq!(tree.height(), 2);
        assert_eq!(root_max_keys(&tree), vec![3, 5]);
        assert_eq!(keys(&tree), vec![2, 3, 4, 5]);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_delete_merges_and_collapses_root() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        for k in 1..=4 {
            tree.insert(k, ());
        }
        // Leaves [1, 2] [3, 4]; neither sibling can lend, so they merge
        tree.delete(1);

        let stats = tree.stats();
        assert_eq!(stats.leaf_merges, 1);
        assert_eq!(stats.root_collapses, 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(stats.leaf_nodes, 1);
        assert_eq!(stats.internal_nodes, 0);
        assert_eq!(keys(&tree), vec![2, 3, 4]);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_delete_scenario_m3() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        for k in [10, 20, 5, 15, 25, 1] {
            tree.insert(k, k * 100);
        }
        tree.check_invariants()?;

        assert_eq!(tree.delete(20), Some(2000));
        assert_eq!(tree.get(20), None);
        for k in [10, 5, 15, 25, 1] {
            assert_eq!(tree.get(k), Some(&(k * 100)));
        }
        tree.check_invariants()
    }

    #[test]
    fn test_btree_single_insert_delete_resets_root() -> Result<()> {
        let mut tree = BPlusTree::new(4);
        tree.insert(42, "x");
        assert_eq!(tree.delete(42), Some("x"));

        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert!(tree.arena.node(tree.root()).is_leaf());
        assert!(tree.arena.node(tree.root()).is_empty());
        assert_eq!(tree.arena.live_count(), 1);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_delete_missing_is_noop() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        for k in 0..20 {
            tree.insert(k * 2, k);
        }
        let before = keys(&tree);
        let stats_before = tree.stats();

        assert_eq!(tree.delete(7), None);
        assert_eq!(tree.delete(-1), None);
        assert_eq!(tree.delete(1000), None);

        assert_eq!(keys(&tree), before);
        assert_eq!(tree.stats(), stats_before);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_drain_to_empty() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        for k in 0..200 {
            tree.insert(k, k);
        }
        assert!(tree.height() >= 4);

        for k in (0..200).rev() {
            assert_eq!(tree.delete(k), Some(k));
            tree.check_invariants()?;
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.arena.live_count(), 1);
        Ok(())
    }

    #[test]
    fn test_btree_reinsert_after_merges_reuses_slots() -> Result<()> {
        let mut tree = BPlusTree::new(4);
        for k in 0..100 {
            tree.insert(k, ());
        }
        for k in 0..90 {
            tree.delete(k);
        }
        let live = tree.arena.live_count();
        let slots = tree.arena.slot_count();
        let free = slots - live;
        assert!(free > 0);

        for k in 0..90 {
            tree.insert(k, ());
        }
        // Inserts never release nodes, so freed slots are consumed first
        let allocated = tree.arena.live_count() - live;
        assert_eq!(tree.arena.slot_count(), slots + allocated.saturating_sub(free));
        assert_eq!(tree.len(), 100);
        tree.check_invariants()
    }

    #[test]
    fn test_btree_clear() -> Result<()> {
        let mut tree = BPlusTree::new(3);
        for k in 0..50 {
            tree.insert(k, ());
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.get(3), None);
        tree.insert(3, ());
        assert_eq!(tree.get(3), Some(&()));
        tree.check_invariants()
    }

    #[test]
    fn test_btree_trace_get() {
        let mut tree = BPlusTree::new(3);
        for k in 0..10 {
            tree.insert(k, ());
        }
        let trace = tree.trace_get(4);
        assert!(trace.iter().any(|line| line.contains("Descending")));
        assert_eq!(trace.last().map(String::as_str), Some("  FOUND"));

        let trace = tree.trace_get(99);
        assert_eq!(trace.last().map(String::as_str), Some("  NOT FOUND in leaf"));
    }

    #[test]
    fn test_btree_invariant_check_detects_stale_max() {
        let mut tree = BPlusTree::new(3);
        for k in 1..=4 {
            tree.insert(k, ());
        }
        let root = tree.root();
        tree.arena.internal_mut(root).set_max_key(0, 3);
        assert!(matches!(
            tree.check_invariants(),
            Err(IndexError::InvalidKeyOrdering(_))
        ));
    }

    #[test]
    fn test_btree_invariant_check_detects_broken_chain() {
        let mut tree = BPlusTree::new(3);
        for k in 1..=6 {
            tree.insert(k, ());
        }
        let first = tree.find_leaf(1);
        tree.arena.leaf_mut(first).next = None;
        assert!(tree.check_invariants().is_err());
    }

    #[test]
    fn test_btree_random_workload() -> Result<()> {
        for m in [3, 4, 5, 8] {
            let mut rng = StdRng::seed_from_u64(0xB7EE + m as u64);
            let mut tree = BPlusTree::new(m);
            let mut model = BTreeMap::new();

            for _ in 0..3000 {
                let key = rng.gen_range(-200..200);
                if rng.gen_bool(0.6) {
                    let value: u32 = rng.gen();
                    assert_eq!(tree.insert(key, value), model.insert(key, value));
                } else {
                    assert_eq!(tree.delete(key), model.remove(&key));
                }
                tree.check_invariants()?;
            }

            let expected: Vec<(Key, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
            let actual: Vec<(Key, u32)> = tree.iter().map(|(k, v)| (k, *v)).collect();
            assert_eq!(actual, expected, "mismatch for M = {m}");
        }
        Ok(())
    }

    #[test]
    fn test_btree_shuffled_inserts_then_deletes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut order: Vec<Key> = (0..500).collect();
        order.shuffle(&mut rng);

        let mut tree = BPlusTree::new(5);
        for &k in &order {
            tree.insert(k, k);
        }
        tree.check_invariants()?;
        assert_eq!(keys(&tree), (0..500).collect::<Vec<_>>());

        order.shuffle(&mut rng);
        for &k in order.iter().take(400) {
            assert_eq!(tree.delete(k), Some(k));
        }
        tree.check_invariants()?;
        assert_eq!(tree.len(), 100);
        assert!(tree.stats().leaf_merges > 0);
        Ok(())
    }
}
