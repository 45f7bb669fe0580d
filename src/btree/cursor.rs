//! Leaf-chain cursor for range iteration.
//!
//! A cursor is positioned once by descending from the root to the first
//! record >= the start key. From there it only follows leaf `next` links,
//! stopping at the first key above the inclusive end bound.

use super::BPlusTree;
use crate::types::{Key, NodeId, Record};

/// Position within the leaf chain
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    /// Current leaf, `None` once exhausted
    leaf: Option<NodeId>,
    /// Index of the next record within the current leaf
    index: usize,
    /// Inclusive upper bound
    end: Key,
}

impl Cursor {
    /// Position a cursor at the first key >= `start`
    pub(crate) fn seek<V>(tree: &BPlusTree<V>, start: Key, end: Key) -> Self {
        if start > end {
            return Self {
                leaf: None,
                index: 0,
                end,
            };
        }

        let leaf = tree.find_leaf(start);
        let index = tree.arena.leaf(leaf).lower_bound(start);
        Self {
            leaf: Some(leaf),
            index,
            end,
        }
    }

    /// Check if the cursor can still yield records
    pub(crate) fn is_valid(&self) -> bool {
        self.leaf.is_some()
    }

    /// Advance and return the next record within bounds
    pub(crate) fn advance<'t, V>(&mut self, tree: &'t BPlusTree<V>) -> Option<&'t Record<V>> {
        loop {
            let leaf_id = self.leaf?;
            let leaf = tree.arena.leaf(leaf_id);

            if let Some(record) = leaf.records().get(self.index) {
                if record.key > self.end {
                    self.leaf = None;
                    return None;
                }
                self.index += 1;
                return Some(record);
            }

            // Exhausted this leaf, follow the chain
            self.leaf = leaf.next();
            self.index = 0;
        }
    }
}

/// Borrowing iterator over `(key, &value)` pairs in ascending key order
pub struct Range<'a, V> {
    tree: &'a BPlusTree<V>,
    cursor: Cursor,
}

impl<'a, V> Range<'a, V> {
    pub(crate) fn new(tree: &'a BPlusTree<V>, start: Key, end: Key) -> Self {
        Self {
            tree,
            cursor: Cursor::seek(tree, start, end),
        }
    }
}

impl<'a, V> Iterator for Range<'a, V> {
    type Item = (Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor
            .advance(self.tree)
            .map(|record| (record.key, &record.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.cursor.is_valid() {
            (0, None)
        } else {
            (0, Some(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(keys: impl IntoIterator<Item = Key>) -> BPlusTree<Key> {
        let mut tree = BPlusTree::new(3);
        for k in keys {
            tree.insert(k, k * 10);
        }
        tree
    }

    #[test]
    fn test_cursor_walks_leaf_chain() {
        let tree = tree_with(0..50);
        let keys: Vec<Key> = tree.range(10, 30).map(|(k, _)| k).collect();
        assert_eq!(keys, (10..=30).collect::<Vec<_>>());
        assert!(tree.height() > 2);
    }

    #[test]
    fn test_cursor_bounds_between_keys() {
        let tree = tree_with((0..40).map(|k| k * 5));
        let keys: Vec<Key> = tree.range(12, 33).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![15, 20, 25, 30]);

        let values: Vec<Key> = tree.range(-100, 0).map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0]);
    }

    #[test]
    fn test_cursor_empty_ranges() {
        let tree = tree_with(0..20);
        assert_eq!(tree.range(100, 200).count(), 0);
        assert_eq!(tree.range(5, 4).count(), 0);

        let empty: BPlusTree<()> = BPlusTree::new(4);
        assert_eq!(empty.iter().count(), 0);
        assert_eq!(tree.range(5, 4).size_hint(), (0, Some(0)));
    }

    #[test]
    fn test_cursor_validity() {
        let tree = tree_with(0..5);
        let mut cursor = Cursor::seek(&tree, 3, 4);
        assert!(cursor.is_valid());
        assert_eq!(cursor.advance(&tree).map(|r| r.key), Some(3));
        assert_eq!(cursor.advance(&tree).map(|r| r.key), Some(4));
        assert!(cursor.advance(&tree).is_none());
        assert!(!cursor.is_valid());
    }
}
