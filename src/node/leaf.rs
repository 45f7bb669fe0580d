//! Leaf node: sorted records plus the leaf-chain link.

use crate::types::{Key, NodeId, Record};

/// A leaf holding records in strictly ascending key order
#[derive(Debug, Clone)]
pub struct LeafNode<V> {
    pub(crate) records: Vec<Record<V>>,
    /// Next leaf in key order (not an ownership edge)
    pub(crate) next: Option<NodeId>,
}

impl<V> LeafNode<V> {
    /// Create an empty leaf with room for one overflow record
    pub fn new(branching_factor: usize) -> Self {
        Self {
            records: Vec::with_capacity(branching_factor + 1),
            next: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest key in this leaf, `None` when empty
    pub fn max_key(&self) -> Option<Key> {
        self.records.last().map(|r| r.key)
    }

    pub fn min_key(&self) -> Option<Key> {
        self.records.first().map(|r| r.key)
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn records(&self) -> &[Record<V>] {
        &self.records
    }

    /// Insert or overwrite a record, keeping keys sorted.
    ///
    /// Returns the previous value when the key already existed. Never splits;
    /// the caller checks the length afterwards.
    pub fn set_value(&mut self, key: Key, value: V) -> Option<V> {
        let idx = match (self.min_key(), self.max_key()) {
            (Some(first), _) if key < first => 0,
            (_, Some(last)) if key > last => self.records.len(),
            (None, _) | (_, None) => 0,
            _ => match self.search(key) {
                Ok(idx) => {
                    return Some(std::mem::replace(&mut self.records[idx].value, value));
                }
                Err(idx) => idx,
            },
        };
        self.records.insert(idx, Record::new(key, value));
        None
    }

    pub fn get(&self, key: Key) -> Option<&V> {
        self.search(key).ok().map(|idx| &self.records[idx].value)
    }

    /// Remove the record for `key`, if present
    pub fn remove(&mut self, key: Key) -> Option<V> {
        let idx = self.search(key).ok()?;
        Some(self.records.remove(idx).value)
    }

    /// Index of the first record with key >= `key`
    pub fn lower_bound(&self, key: Key) -> usize {
        self.records.partition_point(|r| r.key < key)
    }

    /// Split off the upper half into a new leaf.
    ///
    /// The left half keeps floor(len/2) records. The new leaf inherits this
    /// leaf's `next`; the caller relinks this leaf once the new one has an id.
    pub fn split_off(&mut self, branching_factor: usize) -> Self {
        let mid = self.records.len() / 2;
        let mut right = Self::new(branching_factor);
        right.records.extend(self.records.drain(mid..));
        right.next = self.next.take();
        right
    }

    /// Append all records of the right neighbour and take over its link
    pub fn absorb(&mut self, right: LeafNode<V>) {
        debug_assert!(match (self.max_key(), right.min_key()) {
            (Some(l), Some(r)) => l < r,
            _ => true,
        });
        self.records.extend(right.records);
        self.next = right.next;
    }

    fn search(&self, key: Key) -> std::result::Result<usize, usize> {
        self.records.binary_search_by_key(&key, |r| r.key)
    }
}
