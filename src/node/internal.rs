//! Internal node: child handles with a cached maximum key per child.

use crate::types::{Key, NodeId};

/// An internal node routing by upper bound.
///
/// `max_keys[i]` caches the largest key in the subtree of `children[i]`.
/// Both vectors always have the same length and `max_keys` ascends.
#[derive(Debug, Clone)]
pub struct InternalNode {
    pub(crate) children: Vec<NodeId>,
    pub(crate) max_keys: Vec<Key>,
}

impl InternalNode {
    /// Create a node with exactly two children (used for a new root)
    pub fn with_children(
        branching_factor: usize,
        left: (NodeId, Key),
        right: (NodeId, Key),
    ) -> Self {
        let mut node = Self::new(branching_factor);
        node.push_last(left.0, left.1);
        node.push_last(right.0, right.1);
        node
    }

    pub fn new(branching_factor: usize) -> Self {
        Self {
            children: Vec::with_capacity(branching_factor + 1),
            max_keys: Vec::with_capacity(branching_factor + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn max_key(&self) -> Option<Key> {
        self.max_keys.last().copied()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn max_keys(&self) -> &[Key] {
        &self.max_keys
    }

    pub fn child(&self, idx: usize) -> NodeId {
        self.children[idx]
    }

    /// Index of the first child whose maximum is >= `key`.
    ///
    /// Keys above every cached maximum route to the last child.
    pub fn find_child_index(&self, key: Key) -> usize {
        let idx = self.max_keys.partition_point(|&max| max < key);
        idx.min(self.children.len().saturating_sub(1))
    }

    pub fn set_max_key(&mut self, idx: usize, max_key: Key) {
        self.max_keys[idx] = max_key;
    }

    /// Replace the slot at `idx` with the two halves of a split child
    pub fn replace_with_split(
        &mut self,
        idx: usize,
        left_max: Key,
        right: NodeId,
        right_max: Key,
    ) {
        self.max_keys[idx] = left_max;
        self.children.insert(idx + 1, right);
        self.max_keys.insert(idx + 1, right_max);
    }

    /// Remove the child slot at `idx`, returning its handle
    pub fn remove_child(&mut self, idx: usize) -> NodeId {
        self.max_keys.remove(idx);
        self.children.remove(idx)
    }

    pub fn push_first(&mut self, child: NodeId, max_key: Key) {
        self.children.insert(0, child);
        self.max_keys.insert(0, max_key);
    }

    pub fn push_last(&mut self, child: NodeId, max_key: Key) {
        self.children.push(child);
        self.max_keys.push(max_key);
    }

    pub fn pop_first(&mut self) -> Option<(NodeId, Key)> {
        if self.children.is_empty() {
            return None;
        }
        Some((self.children.remove(0), self.max_keys.remove(0)))
    }

    pub fn pop_last(&mut self) -> Option<(NodeId, Key)> {
        Some((self.children.pop()?, self.max_keys.pop()?))
    }

    /// Split off the upper half of the children into a new node
    pub fn split_off(&mut self, branching_factor: usize) -> Self {
        let mid = self.children.len() / 2;
        let mut right = Self::new(branching_factor);
        right.children.extend(self.children.drain(mid..));
        right.max_keys.extend(self.max_keys.drain(mid..));
        right
    }

    /// Append all children of the right neighbour
    pub fn absorb(&mut self, right: InternalNode) {
        self.children.extend(right.children);
        self.max_keys.extend(right.max_keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(maxes: &[Key]) -> InternalNode {
        let mut n = InternalNode::new(4);
        for (i, &m) in maxes.iter().enumerate() {
            n.push_last(NodeId::new(i as u32), m);
        }
        n
    }

    #[test]
    fn test_find_child_index_routes_by_upper_bound() {
        let n = node(&[10, 20, 30]);
        assert_eq!(n.find_child_index(-5), 0);
        assert_eq!(n.find_child_index(10), 0);
        assert_eq!(n.find_child_index(11), 1);
        assert_eq!(n.find_child_index(20), 1);
        assert_eq!(n.find_child_index(30), 2);
        // Beyond the subtree maximum: last child
        assert_eq!(n.find_child_index(31), 2);
        assert_eq!(n.find_child_index(Key::MAX), 2);
    }

    #[test]
    fn test_replace_with_split() {
        let mut n = node(&[10, 20]);
        n.replace_with_split(0, 5, NodeId::new(7), 10);
        assert_eq!(n.max_keys(), &[5, 10, 20]);
        assert_eq!(
            n.children(),
            &[NodeId::new(0), NodeId::new(7), NodeId::new(1)]
        );
    }

    #[test]
    fn test_split_off_and_absorb() {
        let mut n = node(&[1, 2, 3, 4, 5]);
        let right = n.split_off(4);
        assert_eq!(n.max_keys(), &[1, 2]);
        assert_eq!(right.max_keys(), &[3, 4, 5]);

        n.absorb(right);
        assert_eq!(n.len(), 5);
        assert_eq!(n.max_key(), Some(5));
    }

    #[test]
    fn test_push_pop_ends() {
        let mut n = node(&[10, 20]);
        assert_eq!(n.pop_last(), Some((NodeId::new(1), 20)));
        n.push_first(NodeId::new(1), 5);
        assert_eq!(n.max_keys(), &[5, 10]);
        assert_eq!(n.pop_first(), Some((NodeId::new(1), 5)));
        assert_eq!(n.remove_child(0), NodeId::new(0));
        assert!(n.is_empty());
        assert_eq!(n.pop_first(), None);
    }
}
