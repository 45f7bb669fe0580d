//! Node layer: the two node variants of the tree.
//!
//! - Leaf nodes hold records sorted by key and a link to the next leaf
//! - Internal nodes hold child handles, each annotated with the maximum
//!   key of that child's subtree

mod internal;
mod leaf;

pub use internal::InternalNode;
pub use leaf::LeafNode;

use crate::types::{Key, NodeId, Record};

/// A tree node
#[derive(Debug, Clone)]
pub enum Node<V> {
    Internal(InternalNode),
    Leaf(LeafNode<V>),
}

/// One movable unit of a node, used when borrowing across siblings
#[derive(Debug)]
pub enum Slot<V> {
    Record(Record<V>),
    Child(NodeId, Key),
}

impl<V> Node<V> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Number of records (leaf) or children (internal)
    pub fn len(&self) -> usize {
        match self {
            Node::Internal(node) => node.len(),
            Node::Leaf(leaf) => leaf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest key in the subtree rooted here
    pub fn max_key(&self) -> Option<Key> {
        match self {
            Node::Internal(node) => node.max_key(),
            Node::Leaf(leaf) => leaf.max_key(),
        }
    }

    /// Split off the upper half into a new node of the same kind
    pub fn split_off(&mut self, branching_factor: usize) -> Node<V> {
        match self {
            Node::Internal(node) => Node::Internal(node.split_off(branching_factor)),
            Node::Leaf(leaf) => Node::Leaf(leaf.split_off(branching_factor)),
        }
    }

    pub fn pop_first(&mut self) -> Option<Slot<V>> {
        match self {
            Node::Internal(node) => node.pop_first().map(|(id, max)| Slot::Child(id, max)),
            Node::Leaf(leaf) => {
                if leaf.records.is_empty() {
                    None
                } else {
                    Some(Slot::Record(leaf.records.remove(0)))
                }
            }
        }
    }

    pub fn pop_last(&mut self) -> Option<Slot<V>> {
        match self {
            Node::Internal(node) => node.pop_last().map(|(id, max)| Slot::Child(id, max)),
            Node::Leaf(leaf) => leaf.records.pop().map(Slot::Record),
        }
    }

    pub fn push_first(&mut self, slot: Slot<V>) {
        match (self, slot) {
            (Node::Internal(node), Slot::Child(id, max)) => node.push_first(id, max),
            (Node::Leaf(leaf), Slot::Record(record)) => leaf.records.insert(0, record),
            _ => unreachable!("slot kind does not match node kind"),
        }
    }

    pub fn push_last(&mut self, slot: Slot<V>) {
        match (self, slot) {
            (Node::Internal(node), Slot::Child(id, max)) => node.push_last(id, max),
            (Node::Leaf(leaf), Slot::Record(record)) => leaf.records.push(record),
            _ => unreachable!("slot kind does not match node kind"),
        }
    }

    /// Merge the right neighbour's contents into this node
    pub fn absorb(&mut self, right: Node<V>) {
        match (self, right) {
            (Node::Internal(left), Node::Internal(right)) => left.absorb(right),
            (Node::Leaf(left), Node::Leaf(right)) => left.absorb(right),
            _ => unreachable!("siblings must be at the same level"),
        }
    }
}
