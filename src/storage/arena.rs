//! Slot arena owning every node of a tree.

use super::FreeList;
use crate::node::{InternalNode, LeafNode, Node};
use crate::types::NodeId;

/// Arena of tree nodes.
///
/// Accessors panic on a released or mistyped id: that can only happen if
/// the tree's own bookkeeping is broken, never because of caller input.
#[derive(Debug)]
pub struct NodeArena<V> {
    slots: Vec<Option<Node<V>>>,
    free_list: FreeList,
}

impl<V> Default for NodeArena<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> NodeArena<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: FreeList::new(),
        }
    }

    /// Store a node, reusing a released slot when one is available
    pub fn alloc(&mut self, node: Node<V>) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId::new(self.slots.len() as u32);
        self.slots.push(Some(node));
        id
    }

    /// Take a node out of the arena and free its slot
    pub fn release(&mut self, id: NodeId) -> Node<V> {
        match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.free_list.push(id);
                node
            }
            None => panic!("node {id} released twice or never allocated"),
        }
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }

    /// Number of allocated (live) nodes
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Number of slots ever allocated, live or free
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    pub fn node(&self, id: NodeId) -> &Node<V> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling node {id}"),
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling node {id}"),
        }
    }

    pub fn leaf(&self, id: NodeId) -> &LeafNode<V> {
        match self.node(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node {id} is not a leaf"),
        }
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<V> {
        match self.node_mut(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node {id} is not a leaf"),
        }
    }

    pub fn internal(&self, id: NodeId) -> &InternalNode {
        match self.node(id) {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("node {id} is not internal"),
        }
    }

    pub fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode {
        match self.node_mut(id) {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("node {id} is not internal"),
        }
    }
}
