//! Structural statistics.

/// Snapshot of tree shape and structural change counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of records stored
    pub len: usize,
    /// Number of levels (an empty tree has height 1)
    pub height: usize,
    /// Number of leaf nodes
    pub leaf_nodes: usize,
    /// Number of internal nodes
    pub internal_nodes: usize,
    /// Number of leaf splits performed
    pub leaf_splits: u64,
    /// Number of internal node splits performed
    pub internal_splits: u64,
    /// Number of leaf merges performed
    pub leaf_merges: u64,
    /// Number of internal node merges performed
    pub internal_merges: u64,
    /// Number of records or children moved between siblings
    pub borrows: u64,
    /// Number of times the root split (height grew)
    pub root_splits: u64,
    /// Number of times the root collapsed into its only child
    pub root_collapses: u64,
}

/// Running counters kept by the tree; mutated under the write lock.
#[derive(Default, Debug, Clone, Copy)]
pub(crate) struct Counters {
    pub leaf_splits: u64,
    pub internal_splits: u64,
    pub leaf_merges: u64,
    pub internal_merges: u64,
    pub borrows: u64,
    pub root_splits: u64,
    pub root_collapses: u64,
}

impl Counters {
    pub fn record_split(&mut self, leaf: bool) {
        if leaf {
            self.leaf_splits += 1;
        } else {
            self.internal_splits += 1;
        }
    }

    pub fn record_merge(&mut self, leaf: bool) {
        if leaf {
            self.leaf_merges += 1;
        } else {
            self.internal_merges += 1;
        }
    }
}
