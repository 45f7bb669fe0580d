//! Common types used throughout the index.

mod node_id;

pub use node_id::NodeId;

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Key type stored in the tree
pub type Key = i64;

/// Smallest branching factor the tree accepts
pub const MIN_BRANCHING_FACTOR: usize = 3;

/// Default branching factor (small enough to keep exported trees readable)
pub const DEFAULT_BRANCHING_FACTOR: usize = 4;

/// A key/value pair stored in a leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<V> {
    pub key: Key,
    pub value: V,
}

impl<V> Record<V> {
    /// Create a new record
    pub fn new(key: Key, value: V) -> Self {
        Self { key, value }
    }

    /// Split into a `(key, value)` tuple
    pub fn into_pair(self) -> (Key, V) {
        (self.key, self.value)
    }
}

/// Tree configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BTreeConfig {
    /// Maximum children per internal node and maximum records per leaf (M)
    pub branching_factor: usize,
}

impl Default for BTreeConfig {
    fn default() -> Self {
        Self {
            branching_factor: DEFAULT_BRANCHING_FACTOR,
        }
    }
}

impl BTreeConfig {
    /// Create a new config, clamping the branching factor to the minimum
    pub fn new(branching_factor: usize) -> Self {
        if branching_factor < MIN_BRANCHING_FACTOR {
            tracing::debug!(
                requested = branching_factor,
                clamped = MIN_BRANCHING_FACTOR,
                "branching factor below minimum, clamping"
            );
        }
        Self {
            branching_factor: branching_factor.max(MIN_BRANCHING_FACTOR),
        }
    }

    /// Parse a config from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the branching factor without clamping
    pub fn validate(&self) -> Result<()> {
        if self.branching_factor < MIN_BRANCHING_FACTOR {
            return Err(IndexError::InvalidConfiguration {
                branching_factor: self.branching_factor,
                min: MIN_BRANCHING_FACTOR,
            });
        }
        Ok(())
    }

    /// Minimum children/records for a non-root node: ceil(M/2)
    pub fn min_fill(&self) -> usize {
        (self.branching_factor + 1) / 2
    }
}
