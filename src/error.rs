//! Error types for the index.

use crate::types::Key;
use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur in the index
#[derive(Error, Debug)]
pub enum IndexError {
    /// Branching factor below the supported minimum
    #[error("Invalid configuration: branching factor {branching_factor} (min: {min})")]
    InvalidConfiguration { branching_factor: usize, min: usize },

    /// Key is not present in the tree
    #[error("Key {0} not found")]
    NotFound(Key),

    /// Structural invariant violated (ordering, fill, cached maxima or leaf chain)
    #[error("Invalid key ordering: {0}")]
    InvalidKeyOrdering(String),

    /// Config or tree export could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    /// Create an invariant violation error with a message
    pub fn invalid_ordering(msg: impl Into<String>) -> Self {
        Self::InvalidKeyOrdering(msg.into())
    }

    /// Whether this is a lookup miss rather than a real failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::InvalidConfiguration {
            branching_factor: 2,
            min: 3,
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration: branching factor 2 (min: 3)"
        );
        assert_eq!(IndexError::NotFound(-7).to_string(), "Key -7 not found");
        assert!(IndexError::NotFound(1).is_not_found());
        assert!(!IndexError::invalid_ordering("x").is_not_found());
    }
}
