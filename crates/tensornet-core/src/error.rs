//! Error types for tensor network construction and algebra
//!
//! Every operation in the tensornet stack reports failures through
//! [`NetworkError`]. Nothing is recovered internally: errors propagate to the
//! caller unchanged.

use thiserror::Error;

/// Error type for tensor network operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Adjacency or ambient-shape invariant violated between two dimensions
    #[error("shape mismatch between dimensions {} and {}: {reason}", .dims.0, .dims.1)]
    ShapeMismatch { dims: (usize, usize), reason: String },

    /// Two operands disagree on their ambient shapes
    #[error("{operation}: dimension mismatch - expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        operation: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Full decompression would exceed the configured element ceiling
    #[error("refusing to materialize {requested} elements (limit is {limit})")]
    OversizeMaterialization { requested: usize, limit: usize },

    /// Mask references an invalid dimension or combines literals inconsistently
    #[error("invalid mask: {reason}")]
    InvalidMask { reason: String },

    /// Rounding target below what the junction can represent
    #[error(
        "rank target {requested} infeasible at junction {junction} (minimum representable rank is {minimum})"
    )]
    RankTargetInfeasible {
        junction: usize,
        requested: usize,
        minimum: usize,
    },

    /// Index outside the ambient range of a dimension
    #[error("index {index} out of bounds for dimension {dim} of size {size}")]
    IndexOutOfBounds { dim: usize, index: usize, size: usize },

    /// Marginal weight vector that cannot be normalized into a distribution
    #[error("invalid marginal for dimension {dim}: {reason}")]
    InvalidMarginal { dim: usize, reason: String },

    /// Argument outside the domain of an operation
    #[error("{operation}: {reason}")]
    InvalidArgument { operation: String, reason: String },

    /// Dense factorization failure reported by the linear algebra backend
    #[error("{operation}: linear algebra failure: {message}")]
    Linalg { operation: String, message: String },
}

/// Result alias used across the tensornet crates
pub type NetworkResult<T> = Result<T, NetworkError>;

impl NetworkError {
    /// Create a shape mismatch error for the dimension pair `(a, b)`
    pub fn shape_mismatch(a: usize, b: usize, reason: impl Into<String>) -> Self {
        NetworkError::ShapeMismatch {
            dims: (a, b),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(
        operation: impl Into<String>,
        expected: Vec<usize>,
        actual: Vec<usize>,
    ) -> Self {
        NetworkError::DimensionMismatch {
            operation: operation.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid mask error
    pub fn invalid_mask(reason: impl Into<String>) -> Self {
        NetworkError::InvalidMask {
            reason: reason.into(),
        }
    }

    /// Create an invalid marginal error
    pub fn invalid_marginal(dim: usize, reason: impl Into<String>) -> Self {
        NetworkError::InvalidMarginal {
            dim,
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        NetworkError::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a linear algebra backend failure
    pub fn linalg(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        NetworkError::Linalg {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}
