//! Engine configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default ceiling for full decompression (64M elements, 512 MiB of `f64`)
pub const DEFAULT_MAX_DENSE_ELEMENTS: usize = 1 << 26;

/// Configuration shared by the contraction and rounding engines
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    /// Largest number of elements a full decompression may produce
    pub max_dense_elements: usize,
    /// Tolerance used when checking orthogonality of swept cores
    pub orthogonality_tolerance: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_dense_elements: DEFAULT_MAX_DENSE_ELEMENTS,
            orthogonality_tolerance: 1e-10,
        }
    }
}

impl NetworkConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decompression ceiling
    pub fn max_dense_elements(mut self, limit: usize) -> Self {
        self.max_dense_elements = limit;
        self
    }

    /// Set the orthogonality tolerance
    pub fn orthogonality_tolerance(mut self, tol: f64) -> Self {
        self.orthogonality_tolerance = tol;
        self
    }

    /// Lift the decompression ceiling entirely
    pub fn unbounded(mut self) -> Self {
        self.max_dense_elements = usize::MAX;
        self
    }
}
