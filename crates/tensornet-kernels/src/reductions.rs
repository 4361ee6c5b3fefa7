//! Full reductions of a network
//!
//! Sums and means are contractions against an implicit rank-1 network of
//! (possibly weighted) ones; norms are inner products of a network with
//! itself. Nothing here decompresses the network.
//!
//! # Operations
//!
//! - [`sum`], [`mean`] - plain reductions
//! - [`weighted_sum`], [`weighted_mean`] - per-dimension weight vectors
//! - [`dot`], [`normsq`], [`norm`] - Frobenius inner product and norm

use crate::contraction::{contract_weighted, inner};
use scirs2_core::ndarray_ext::Array1;
use tensornet_core::{NetworkError, NetworkResult, TensorNetwork};

/// Sum of all entries
///
/// # Examples
///
/// ```
/// use tensornet_core::TensorNetwork;
/// use tensornet_kernels::sum;
///
/// let t = TensorNetwork::constant(&[4, 5], 2.0)?;
/// assert_eq!(sum(&t)?, 40.0);
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
pub fn sum(t: &TensorNetwork) -> NetworkResult<f64> {
    let ones: Vec<Array1<f64>> = t.shape().iter().map(|&i| Array1::ones(i)).collect();
    contract_weighted(t, &ones)
}

/// Mean of all entries
pub fn mean(t: &TensorNetwork) -> NetworkResult<f64> {
    Ok(sum(t)? / t.numel() as f64)
}

/// Σ_x w₁(x₁)⋯w_N(x_N)·T(x) with unnormalized weights
pub fn weighted_sum(t: &TensorNetwork, weights: &[Array1<f64>]) -> NetworkResult<f64> {
    contract_weighted(t, weights)
}

/// Expectation of T under independent per-dimension marginals.
///
/// Each marginal is normalized to sum to one first.
///
/// # Errors
///
/// `InvalidMarginal` for negative or all-zero weights, `DimensionMismatch`
/// if the marginals do not match the shape.
pub fn weighted_mean(t: &TensorNetwork, marginals: &[Array1<f64>]) -> NetworkResult<f64> {
    let normalized = marginals
        .iter()
        .enumerate()
        .map(|(n, w)| normalize_marginal(n, w))
        .collect::<NetworkResult<Vec<_>>>()?;
    contract_weighted(t, &normalized)
}

/// Scale a weight vector into a probability vector.
///
/// Exact zeros are allowed; negative, non-finite or all-zero weights are not.
pub fn normalize_marginal(dim: usize, weights: &Array1<f64>) -> NetworkResult<Array1<f64>> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(NetworkError::invalid_marginal(
            dim,
            format!("weight {} is negative or not finite", bad),
        ));
    }
    let total = weights.sum();
    if total <= 0.0 {
        return Err(NetworkError::invalid_marginal(dim, "weights sum to zero"));
    }
    Ok(weights / total)
}

/// Frobenius inner product ⟨a, b⟩
pub fn dot(a: &TensorNetwork, b: &TensorNetwork) -> NetworkResult<f64> {
    inner(a, b, None)
}

/// Squared Frobenius norm
pub fn normsq(t: &TensorNetwork) -> NetworkResult<f64> {
    dot(t, t)
}

/// Frobenius norm.
///
/// Round-off can push ⟨t, t⟩ slightly below zero for a numerically zero
/// network; the result is clamped at 0.
pub fn norm(t: &TensorNetwork) -> NetworkResult<f64> {
    Ok(normsq(t)?.max(0.0).sqrt())
}
