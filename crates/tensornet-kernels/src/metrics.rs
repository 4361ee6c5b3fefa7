//! Error metrics between networks and per-network statistics
//!
//! All metrics are computed from inner products, so comparing two
//! compressed networks never decompresses either of them.

use crate::contraction::check_same_shape;
use crate::reductions::{dot, mean, normsq};
use tensornet_core::{NetworkError, NetworkResult, TensorNetwork};

/// Relative size below which a variance counts as zero in [`r_squared`]
const DEGENERATE_VARIANCE: f64 = 1e-12;

/// Frobenius distance ‖a − b‖ via ‖a‖² + ‖b‖² − 2⟨a, b⟩, clamped at 0
pub fn dist(a: &TensorNetwork, b: &TensorNetwork) -> NetworkResult<f64> {
    check_same_shape("dist", a, b)?;
    let squared = normsq(a)? + normsq(b)? - 2.0 * dot(a, b)?;
    Ok(squared.max(0.0).sqrt())
}

/// ‖gt − approx‖ / ‖gt‖
///
/// A zero `gt` gives 0 when `approx` is zero too.
///
/// # Errors
///
/// `InvalidArgument` when `gt` is zero and `approx` is not.
pub fn relative_error(gt: &TensorNetwork, approx: &TensorNetwork) -> NetworkResult<f64> {
    let reference = normsq(gt)?.max(0.0).sqrt();
    let error = dist(gt, approx)?;
    if reference == 0.0 {
        if error == 0.0 {
            return Ok(0.0);
        }
        return Err(NetworkError::invalid_argument(
            "relative_error",
            "ground truth is zero",
        ));
    }
    Ok(error / reference)
}

/// Root mean squared error over all entries
pub fn rmse(gt: &TensorNetwork, approx: &TensorNetwork) -> NetworkResult<f64> {
    Ok(dist(gt, approx)? / (gt.numel() as f64).sqrt())
}

/// Coefficient of determination 1 − ‖gt − approx‖² / ‖gt − mean(gt)‖²
///
/// A constant `gt` (variance below 1e-12 of its mean square) gives 1 when
/// `approx` matches it to the same tolerance.
///
/// # Errors
///
/// `InvalidArgument` when `gt` is constant and `approx` differs from it.
pub fn r_squared(gt: &TensorNetwork, approx: &TensorNetwork) -> NetworkResult<f64> {
    let residual = dist(gt, approx)?.powi(2);
    let total = variance(gt)? * gt.numel() as f64;
    let floor = DEGENERATE_VARIANCE * normsq(gt)?.max(0.0);
    if total <= floor {
        if residual <= floor {
            return Ok(1.0);
        }
        return Err(NetworkError::invalid_argument(
            "r_squared",
            "ground truth is constant",
        ));
    }
    Ok(1.0 - residual / total)
}

/// Population variance of the entries, E[T²] − E[T]²
pub fn variance(t: &TensorNetwork) -> NetworkResult<f64> {
    let numel = t.numel() as f64;
    let m = mean(t)?;
    Ok((normsq(t)? / numel - m * m).max(0.0))
}

/// Standard deviation of the entries
pub fn std_dev(t: &TensorNetwork) -> NetworkResult<f64> {
    Ok(variance(t)?.sqrt())
}
