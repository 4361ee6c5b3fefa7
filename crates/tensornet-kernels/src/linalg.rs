//! Dense factorizations and core unfoldings used by the rounding sweeps.
//!
//! A train core G of shape (r_L × S × r_R) has two matrix unfoldings:
//!
//! ```text
//! left unfolding:  (r_L·S) × r_R     used by left-to-right QR
//! right unfolding: r_L × (S·r_R)     used by right-to-left SVD
//! ```
//!
//! Both are row-major reshapes, so folding an unfolding back with the same
//! dimensions restores the core exactly.
//!
//! The QR and SVD wrappers always return *thin* factors (k = min(m, n)
//! columns), whatever the backend returns.
//!
//! # References
//!
//! - Oseledets, I. V. (2011). "Tensor-Train Decomposition"

use scirs2_core::ndarray_ext::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3};
use scirs2_linalg::{qr, svd};
use tensornet_core::{NetworkError, NetworkResult};

/// Left unfolding (r_L·S) × r_R of a train core
pub fn unfold_left(core: &ArrayView3<f64>) -> NetworkResult<Array2<f64>> {
    let (r_left, n, r_right) = core.dim();
    core.to_shape((r_left * n, r_right))
        .map(|m| m.into_owned())
        .map_err(|e| NetworkError::linalg("unfold_left", e))
}

/// Right unfolding r_L × (S·r_R) of a train core
pub fn unfold_right(core: &ArrayView3<f64>) -> NetworkResult<Array2<f64>> {
    let (r_left, n, r_right) = core.dim();
    core.to_shape((r_left, n * r_right))
        .map(|m| m.into_owned())
        .map_err(|e| NetworkError::linalg("unfold_right", e))
}

/// Fold a matrix with r_L·S·r_R elements back into a (r_L, S, r_R) core
pub fn fold_core(matrix: &ArrayView2<f64>, dims: (usize, usize, usize)) -> NetworkResult<Array3<f64>> {
    matrix
        .to_shape(dims)
        .map(|c| c.into_owned())
        .map_err(|e| NetworkError::linalg("fold_core", e))
}

/// Thin QR decomposition A = Q·R with Q (m×k) orthonormal, k = min(m, n).
///
/// Wide matrices go through the SVD (Q = U, R = Σ·Vᵀ); R is then not
/// triangular, which the sweeps do not require.
pub fn thin_qr(matrix: &ArrayView2<f64>) -> NetworkResult<(Array2<f64>, Array2<f64>)> {
    let (m, n) = matrix.dim();
    let k = m.min(n);

    if m >= n {
        let (q, r) = qr(matrix, None).map_err(|e| NetworkError::linalg("thin_qr", e))?;
        Ok((
            q.slice(s![.., ..k]).to_owned(),
            r.slice(s![..k, ..]).to_owned(),
        ))
    } else {
        let (u, sigma, vt) = thin_svd(matrix)?;
        let mut r = vt;
        for (mut row, &sv) in r.rows_mut().into_iter().zip(sigma.iter()) {
            row.mapv_inplace(|v| v * sv);
        }
        Ok((u, r))
    }
}

/// Thin SVD A = U·diag(σ)·Vᵀ with k = min(m, n) singular triplets,
/// singular values in descending order
pub fn thin_svd(
    matrix: &ArrayView2<f64>,
) -> NetworkResult<(Array2<f64>, Array1<f64>, Array2<f64>)> {
    let (m, n) = matrix.dim();
    let k = m.min(n);

    let (u, sigma, vt) =
        svd(matrix, false, None).map_err(|e| NetworkError::linalg("thin_svd", e))?;
    Ok((
        u.slice(s![.., ..k]).to_owned(),
        sigma.slice(s![..k]).to_owned(),
        vt.slice(s![..k, ..]).to_owned(),
    ))
}

/// Smallest rank whose discarded tail energy stays within `max_tail_sq`.
///
/// The rank r is chosen such that:
/// ```text
/// ∑_{i=r}^{n-1} σᵢ² ≤ max_tail_sq
/// ```
/// With `max_tail_sq == 0` only exactly-zero singular values are dropped.
/// The result is at least 1.
pub fn truncation_rank(singular_values: &ArrayView1<f64>, max_tail_sq: f64) -> usize {
    let n = singular_values.len();
    let mut tail = 0.0;
    let mut rank = n;

    for i in (0..n).rev() {
        let next = tail + singular_values[i] * singular_values[i];
        if next > max_tail_sq {
            break;
        }
        tail = next;
        rank = i;
    }

    rank.max(1)
}

/// Square root and pseudo-inverse square root of a symmetric positive
/// semi-definite matrix such as a Gram matrix.
///
/// Eigenvalues below `1e-12 · λ_max` count as zero: they are kept in the
/// root and dropped from the pseudo-inverse root.
pub fn psd_sqrt(gram: &ArrayView2<f64>) -> NetworkResult<(Array2<f64>, Array2<f64>)> {
    let (u, lambda, _) = thin_svd(gram)?;
    let cutoff = lambda.iter().cloned().fold(0.0, f64::max) * 1e-12;

    let root = lambda.mapv(|l| l.max(0.0).sqrt());
    let inverse_root = lambda.mapv(|l| if l > cutoff { 1.0 / l.sqrt() } else { 0.0 });
    Ok((symmetric_product(&u, &root), symmetric_product(&u, &inverse_root)))
}

/// U·diag(d)·Uᵀ
fn symmetric_product(u: &Array2<f64>, d: &Array1<f64>) -> Array2<f64> {
    (u * d).dot(&u.t())
}

/// Largest entry of |QᵀQ − I|
pub fn orthogonality_defect(q: &ArrayView2<f64>) -> f64 {
    let gram = q.t().dot(q);
    gram.indexed_iter()
        .map(|((i, j), &v)| {
            let target = if i == j { 1.0 } else { 0.0 };
            (v - target).abs()
        })
        .fold(0.0, f64::max)
}
