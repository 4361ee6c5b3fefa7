//! Kronecker-type products of cores and factor matrices
//!
//! These are the per-dimension building blocks of the Hadamard product of
//! two networks. Every product pairs a left operand index `a` with a right
//! operand index `b` as the combined index `a * n_b + b`, so rank axes
//! produced by different products stay compatible across dimensions.
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.

use scirs2_core::ndarray_ext::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use tensornet_core::{NetworkError, NetworkResult};

/// Kronecker product of two matrices
///
/// For A (m×n) and B (p×q) the result has shape (mp×nq):
///
/// ```text
/// [ a11*B  a12*B  ...  a1n*B ]
/// [  ...    ...   ...   ...  ]
/// [ am1*B  am2*B  ...  amn*B ]
/// ```
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tensornet_kernels::kronecker;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[5.0, 6.0], [7.0, 8.0]];
/// let c = kronecker(&a.view(), &b.view());
///
/// assert_eq!(c.shape(), &[4, 4]);
/// assert_eq!(c[[0, 2]], 10.0); // 2*5
/// ```
pub fn kronecker(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Array2<f64> {
    let (m, n) = a.dim();
    let (p, q) = b.dim();

    let mut result = Array2::<f64>::zeros((m * p, n * q));
    for ((i, j), &a_val) in a.indexed_iter() {
        if a_val == 0.0 {
            continue;
        }
        for ((bi, bj), &b_val) in b.indexed_iter() {
            result[[i * p + bi, j * q + bj]] = a_val * b_val;
        }
    }
    result
}

/// Row-wise Khatri-Rao (face-splitting) product
///
/// For A (I×P) and B (I×Q) the result has shape (I × PQ) and row i is the
/// Kronecker product of row i of A with row i of B.
///
/// # Errors
///
/// `DimensionMismatch` if the row counts differ.
pub fn row_khatri_rao(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> NetworkResult<Array2<f64>> {
    let (rows, p) = a.dim();
    let (rows_b, q) = b.dim();
    if rows != rows_b {
        return Err(NetworkError::dimension_mismatch(
            "row_khatri_rao",
            vec![rows],
            vec![rows_b],
        ));
    }

    let mut result = Array2::<f64>::zeros((rows, p * q));
    for i in 0..rows {
        for j in 0..p {
            let a_val = a[[i, j]];
            for k in 0..q {
                result[[i, j * q + k]] = a_val * b[[i, k]];
            }
        }
    }
    Ok(result)
}

/// Kronecker product on the rank axes, elementwise on the middle axis
///
/// `out[(la, lb), s, (ra, rb)] = a[la, s, ra] * b[lb, s, rb]`
///
/// # Errors
///
/// `DimensionMismatch` if the middle axes differ.
pub fn core_kronecker(a: &ArrayView3<f64>, b: &ArrayView3<f64>) -> NetworkResult<Array3<f64>> {
    let (la, sa, ra) = a.dim();
    let (lb, sb, rb) = b.dim();
    if sa != sb {
        return Err(NetworkError::dimension_mismatch(
            "core_kronecker",
            vec![sa],
            vec![sb],
        ));
    }

    let mut result = Array3::<f64>::zeros((la * lb, sa, ra * rb));
    for s in 0..sa {
        let a_slice = a.index_axis(Axis(1), s);
        let b_slice = b.index_axis(Axis(1), s);
        let block = kronecker(&a_slice, &b_slice);
        result.index_axis_mut(Axis(1), s).assign(&block);
    }
    Ok(result)
}

/// Kronecker product on every axis of two three-axis cores
///
/// `out[(la, lb), (sa, sb), (ra, rb)] = a[la, sa, ra] * b[lb, sb, rb]`
pub fn core_kronecker_features(a: &ArrayView3<f64>, b: &ArrayView3<f64>) -> Array3<f64> {
    let (la, sa, ra) = a.dim();
    let (lb, sb, rb) = b.dim();

    let mut result = Array3::<f64>::zeros((la * lb, sa * sb, ra * rb));
    for ((l1, s1, r1), &a_val) in a.indexed_iter() {
        if a_val == 0.0 {
            continue;
        }
        for ((l2, s2, r2), &b_val) in b.indexed_iter() {
            result[[l1 * lb + l2, s1 * sb + s2, r1 * rb + r2]] = a_val * b_val;
        }
    }
    result
}
