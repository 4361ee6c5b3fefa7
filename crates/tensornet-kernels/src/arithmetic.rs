//! Sums and elementwise products of networks
//!
//! Both operations build the result dimension by dimension from the two
//! operands' cores. No dense array is ever formed.
//!
//! # Sum
//!
//! Block-diagonal direct sum on the rank axes, plain stacking on the two
//! boundary rank axes:
//!
//! ```text
//!          [ A(i)   0  ]                          [ A(i) ]
//! C(i) =   [  0   B(i) ]     C₁(i) = [A(i) B(i)]   C_N(i) = [ B(i) ]
//! ```
//!
//! Internal junction ranks are exactly r_A + r_B. Factors are concatenated
//! column-wise (an identity stands in for a missing factor) and the core
//! feature axes are stacked accordingly.
//!
//! # Hadamard product
//!
//! Kronecker product on the rank axes, elementwise on the ambient axis.
//! Ranks multiply.

use crate::ambient::{core_as_train, AmbientCore};
use crate::contraction::check_same_shape;
use crate::products::{core_kronecker, core_kronecker_features, kronecker, row_khatri_rao};
use scirs2_core::ndarray_ext::{s, Array2, Array3};
use tensornet_core::{Block2, Core, NetworkResult, TensorNetwork};

/// Elementwise sum a + b
///
/// # Errors
///
/// `DimensionMismatch` if the ambient shapes differ.
///
/// # Examples
///
/// ```
/// use tensornet_core::{RankSpec, TensorNetwork};
/// use tensornet_kernels::add;
///
/// let a = TensorNetwork::random(&[4, 4, 4], &RankSpec::train(3, 2), 0)?;
/// let b = TensorNetwork::random(&[4, 4, 4], &RankSpec::train(3, 3), 1)?;
/// let c = add(&a, &b)?;
/// assert_eq!(c.ranks_tt(), vec![1, 5, 5, 1]);
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
pub fn add(a: &TensorNetwork, b: &TensorNetwork) -> NetworkResult<TensorNetwork> {
    check_same_shape("add", a, b)?;

    let n_dims = a.ndim();
    let mut cores = Vec::with_capacity(n_dims);
    let mut factors = Vec::with_capacity(n_dims);
    for n in 0..n_dims {
        let factor = stacked_factor(a, b, n);
        let stacked = factor.is_some();
        cores.push(sum_core(a.core(n), b.core(n), n, n_dims, stacked));
        factors.push(factor.map(Block2::new));
    }

    TensorNetwork::new(cores, factors)
}

/// Elementwise difference a − b
pub fn sub(a: &TensorNetwork, b: &TensorNetwork) -> NetworkResult<TensorNetwork> {
    add(a, &neg(b)?)
}

/// Multiply every entry by `alpha`.
///
/// Only the first core is rewritten; every other block is shared with `t`.
pub fn scale(t: &TensorNetwork, alpha: f64) -> NetworkResult<TensorNetwork> {
    let (mut cores, factors) = t.clone().into_parts();
    let first = match &cores[0] {
        Core::Train(block) => Core::train(block.read().mapv(|v| v * alpha)),
        Core::Parafac(block) => Core::parafac(block.read().mapv(|v| v * alpha)),
    };
    cores[0] = first;
    TensorNetwork::new(cores, factors)
}

/// Elementwise negation
pub fn neg(t: &TensorNetwork) -> NetworkResult<TensorNetwork> {
    scale(t, -1.0)
}

/// Elementwise (Hadamard) product a ⊙ b
///
/// When both operands carry a factor at a dimension the result keeps a
/// factor there (row-wise Khatri-Rao of the two factors) and the cores are
/// Kronecker'd over their feature axes too. Otherwise the factors are folded
/// into the cores first. Two parafac cores give a parafac core.
///
/// # Errors
///
/// `DimensionMismatch` if the ambient shapes differ.
pub fn hadamard(a: &TensorNetwork, b: &TensorNetwork) -> NetworkResult<TensorNetwork> {
    check_same_shape("hadamard", a, b)?;

    let n_dims = a.ndim();
    let mut cores = Vec::with_capacity(n_dims);
    let mut factors = Vec::with_capacity(n_dims);
    for n in 0..n_dims {
        match (a.factor(n), b.factor(n)) {
            (Some(fa), Some(fb)) => {
                let factor = row_khatri_rao(&fa.read().view(), &fb.read().view())?;
                let core = match (a.core(n), b.core(n)) {
                    (Core::Parafac(pa), Core::Parafac(pb)) => {
                        Core::parafac(kronecker(&pa.read().view(), &pb.read().view()))
                    }
                    (ca, cb) => Core::train(core_kronecker_features(
                        &core_as_train(ca, n, n_dims).view(),
                        &core_as_train(cb, n, n_dims).view(),
                    )),
                };
                cores.push(core);
                factors.push(Some(Block2::new(factor)));
            }
            _ => {
                let ga = AmbientCore::new(a, n);
                let gb = AmbientCore::new(b, n);
                let core = match (&ga, &gb) {
                    (
                        AmbientCore::Parafac { rows: ra, .. },
                        AmbientCore::Parafac { rows: rb, .. },
                    ) => Core::parafac(row_khatri_rao(&ra.view(), &rb.view())?),
                    _ => Core::train(core_kronecker(
                        &ga.to_train().view(),
                        &gb.to_train().view(),
                    )?),
                };
                cores.push(core);
                factors.push(None);
            }
        }
    }

    TensorNetwork::new(cores, factors)
}

/// [U_A U_B] for dimension `n`, or `None` if neither operand has a factor
fn stacked_factor(a: &TensorNetwork, b: &TensorNetwork, n: usize) -> Option<Array2<f64>> {
    if a.factor(n).is_none() && b.factor(n).is_none() {
        return None;
    }
    let size = a.shape()[n];
    let ua = a.factor(n).map_or_else(|| Array2::eye(size), Block2::to_array);
    let ub = b.factor(n).map_or_else(|| Array2::eye(size), Block2::to_array);
    let (sa, sb) = (ua.ncols(), ub.ncols());

    let mut stacked = Array2::<f64>::zeros((size, sa + sb));
    stacked.slice_mut(s![.., ..sa]).assign(&ua);
    stacked.slice_mut(s![.., sa..]).assign(&ub);
    Some(stacked)
}

fn sum_core(a: &Core, b: &Core, n: usize, n_dims: usize, stacked: bool) -> Core {
    if let (Core::Parafac(pa), Core::Parafac(pb)) = (a, b) {
        let pa = pa.read();
        let pb = pb.read();
        let (sa, ra) = pa.dim();
        let (sb, rb) = pb.dim();
        let feature_offset = if stacked { sa } else { 0 };

        let mut out = Array2::<f64>::zeros((feature_offset + sb, ra + rb));
        out.slice_mut(s![..sa, ..ra]).assign(&*pa);
        out.slice_mut(s![feature_offset.., ra..]).assign(&*pb);
        return Core::parafac(out);
    }

    let ga = core_as_train(a, n, n_dims);
    let gb = core_as_train(b, n, n_dims);
    let (la, sa, ra) = ga.dim();
    let (lb, sb, rb) = gb.dim();
    let first = n == 0;
    let last = n + 1 == n_dims;

    let left_offset = if first { 0 } else { la };
    let feature_offset = if stacked { sa } else { 0 };
    let right_offset = if last { 0 } else { ra };

    let mut out = Array3::<f64>::zeros((
        left_offset + lb,
        feature_offset + sb,
        right_offset + rb,
    ));
    {
        let mut block = out.slice_mut(s![..la, ..sa, ..ra]);
        block += &ga;
    }
    {
        let mut block = out.slice_mut(s![
            left_offset..left_offset + lb,
            feature_offset..feature_offset + sb,
            right_offset..right_offset + rb
        ]);
        block += &gb;
    }
    Core::train(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contraction::full;
    use scirs2_core::ndarray_ext::ArrayD;
    use tensornet_core::{NetworkConfig, NetworkError, RankSpec};

    fn dense(t: &TensorNetwork) -> ArrayD<f64> {
        full(t, &NetworkConfig::default()).unwrap()
    }

    fn assert_close(a: &ArrayD<f64>, b: &ArrayD<f64>) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-10, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_add_train_ranks_and_values() {
        let a = TensorNetwork::random(&[3, 4, 5, 2], &RankSpec::train(4, 2), 1).unwrap();
        let b = TensorNetwork::random(&[3, 4, 5, 2], &RankSpec::train(4, 3), 2).unwrap();
        let c = add(&a, &b).unwrap();

        assert_eq!(c.ranks_tt(), vec![1, 5, 5, 5, 1]);
        assert_close(&dense(&c), &(dense(&a) + dense(&b)));
    }

    #[test]
    fn test_add_mixed_kinds_and_factors() {
        let spec_a = RankSpec::train(3, 2).with_parafac_at(1, 3).with_tucker_at(0, 2);
        let spec_b = RankSpec::parafac(3, 2).with_tucker_at(2, 3);
        let a = TensorNetwork::random(&[4, 5, 6], &spec_a, 3).unwrap();
        let b = TensorNetwork::random(&[4, 5, 6], &spec_b, 4).unwrap();
        let c = add(&a, &b).unwrap();

        assert_eq!(c.ranks_tt(), vec![1, 5, 5, 1]);
        assert_eq!(c.ranks_tucker(), vec![Some(2 + 4), None, Some(6 + 3)]);
        assert_close(&dense(&c), &(dense(&a) + dense(&b)));
    }

    #[test]
    fn test_add_parafac_stays_parafac() {
        let a = TensorNetwork::random(&[4, 5, 6], &RankSpec::parafac(3, 2), 5).unwrap();
        let b = TensorNetwork::random(&[4, 5, 6], &RankSpec::parafac(3, 3), 6).unwrap();
        let c = add(&a, &b).unwrap();

        assert!(c.cores().iter().all(|core| core.parafac_rank() == Some(5)));
        assert_close(&dense(&c), &(dense(&a) + dense(&b)));
    }

    #[test]
    fn test_add_single_dimension() {
        let a = TensorNetwork::rank_one(&[vec![1.0, 2.0, 3.0]]).unwrap();
        let b = TensorNetwork::rank_one(&[vec![10.0, 20.0, 30.0]]).unwrap();
        let c = add(&a, &b).unwrap();

        assert_eq!(c.ranks_tt(), vec![1, 1]);
        assert_close(&dense(&c), &(dense(&a) + dense(&b)));
    }

    #[test]
    fn test_sub_and_scale() {
        let a = TensorNetwork::random(&[3, 3, 3], &RankSpec::train(3, 2), 7).unwrap();
        let b = TensorNetwork::random(&[3, 3, 3], &RankSpec::parafac(3, 2), 8).unwrap();

        assert_close(&dense(&sub(&a, &b).unwrap()), &(dense(&a) - dense(&b)));
        assert_close(&dense(&scale(&a, 2.5).unwrap()), &(dense(&a) * 2.5));
    }

    #[test]
    fn test_hadamard_matches_dense() {
        let spec_a = RankSpec::train(3, 2).with_tucker(2).with_parafac_at(2, 2);
        let spec_b = RankSpec::train(3, 3).with_tucker_at(0, 3);
        let a = TensorNetwork::random(&[4, 5, 6], &spec_a, 9).unwrap();
        let b = TensorNetwork::random(&[4, 5, 6], &spec_b, 10).unwrap();
        let c = hadamard(&a, &b).unwrap();

        assert_eq!(c.ranks_tt(), vec![1, 6, 6, 1]);
        assert_eq!(c.ranks_tucker()[0], Some(6));
        assert_close(&dense(&c), &(dense(&a) * dense(&b)));
    }

    #[test]
    fn test_hadamard_parafac_stays_parafac() {
        let a = TensorNetwork::random(&[4, 5, 6], &RankSpec::parafac(3, 2), 11).unwrap();
        let b = TensorNetwork::random(&[4, 5, 6], &RankSpec::parafac(3, 3).with_tucker(2), 12)
            .unwrap();
        let c = hadamard(&a, &b).unwrap();

        assert!(c.cores().iter().all(|core| core.parafac_rank() == Some(6)));
        assert_close(&dense(&c), &(dense(&a) * dense(&b)));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = TensorNetwork::ones(&[3, 4]).unwrap();
        let b = TensorNetwork::ones(&[4, 3]).unwrap();
        assert!(matches!(
            add(&a, &b),
            Err(NetworkError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            hadamard(&a, &b),
            Err(NetworkError::DimensionMismatch { .. })
        ));
    }
}
