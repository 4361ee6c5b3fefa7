//! Left-to-right chain contraction
//!
//! Every routine here keeps a running frontier matrix, starts it at the
//! scalar 1 and folds one ambient core into it per dimension:
//!
//! | routine | frontier | result |
//! |---|---|---|
//! | [`full`] | (∏ Iₖ so far) × r | dense array |
//! | [`evaluate`] | 1 × r per point | one value per point |
//! | [`contract_weighted`] | 1 × r | scalar |
//! | [`inner`] | r_A × r_B | scalar |
//!
//! Only [`full`] grows with the ambient shape, and it is guarded by
//! [`NetworkConfig::max_dense_elements`].

use crate::ambient::AmbientCore;
use scirs2_core::ndarray_ext::{Array1, Array2, ArrayD, IxDyn};
use tensornet_core::{NetworkConfig, NetworkError, NetworkResult, TensorNetwork};

/// Decompress a network into a dense array.
///
/// # Errors
///
/// `OversizeMaterialization` if the array would hold more than
/// `config.max_dense_elements` entries.
///
/// # Examples
///
/// ```
/// use tensornet_core::{NetworkConfig, RankSpec, TensorNetwork};
/// use tensornet_kernels::full;
///
/// let t = TensorNetwork::random(&[3, 4, 5], &RankSpec::train(3, 2), 0)?;
/// let dense = full(&t, &NetworkConfig::default())?;
/// assert_eq!(dense.shape(), &[3, 4, 5]);
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
pub fn full(t: &TensorNetwork, config: &NetworkConfig) -> NetworkResult<ArrayD<f64>> {
    let requested = t
        .shape()
        .iter()
        .try_fold(1usize, |acc, &i| acc.checked_mul(i))
        .unwrap_or(usize::MAX);
    if requested > config.max_dense_elements {
        log::warn!(
            "refusing to decompress shape {:?} ({} elements, limit {})",
            t.shape(),
            requested,
            config.max_dense_elements
        );
        return Err(NetworkError::OversizeMaterialization {
            requested,
            limit: config.max_dense_elements,
        });
    }

    let mut frontier = Array2::<f64>::ones((1, 1));
    for (n, core) in AmbientCore::all(t).iter().enumerate() {
        frontier = core.expand(&frontier.view())?;
        log::trace!("full: dimension {} frontier {:?}", n, frontier.dim());
    }

    frontier
        .into_shape_with_order(IxDyn(t.shape()))
        .map_err(|e| NetworkError::linalg("full", e))
}

/// Evaluate the network at a batch of multi-indices.
///
/// # Errors
///
/// `DimensionMismatch` if a point does not have N coordinates,
/// `IndexOutOfBounds` if a coordinate exceeds its dimension.
pub fn evaluate(t: &TensorNetwork, points: &[Vec<usize>]) -> NetworkResult<Array1<f64>> {
    let n_dims = t.ndim();
    for point in points {
        if point.len() != n_dims {
            return Err(NetworkError::dimension_mismatch(
                "evaluate",
                vec![n_dims],
                vec![point.len()],
            ));
        }
        for (dim, (&index, &size)) in point.iter().zip(t.shape()).enumerate() {
            if index >= size {
                return Err(NetworkError::IndexOutOfBounds { dim, index, size });
            }
        }
    }

    let cores = AmbientCore::all(t);
    let values = points
        .iter()
        .map(|point| {
            let mut frontier = Array2::<f64>::ones((1, 1));
            for (core, &i) in cores.iter().zip(point) {
                frontier = core.apply(&frontier.view(), i);
            }
            frontier[[0, 0]]
        })
        .collect();
    Ok(values)
}

/// Contract every ambient axis against a weight vector: Σ_x w₁(x₁)⋯w_N(x_N)·T(x).
///
/// This is the reduction primitive behind sums and means.
///
/// # Errors
///
/// `DimensionMismatch` if the number or lengths of the weight vectors do
/// not match the network's shape.
pub fn contract_weighted(t: &TensorNetwork, weights: &[Array1<f64>]) -> NetworkResult<f64> {
    check_weights("contract_weighted", t.shape(), weights)?;

    let mut frontier = Array2::<f64>::ones((1, 1));
    for (n, w) in weights.iter().enumerate() {
        let core = AmbientCore::new(t, n);
        frontier = core.apply_weighted(&frontier.view(), &w.view());
    }
    Ok(frontier[[0, 0]])
}

/// (Weighted) inner product Σ_x w(x)·A(x)·B(x) of two networks.
///
/// The two networks are contracted in lockstep with an (r_A × r_B)
/// frontier:
///
/// ```text
/// P ← Σᵢ wᵢ · Aₙ(i)ᵀ · P · Bₙ(i)
/// ```
///
/// # Errors
///
/// `DimensionMismatch` if the ambient shapes differ or the weights do not
/// match them.
pub fn inner(
    a: &TensorNetwork,
    b: &TensorNetwork,
    weights: Option<&[Array1<f64>]>,
) -> NetworkResult<f64> {
    check_same_shape("inner", a, b)?;
    if let Some(weights) = weights {
        check_weights("inner", a.shape(), weights)?;
    }

    let mut frontier = Array2::<f64>::ones((1, 1));
    for n in 0..a.ndim() {
        let core_a = AmbientCore::new(a, n);
        let core_b = AmbientCore::new(b, n);
        let (_, r_a) = core_a.ranks();
        let (_, r_b) = core_b.ranks();

        let mut next = Array2::<f64>::zeros((r_a, r_b));
        for i in 0..core_a.size() {
            let w = weights.map_or(1.0, |ws| ws[n][i]);
            if w == 0.0 {
                continue;
            }
            // (Aᵀ P B) = ((P B)ᵀ A)ᵀ
            let pb = core_b.apply(&frontier.view(), i);
            let pba = core_a.apply(&pb.t(), i);
            next.scaled_add(w, &pba.t());
        }
        frontier = next;
        log::trace!("inner: dimension {} frontier {:?}", n, frontier.dim());
    }
    Ok(frontier[[0, 0]])
}

/// Fail with `DimensionMismatch` unless both networks share an ambient shape
pub fn check_same_shape(
    operation: &str,
    a: &TensorNetwork,
    b: &TensorNetwork,
) -> NetworkResult<()> {
    if a.shape() != b.shape() {
        return Err(NetworkError::dimension_mismatch(
            operation,
            a.shape().to_vec(),
            b.shape().to_vec(),
        ));
    }
    Ok(())
}

fn check_weights(operation: &str, shape: &[usize], weights: &[Array1<f64>]) -> NetworkResult<()> {
    let lengths: Vec<usize> = weights.iter().map(|w| w.len()).collect();
    if lengths != shape {
        return Err(NetworkError::dimension_mismatch(
            operation,
            shape.to_vec(),
            lengths,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::{array, Array3};
    use tensornet_core::{Block2, RankSpec};

    #[test]
    fn test_full_matches_evaluate() {
        let spec = RankSpec::train(3, 2).with_parafac_at(2, 2).with_tucker_at(0, 2);
        let t = TensorNetwork::random(&[3, 4, 5], &spec, 1).unwrap();
        let dense = full(&t, &NetworkConfig::default()).unwrap();

        let points = vec![vec![0, 0, 0], vec![2, 3, 4], vec![1, 2, 3]];
        let values = evaluate(&t, &points).unwrap();
        for (p, v) in points.iter().zip(values.iter()) {
            assert!((dense[IxDyn(p)] - v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_full_cp_matches_formula() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[0.5, -1.0], [2.0, 1.0], [1.0, 0.0]];
        let t = TensorNetwork::from_parafac_blocks(vec![Block2::new(a.clone()), Block2::new(b.clone())])
            .unwrap();
        let dense = full(&t, &NetworkConfig::default()).unwrap();

        for i in 0..2 {
            for j in 0..3 {
                let expected: f64 = (0..2).map(|r| a[[i, r]] * b[[j, r]]).sum();
                assert!((dense[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_full_refuses_oversize() {
        let t = TensorNetwork::ones(&[100, 100, 100]).unwrap();
        let config = NetworkConfig::default().max_dense_elements(1000);
        assert!(matches!(
            full(&t, &config),
            Err(NetworkError::OversizeMaterialization {
                requested: 1_000_000,
                limit: 1000
            })
        ));
    }

    #[test]
    fn test_evaluate_bounds() {
        let t = TensorNetwork::ones(&[2, 3]).unwrap();
        assert!(matches!(
            evaluate(&t, &[vec![1, 3]]),
            Err(NetworkError::IndexOutOfBounds {
                dim: 1,
                index: 3,
                size: 3
            })
        ));
        assert!(matches!(
            evaluate(&t, &[vec![1]]),
            Err(NetworkError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_contract_weighted_single_core() {
        let core = Array3::from_shape_fn((1, 4, 1), |(_, i, _)| i as f64);
        let t = TensorNetwork::from_blocks(vec![core.into_dyn()], vec![None]).unwrap();
        let total = contract_weighted(&t, &[array![1.0, 1.0, 1.0, 1.0]]).unwrap();
        assert_eq!(total, 6.0);
    }

    #[test]
    fn test_inner_matches_dense() {
        let a = TensorNetwork::random(&[3, 4, 2], &RankSpec::train(3, 3), 2).unwrap();
        let b = TensorNetwork::random(&[3, 4, 2], &RankSpec::parafac(3, 2), 3).unwrap();
        let config = NetworkConfig::default();
        let expected: f64 = full(&a, &config)
            .unwrap()
            .iter()
            .zip(full(&b, &config).unwrap().iter())
            .map(|(x, y)| x * y)
            .sum();

        let got = inner(&a, &b, None).unwrap();
        assert!((got - expected).abs() < 1e-10 * expected.abs().max(1.0));
    }

    #[test]
    fn test_inner_shape_mismatch() {
        let a = TensorNetwork::ones(&[3, 4]).unwrap();
        let b = TensorNetwork::ones(&[3, 5]).unwrap();
        assert!(matches!(
            inner(&a, &b, None),
            Err(NetworkError::DimensionMismatch { .. })
        ));
    }
}
