//! Network creation from a target shape and rank request
//!
//! Decomposition routines (cross approximation, ALS, gradient fitting) live
//! outside this crate. They start from a network created here and update the
//! block contents in place.

use crate::block::{Block2, Block3};
use crate::error::NetworkResult;
use crate::network::{Core, TensorNetwork};
use crate::types::RankSpec;
use scirs2_core::ndarray_ext::{Array2, Array3};
use scirs2_core::random::{SeedableRng, StdRng};
use scirs2_core::StandardNormal;

impl TensorNetwork {
    /// Network with standard normal entries.
    ///
    /// Train cores are scaled by 1/√r_L and the first parafac core by 1/√R
    /// so that entries of the represented array stay O(1) as ranks grow.
    /// The same `seed` always produces the same network.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensornet_core::{RankSpec, TensorNetwork};
    ///
    /// let t = TensorNetwork::random(&[32, 32, 32, 32], &RankSpec::train(4, 5), 7).unwrap();
    /// assert_eq!(t.ranks_tt(), vec![1, 5, 5, 5, 1]);
    /// ```
    pub fn random(shape: &[usize], spec: &RankSpec, seed: u64) -> NetworkResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut normal = move |scale: f64| -> f64 {
            let sample: f64 = rng.sample(StandardNormal);
            sample * scale
        };

        let ranks = spec.resolve(shape)?;
        log::debug!("random network: shape {:?}, ranks {:?}", shape, ranks);
        let n_dims = shape.len();
        let mut cores = Vec::with_capacity(n_dims);
        let mut factors = Vec::with_capacity(n_dims);
        let mut scaled_parafac = false;

        for n in 0..n_dims {
            let features = spec.tucker[n].unwrap_or(shape[n]);
            let core = match spec.parafac[n] {
                Some(rank) => {
                    let scale = if scaled_parafac {
                        1.0
                    } else {
                        scaled_parafac = true;
                        1.0 / (rank as f64).sqrt()
                    };
                    Core::Parafac(Block2::new(Array2::from_shape_fn((features, rank), |_| {
                        normal(scale)
                    })))
                }
                None => {
                    let scale = 1.0 / (ranks[n] as f64).sqrt();
                    Core::Train(Block3::new(Array3::from_shape_fn(
                        (ranks[n], features, ranks[n + 1]),
                        |_| normal(scale),
                    )))
                }
            };
            cores.push(core);

            factors.push(spec.tucker[n].map(|features| {
                let scale = 1.0 / (features as f64).sqrt();
                Block2::new(Array2::from_shape_fn((shape[n], features), |_| {
                    normal(scale)
                }))
            }));
        }

        Self::new(cores, factors)
    }

    /// Rank-1 train network holding `value` everywhere
    pub fn constant(shape: &[usize], value: f64) -> NetworkResult<Self> {
        let n_dims = shape.len();
        let cores = shape
            .iter()
            .enumerate()
            .map(|(n, &size)| {
                let fill = if n == 0 { value } else { 1.0 };
                Core::Train(Block3::new(Array3::from_elem((1, size, 1), fill)))
            })
            .collect();
        Self::new(cores, vec![None; n_dims])
    }

    /// Rank-1 train network of ones
    pub fn ones(shape: &[usize]) -> NetworkResult<Self> {
        Self::constant(shape, 1.0)
    }

    /// Rank-1 train network of zeros
    pub fn zeros(shape: &[usize]) -> NetworkResult<Self> {
        Self::constant(shape, 0.0)
    }

    /// Rank-1 train network given by the outer product of `vectors`
    pub fn rank_one(vectors: &[Vec<f64>]) -> NetworkResult<Self> {
        let cores = vectors
            .iter()
            .map(|v| {
                let core = Array3::from_shape_fn((1, v.len(), 1), |(_, i, _)| v[i]);
                Core::Train(Block3::new(core))
            })
            .collect();
        Self::new(cores, vec![None; vectors.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::CoreKind;

    #[test]
    fn test_random_is_reproducible() {
        let spec = RankSpec::train(3, 4);
        let a = TensorNetwork::random(&[5, 6, 7], &spec, 11).unwrap();
        let b = TensorNetwork::random(&[5, 6, 7], &spec, 11).unwrap();

        match (a.core(1), b.core(1)) {
            (Core::Train(x), Core::Train(y)) => assert_eq!(*x.read(), *y.read()),
            _ => panic!("expected train cores"),
        }
    }

    #[test]
    fn test_random_hybrid_layout() {
        let spec = RankSpec::train(4, 3)
            .with_parafac_at(3, 2)
            .with_tucker_at(0, 4);
        let t = TensorNetwork::random(&[10, 6, 6, 6], &spec, 3).unwrap();

        assert_eq!(t.shape(), &[10, 6, 6, 6]);
        assert_eq!(t.kind(3), CoreKind::Parafac);
        assert_eq!(t.ranks_tt(), vec![1, 3, 3, 2, 1]);
        assert_eq!(t.ranks_tucker()[0], Some(4));
    }

    #[test]
    fn test_constant_network() {
        let t = TensorNetwork::constant(&[2, 3], 4.5).unwrap();
        assert_eq!(t.ranks_tt(), vec![1, 1, 1]);
        match t.core(0) {
            Core::Train(block) => assert_eq!(block.read()[[0, 1, 0]], 4.5),
            _ => panic!("expected a train core"),
        }
    }
}
