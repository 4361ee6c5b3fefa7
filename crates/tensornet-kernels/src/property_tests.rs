//! Property-based tests for network algebra
//!
//! Random hybrid networks are compared against their dense expansions, so
//! the shapes stay small.

#[cfg(test)]
mod tests {
    use crate::{add, dot, full, hadamard, mean, norm, scale, sum};
    use proptest::prelude::*;
    use tensornet_core::{NetworkConfig, RankSpec, TensorNetwork};

    fn proptest_config() -> ProptestConfig {
        ProptestConfig {
            cases: 16,
            ..ProptestConfig::default()
        }
    }

    fn spec(n_dims: usize, rank: usize, parafac_at: Option<usize>, tucker: bool) -> RankSpec {
        let mut spec = RankSpec::train(n_dims, rank);
        if let Some(n) = parafac_at {
            spec = spec.with_parafac_at(n % n_dims, rank);
        }
        if tucker {
            spec = spec.with_tucker_at(0, 2);
        }
        spec
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    proptest! {
        #![proptest_config(proptest_config())]

        // Property: sums are exact in every entry
        #[test]
        fn prop_add_matches_dense(
            shape in prop::collection::vec(2usize..5, 2..4),
            rank in 1usize..4,
            parafac_at in prop::option::of(0usize..4),
            tucker in any::<bool>(),
            seed in 0u64..1000,
        ) {
            let a = TensorNetwork::random(&shape, &spec(shape.len(), rank, parafac_at, tucker), seed).unwrap();
            let b = TensorNetwork::random(&shape, &RankSpec::parafac(shape.len(), 2), seed + 1).unwrap();

            let config = NetworkConfig::default();
            let got = full(&add(&a, &b).unwrap(), &config).unwrap();
            let expected = full(&a, &config).unwrap() + full(&b, &config).unwrap();
            for (x, y) in got.iter().zip(expected.iter()) {
                prop_assert!(close(*x, *y));
            }
        }

        // Property: Hadamard products are exact in every entry
        #[test]
        fn prop_hadamard_matches_dense(
            shape in prop::collection::vec(2usize..5, 2..4),
            rank in 1usize..3,
            parafac_at in prop::option::of(0usize..4),
            tucker in any::<bool>(),
            seed in 0u64..1000,
        ) {
            let a = TensorNetwork::random(&shape, &spec(shape.len(), rank, parafac_at, tucker), seed).unwrap();
            let b = TensorNetwork::random(&shape, &spec(shape.len(), 2, None, !tucker), seed + 7).unwrap();

            let config = NetworkConfig::default();
            let got = full(&hadamard(&a, &b).unwrap(), &config).unwrap();
            let expected = full(&a, &config).unwrap() * full(&b, &config).unwrap();
            for (x, y) in got.iter().zip(expected.iter()) {
                prop_assert!(close(*x, *y));
            }
        }

        // Property: the norm is non-negative, homogeneous, and equals sqrt(dot)
        #[test]
        fn prop_norm_homogeneous(
            shape in prop::collection::vec(2usize..6, 2..5),
            rank in 1usize..4,
            alpha in -3.0f64..3.0,
            seed in 0u64..1000,
        ) {
            let t = TensorNetwork::random(&shape, &RankSpec::train(shape.len(), rank), seed).unwrap();
            let n = norm(&t).unwrap();
            prop_assert!(n >= 0.0);
            prop_assert!(close(n * n, dot(&t, &t).unwrap()));

            let scaled = norm(&scale(&t, alpha).unwrap()).unwrap();
            prop_assert!(close(scaled, alpha.abs() * n));
        }

        // Property: sum and mean agree with each other
        #[test]
        fn prop_sum_is_mean_times_numel(
            shape in prop::collection::vec(2usize..6, 1..4),
            rank in 1usize..4,
            seed in 0u64..1000,
        ) {
            let t = TensorNetwork::random(&shape, &RankSpec::parafac(shape.len(), rank), seed).unwrap();
            prop_assert!(close(sum(&t).unwrap(), mean(&t).unwrap() * t.numel() as f64));
        }
    }
}
