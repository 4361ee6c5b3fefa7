//! Property-based tests for network construction
//!
//! These use proptest to check the structural invariants of networks built
//! from random rank requests.

#[cfg(test)]
mod tests {
    use crate::{CoreKind, RankSpec, TensorNetwork};
    use proptest::prelude::*;

    fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(2usize..8, 1..=5)
    }

    proptest! {
        #[test]
        fn prop_random_train_respects_boundaries(shape in shape_strategy(), rank in 1usize..5, seed in 0u64..1000) {
            let spec = RankSpec::train(shape.len(), rank);
            let t = TensorNetwork::random(&shape, &spec, seed).unwrap();
            let ranks = t.ranks_tt();

            prop_assert_eq!(ranks.len(), shape.len() + 1);
            prop_assert_eq!(ranks[0], 1);
            prop_assert_eq!(ranks[shape.len()], 1);
            prop_assert_eq!(t.shape(), shape.as_slice());
        }

        #[test]
        fn prop_parafac_positions_keep_kind(shape in shape_strategy(), rank in 1usize..4, pick in 0usize..5) {
            let n = pick % shape.len();
            let spec = RankSpec::train(shape.len(), 2).with_parafac_at(n, rank);
            let t = TensorNetwork::random(&shape, &spec, 1).unwrap();

            prop_assert_eq!(t.kind(n), CoreKind::Parafac);
            if n > 0 {
                prop_assert_eq!(t.ranks_tt()[n], rank);
            }
            if n + 1 < shape.len() {
                prop_assert_eq!(t.ranks_tt()[n + 1], rank);
            }
        }

        #[test]
        fn prop_num_parameters_counts_blocks(shape in shape_strategy(), rank in 1usize..4) {
            let spec = RankSpec::train(shape.len(), rank).with_tucker(2);
            let t = TensorNetwork::random(&shape, &spec, 5).unwrap();
            let ranks = t.ranks_tt();

            let expected: usize = (0..shape.len())
                .map(|n| ranks[n] * 2 * ranks[n + 1] + shape[n] * 2)
                .sum();
            prop_assert_eq!(t.num_parameters(), expected);
        }

        #[test]
        fn prop_deep_copy_preserves_metadata(shape in shape_strategy(), rank in 1usize..4) {
            let t = TensorNetwork::random(&shape, &RankSpec::train(shape.len(), rank), 9).unwrap();
            let copy = t.deep_copy();

            prop_assert_eq!(copy.summary(), t.summary());
        }
    }
}
