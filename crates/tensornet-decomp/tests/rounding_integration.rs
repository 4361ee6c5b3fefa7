//! Integration tests for rounding grown networks back down

use tensornet_core::{CoreKind, NetworkConfig, NetworkError, RankSpec, TensorNetwork};
use tensornet_decomp::*;
use tensornet_kernels::{add, dist, full, hadamard, norm, scale, sub};

#[test]
fn test_round_trip_on_hybrid_network() {
    let spec = RankSpec::train(5, 3)
        .with_parafac_at(2, 2)
        .with_tucker_at(0, 2)
        .with_tucker_at(4, 3);
    let t = TensorNetwork::random(&[4, 5, 3, 5, 4], &spec, 1).unwrap();
    let rounded = round_tt(&t, &RoundingTarget::exact()).unwrap();

    assert_eq!(rounded.kind(2), CoreKind::Parafac);
    let config = NetworkConfig::default();
    let a = full(&t, &config).unwrap();
    let b = full(&rounded, &config).unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-10);
    }
}

#[test]
fn test_lossy_rounding_on_hybrid_network() {
    let spec = RankSpec::train(5, 3)
        .with_parafac_at(2, 3)
        .with_tucker_at(0, 3)
        .with_tucker_at(4, 3);
    let eps = 0.4;
    let target = RoundingTarget::new(eps);

    for seed in 0..4 {
        let t = TensorNetwork::random(&[5, 5, 4, 5, 5], &spec, 40 + seed).unwrap();
        let grown = add(&t, &scale(&sub(&t, &t).unwrap(), 0.5).unwrap()).unwrap();
        let rounded = round_tt(&grown, &target).unwrap();

        assert_eq!(rounded.kind(2), CoreKind::Parafac);
        assert!(dist(&grown, &rounded).unwrap() <= eps * norm(&grown).unwrap() * (1.0 + 1e-8));

        let again = round_tt(&rounded, &target).unwrap();
        assert_eq!(again.ranks_tt(), rounded.ranks_tt());
    }
}

#[test]
fn test_squared_network_compresses() {
    // x ↦ f(x)² of a rank-2 network has rank at most 3 per junction
    // (symmetric tensor square), while the Hadamard product carries 4
    let t = TensorNetwork::random(&[6, 6, 6, 6], &RankSpec::train(4, 2), 2).unwrap();
    let squared = hadamard(&t, &t).unwrap();
    assert_eq!(squared.ranks_tt(), vec![1, 4, 4, 4, 1]);

    let rounded = round_tt(&squared, &RoundingTarget::new(1e-10)).unwrap();
    for &r in &rounded.ranks_tt()[1..4] {
        assert!(r <= 3);
    }
    assert!(dist(&squared, &rounded).unwrap() <= 1e-6 * norm(&squared).unwrap());
}

#[test]
fn test_sweep_can_be_stepped_manually() {
    let t = TensorNetwork::random(&[3, 3, 3, 3, 3], &RankSpec::train(5, 3), 3).unwrap();
    let grown = add(&t, &t).unwrap();
    let mut sweep = RoundingSweep::new(&grown, &RoundingTarget::new(1e-10)).unwrap();

    let mut states = vec![sweep.state()];
    while sweep.step().unwrap() {
        states.push(sweep.state());
    }
    states.push(sweep.state());

    assert_eq!(states.first(), Some(&SweepState::ForwardOrthogonalizing { junction: 0 }));
    assert!(states.contains(&SweepState::BackwardTruncating { junction: 3 }));
    assert_eq!(states.last(), Some(&SweepState::Done));
    // 4 forward steps and 4 backward steps
    assert_eq!(states.len(), 9);

    let rounded = sweep.into_network().unwrap();
    assert_eq!(rounded.ranks_tt(), vec![1, 3, 3, 3, 3, 1]);
}

#[test]
fn test_cancelled_difference_rounds_to_rank_one() {
    let t = TensorNetwork::random(&[4, 4, 4], &RankSpec::train(3, 2), 4).unwrap();
    let zero = sub(&t, &t).unwrap();
    assert_eq!(zero.ranks_tt(), vec![1, 4, 4, 1]);

    let rounded = round_tt(&zero, &RoundingTarget::new(1e-6).max_rank(1)).unwrap();
    assert_eq!(rounded.ranks_tt(), vec![1, 1, 1, 1]);
    assert!(norm(&rounded).unwrap() < 1e-6 * norm(&t).unwrap());
}

#[test]
fn test_larger_requested_rank_is_noop() {
    let t = TensorNetwork::random(&[5, 5, 5], &RankSpec::train(3, 3), 5).unwrap();
    let rounded = round_tt(&t, &RoundingTarget::exact().max_ranks(vec![50, 50])).unwrap();
    assert_eq!(rounded.ranks_tt(), t.ranks_tt());
}

#[test]
fn test_full_round_on_tucker_network() {
    let spec = RankSpec::train(3, 2).with_tucker(3);
    let t = TensorNetwork::random(&[8, 8, 8], &spec, 6).unwrap();
    let grown = add(&t, &scale(&t, -0.25).unwrap()).unwrap();

    let rounded = round(&grown, 1e-6).unwrap();
    assert_eq!(rounded.ranks_tt(), vec![1, 2, 2, 1]);
    for (r, r0) in rounded.ranks_tucker().iter().zip(t.ranks_tucker()) {
        assert!(r.unwrap() <= r0.unwrap());
    }
    assert!(dist(&grown, &rounded).unwrap() <= 1e-5 * norm(&grown).unwrap());
}

#[test]
fn test_negative_eps_rejected_everywhere() {
    let t = TensorNetwork::ones(&[2, 2]).unwrap();
    assert!(matches!(
        round_tt(&t, &RoundingTarget::new(-1.0)),
        Err(NetworkError::InvalidArgument { .. })
    ));
    assert!(matches!(round(&t, -1.0), Err(NetworkError::InvalidArgument { .. })));
}
