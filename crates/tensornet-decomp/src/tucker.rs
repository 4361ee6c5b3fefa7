//! Tucker rounding of factored dimensions
//!
//! A dimension with a factor U (Iₙ × S) can be compressed by shrinking its
//! feature size S. With orthonormal factors, projecting the feature axis of
//! dimension n onto a subspace V (S × r) costs exactly
//!
//! ```text
//! ‖T − T ×ₙ VVᵀ‖² = Σ_{j ≥ r} λⱼ
//! ```
//!
//! where λ are the eigenvalues of the feature Gram matrix
//!
//! ```text
//! Γₙ[s, s'] = Σ_{a,a',b,b'} L[a, a'] · Gₙ[a, s, b] · Gₙ[a', s', b'] · R[b, b']
//! ```
//!
//! and L, R are the Gram matrices of the network parts left and right of n.
//! All Γₙ are computed from the same orthonormalized network (HOSVD style);
//! the projections commute, so the per-dimension budgets add up.
//!
//! # Operations
//!
//! - [`orthonormalize_factors`] - QR every factor, absorb R into the core
//! - [`round_tucker`] - truncate feature sizes under an error budget
//! - [`round`] - Tucker rounding followed by TT rounding

use crate::round::{round_tt, RoundingTarget};
use scirs2_core::ndarray_ext::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use tensornet_core::{Block2, Core, NetworkError, NetworkResult, TensorNetwork};
use tensornet_kernels::{core_as_train, norm, thin_qr, thin_svd, truncation_rank, AmbientCore};

/// Replace every factor U by Q from U = Q·R, absorbing R into the core's
/// feature axis. The represented tensor is unchanged.
///
/// Factors with more columns than rows shrink to Iₙ columns.
pub fn orthonormalize_factors(t: &TensorNetwork) -> NetworkResult<TensorNetwork> {
    let n_dims = t.ndim();
    let mut cores = Vec::with_capacity(n_dims);
    let mut factors = Vec::with_capacity(n_dims);

    for n in 0..n_dims {
        match t.factor(n) {
            None => {
                cores.push(t.core(n).clone());
                factors.push(None);
            }
            Some(u) => {
                let (q, r) = thin_qr(&u.read().view())?;
                cores.push(transform_features(t.core(n), &r.view()));
                factors.push(Some(Block2::new(q)));
            }
        }
    }
    TensorNetwork::new(cores, factors)
}

/// Truncate the feature size of every factored dimension.
///
/// Each factored dimension may discard energy up to (ε·‖t‖)² / J, with J
/// the number of factored dimensions, so the total error stays within
/// ε·‖t‖. `max_rank` additionally caps every feature size. Dimensions
/// without a factor are left untouched.
///
/// # Errors
///
/// `InvalidArgument` for a negative or non-finite `eps` or a `max_rank`
/// of 0.
///
/// # Examples
///
/// ```
/// use tensornet_core::{RankSpec, TensorNetwork};
/// use tensornet_decomp::round_tucker;
/// use tensornet_kernels::add;
///
/// let t = TensorNetwork::random(&[8, 8, 8], &RankSpec::train(3, 2).with_tucker(3), 0)?;
/// let doubled = add(&t, &t)?;
/// assert_eq!(doubled.ranks_tucker(), vec![Some(6); 3]);
///
/// // The end cores have a single rank-2 bond, so their features collapse to 2
/// let rounded = round_tucker(&doubled, 1e-6, None)?;
/// assert_eq!(rounded.ranks_tucker(), vec![Some(2), Some(3), Some(2)]);
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
pub fn round_tucker(
    t: &TensorNetwork,
    eps: f64,
    max_rank: Option<usize>,
) -> NetworkResult<TensorNetwork> {
    if !eps.is_finite() || eps < 0.0 {
        return Err(NetworkError::invalid_argument(
            "round_tucker",
            format!("eps must be finite and non-negative, got {}", eps),
        ));
    }
    if max_rank == Some(0) {
        return Err(NetworkError::invalid_argument(
            "round_tucker",
            "max_rank must be at least 1",
        ));
    }

    let n_dims = t.ndim();
    let factored: Vec<usize> = (0..n_dims).filter(|&n| t.factor(n).is_some()).collect();
    if factored.is_empty() {
        return Ok(t.clone());
    }

    let max_tail_sq = (eps * norm(t)?).powi(2) / factored.len() as f64;
    let t = orthonormalize_factors(t)?;
    let ambient = AmbientCore::all(&t);
    let left = left_environments(&ambient);
    let right = right_environments(&ambient)?;

    let (mut cores, mut factors) = t.clone().into_parts();
    for &n in &factored {
        let core = core_as_train(t.core(n), n, n_dims);
        let gram = feature_gram(&core.view(), &left[n].view(), &right[n].view());
        let (v, lambda, _) = thin_svd(&gram.view())?;

        let sigma = lambda.mapv(|l| l.max(0.0).sqrt());
        let by_energy = truncation_rank(&sigma.view(), max_tail_sq);
        let rank = max_rank.map_or(by_energy, |c| by_energy.min(c));
        let features = core.dim().1;
        log::debug!(
            "round_tucker: dimension {} features {} -> {}",
            n,
            features,
            rank.min(features)
        );
        if rank >= features {
            continue;
        }

        let basis = v.slice(s![.., ..rank]).to_owned();
        let Some(u) = t.factor(n) else { continue };
        factors[n] = Some(Block2::new(u.read().dot(&basis)));
        cores[n] = transform_features(t.core(n), &basis.t());
    }

    TensorNetwork::new(cores, factors)
}

/// Round both the factors and the train junctions of a network.
///
/// The budget is split evenly (ε/√2 each) when both kinds of rounding
/// apply; otherwise the single applicable rounding gets all of ε.
///
/// # Errors
///
/// `InvalidArgument` for a negative or non-finite `eps`.
pub fn round(t: &TensorNetwork, eps: f64) -> NetworkResult<TensorNetwork> {
    let has_factors = t.factors().iter().any(Option::is_some);
    let has_train_junctions = t
        .cores()
        .windows(2)
        .any(|pair| pair[0].parafac_rank().is_none() && pair[1].parafac_rank().is_none());

    match (has_factors, has_train_junctions) {
        (true, true) => {
            let half = eps / std::f64::consts::SQRT_2;
            let tucker = round_tucker(t, half, None)?;
            round_tt(&tucker, &RoundingTarget::new(half))
        }
        (true, false) => round_tucker(t, eps, None),
        (false, _) => round_tt(t, &RoundingTarget::new(eps)),
    }
}

/// Apply m (k × S) to the feature axis of a core
fn transform_features(core: &Core, m: &ArrayView2<f64>) -> Core {
    match core {
        Core::Train(block) => {
            let block = block.read();
            let (r_left, _, r_right) = block.dim();
            let mut out = Array3::<f64>::zeros((r_left, m.nrows(), r_right));
            for l in 0..r_left {
                out.index_axis_mut(Axis(0), l)
                    .assign(&m.dot(&block.index_axis(Axis(0), l)));
            }
            Core::train(out)
        }
        Core::Parafac(block) => Core::parafac(m.dot(&*block.read())),
    }
}

/// Gram matrices of the parts left of each dimension (entry n covers 0..n)
fn left_environments(ambient: &[AmbientCore]) -> Vec<Array2<f64>> {
    let mut envs = Vec::with_capacity(ambient.len());
    let mut env = Array2::<f64>::ones((1, 1));
    for core in ambient {
        let (_, r_right) = core.ranks();
        let mut next = Array2::<f64>::zeros((r_right, r_right));
        for i in 0..core.size() {
            let lg = core.apply(&env.view(), i);
            next += &core.apply(&lg.t(), i).t();
        }
        envs.push(std::mem::replace(&mut env, next));
    }
    envs
}

/// Gram matrices of the parts right of each dimension (entry n covers n+1..N)
fn right_environments(ambient: &[AmbientCore]) -> NetworkResult<Vec<Array2<f64>>> {
    let mut envs = vec![Array2::<f64>::ones((1, 1)); ambient.len()];
    for n in (1..ambient.len()).rev() {
        let core = &ambient[n];
        let (r_left, _) = core.ranks();
        let mut next = Array2::<f64>::zeros((r_left, r_left));
        for i in 0..core.size() {
            let slice = core.slice_matrix(n, i)?;
            next += &slice.dot(&envs[n]).dot(&slice.t());
        }
        envs[n - 1] = next;
    }
    Ok(envs)
}

/// Γ[s, s'] = ⟨L·Gₛ·R, G_s'⟩
fn feature_gram(
    core: &ArrayView3<f64>,
    left: &ArrayView2<f64>,
    right: &ArrayView2<f64>,
) -> Array2<f64> {
    let features = core.dim().1;
    let mut gram = Array2::<f64>::zeros((features, features));
    for s in 0..features {
        let x = left.dot(&core.index_axis(Axis(1), s)).dot(right);
        for s2 in 0..features {
            gram[[s, s2]] = (&x * &core.index_axis(Axis(1), s2)).sum();
        }
    }
    gram
}
