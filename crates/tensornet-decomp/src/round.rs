//! Tensor-train rounding (orthogonalize-then-truncate)
//!
//! Rounding returns a network with smaller junction ranks that stays within
//! a relative Frobenius error of the input:
//!
//! ```text
//! ‖round(T) − T‖ ≤ ε·‖T‖
//! ```
//!
//! # Algorithm
//!
//! The sweep is an explicit two-pass state machine ([`RoundingSweep`]):
//!
//! 1. **Forward orthogonalization** (left → right). At each truncatable
//!    junction k the left unfolding of core k is factored as Q·R; core k
//!    becomes Q (left-orthogonal) and R is absorbed into core k+1. The
//!    network is unchanged.
//! 2. **Backward truncation** (right → left). At each truncatable junction
//!    the right unfolding M of core k+1 is weighted by the Gram matrices
//!    L (cores 0..=k) and R (cores k+2..N) of the rest of the network and
//!    factored as
//!
//! ```text
//! √L · M · (I ⊗ √R) = U·Σ·Vᵀ
//! ```
//!
//!    Core k+1 becomes the leading rows of Vᵀ·(I ⊗ √R)⁺ and core k absorbs
//!    the matching M·(I ⊗ √R)·V. The discarded Σ tail is then exactly the
//!    error of that step, and the steps project onto nested subspaces so
//!    their errors add in squares. Each junction may discard up to δ², with
//!
//! ```text
//! δ = ε·‖T‖ / √J        J = number of truncatable junctions
//! ```
//!
//! For a pure train L and R are identities and this is the classic sweep.
//!
//! A junction is truncatable when both adjacent cores are train cores.
//! Parafac cores pass through the sweep untouched and the junctions next
//! to them keep their rank. Factors are orthonormalized before sweeping so
//! that feature-space Gram matrices are ambient ones.
//!
//! # Stable ranks
//!
//! Among the ranks within δ², a junction keeps the smallest one that a
//! second rounding of the result would keep as well, so that rounding twice changes no rank. The budget
//! of that second rounding depends on ‖round(T)‖, which [`round_tt`] finds
//! by repeating the sweep until the ranks settle.
//!
//! # References
//!
//! - Oseledets, I. V. (2011). "Tensor-Train Decomposition", Algorithm 2

use crate::tucker::orthonormalize_factors;
use scirs2_core::ndarray_ext::{s, Array2, Array3, ArrayView1, ArrayView3, Axis};
use std::borrow::Cow;
use tensornet_core::{Block2, Core, NetworkError, NetworkResult, TensorNetwork};
use tensornet_kernels::{
    core_as_train, dist, fold_core, norm, orthogonality_defect, psd_sqrt, thin_qr, thin_svd,
    truncation_rank, unfold_left, unfold_right,
};

/// Upper bound on the sweeps [`round_tt`] repeats while ranks settle
const MAX_REFINEMENTS: usize = 8;

/// Error budget and rank caps for [`round_tt`]
#[derive(Debug, Clone, PartialEq)]
pub struct RoundingTarget {
    /// Relative Frobenius error budget (≥ 0)
    pub eps: f64,
    /// Cap applied to every junction
    pub max_rank: Option<usize>,
    /// Per-junction caps (length N−1); combined with `max_rank` by minimum
    pub max_ranks: Option<Vec<usize>>,
}

impl Default for RoundingTarget {
    fn default() -> Self {
        Self {
            eps: 1e-14,
            max_rank: None,
            max_ranks: None,
        }
    }
}

impl RoundingTarget {
    /// Target with relative error budget `eps` and no rank caps
    pub fn new(eps: f64) -> Self {
        Self {
            eps,
            ..Self::default()
        }
    }

    /// Drop only exactly-zero singular values
    pub fn exact() -> Self {
        Self::new(0.0)
    }

    /// Cap every junction at `rank`
    pub fn max_rank(mut self, rank: usize) -> Self {
        self.max_rank = Some(rank);
        self
    }

    /// Cap each junction separately
    pub fn max_ranks(mut self, ranks: Vec<usize>) -> Self {
        self.max_ranks = Some(ranks);
        self
    }

    /// Effective cap at junction k
    fn cap(&self, k: usize) -> Option<usize> {
        let per_junction = self.max_ranks.as_ref().map(|r| r[k]);
        match (self.max_rank, per_junction) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Progress of a [`RoundingSweep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// Next step orthogonalizes `junction` (between cores k and k+1)
    ForwardOrthogonalizing { junction: usize },
    /// Next step truncates `junction`
    BackwardTruncating { junction: usize },
    /// Nothing left to do
    Done,
}

#[derive(Debug, Clone)]
enum SweepCore {
    Train(Array3<f64>),
    Fixed(Core),
}

/// Two-pass TT rounding sweep, advanced one junction at a time.
///
/// Each state has an invariant that can be checked between steps:
///
/// - during [`SweepState::ForwardOrthogonalizing`] at junction k, every
///   train core left of k that sits on a truncatable junction is
///   left-orthogonal;
/// - during [`SweepState::BackwardTruncating`] at junction k, every train
///   core right of k+1 that sits on a truncatable junction is
///   right-orthogonal.
///
/// # Examples
///
/// ```
/// use tensornet_core::{RankSpec, TensorNetwork};
/// use tensornet_decomp::{RoundingSweep, RoundingTarget, SweepState};
///
/// let t = TensorNetwork::random(&[4, 4, 4, 4], &RankSpec::train(4, 3), 0)?;
/// let mut sweep = RoundingSweep::new(&t, &RoundingTarget::new(1e-8))?;
/// assert_eq!(sweep.state(), SweepState::ForwardOrthogonalizing { junction: 0 });
///
/// sweep.run()?;
/// assert_eq!(sweep.state(), SweepState::Done);
/// let rounded = sweep.into_network()?;
/// assert_eq!(rounded.shape(), t.shape());
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RoundingSweep {
    cores: Vec<SweepCore>,
    factors: Vec<Option<Block2>>,
    truncatable: Vec<bool>,
    caps: Vec<Option<usize>>,
    eps: f64,
    max_tail_sq: f64,
    stable_tail_sq: f64,
    state: SweepState,
}

impl RoundingSweep {
    /// Validate the target and prepare the sweep.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a negative or non-finite `eps`
    /// - `DimensionMismatch` if `max_ranks` does not have N−1 entries
    /// - `RankTargetInfeasible` for a cap of 0 on a nonzero network, or a
    ///   cap below the fixed rank of a junction next to a parafac core
    pub fn new(t: &TensorNetwork, target: &RoundingTarget) -> NetworkResult<Self> {
        if !target.eps.is_finite() || target.eps < 0.0 {
            return Err(NetworkError::invalid_argument(
                "round_tt",
                format!("eps must be finite and non-negative, got {}", target.eps),
            ));
        }

        let n_dims = t.ndim();
        let n_junctions = n_dims - 1;
        if let Some(ranks) = &target.max_ranks {
            if ranks.len() != n_junctions {
                return Err(NetworkError::dimension_mismatch(
                    "round_tt",
                    vec![n_junctions],
                    vec![ranks.len()],
                ));
            }
        }

        let total_norm = norm(t)?;
        let ranks = t.ranks_tt();
        let truncatable: Vec<bool> = (0..n_junctions)
            .map(|k| t.core(k).parafac_rank().is_none() && t.core(k + 1).parafac_rank().is_none())
            .collect();

        let mut caps = Vec::with_capacity(n_junctions);
        for k in 0..n_junctions {
            let cap = match target.cap(k) {
                Some(0) if total_norm == 0.0 => Some(1),
                Some(0) => {
                    return Err(NetworkError::RankTargetInfeasible {
                        junction: k,
                        requested: 0,
                        minimum: 1,
                    })
                }
                cap => cap,
            };
            if let Some(requested) = cap {
                let current = ranks[k + 1];
                if !truncatable[k] && requested < current {
                    return Err(NetworkError::RankTargetInfeasible {
                        junction: k,
                        requested,
                        minimum: current,
                    });
                }
            }
            caps.push(cap);
        }

        let n_truncatable = truncatable.iter().filter(|&&b| b).count();
        let max_tail_sq = if n_truncatable == 0 {
            0.0
        } else {
            (target.eps * total_norm).powi(2) / n_truncatable as f64
        };
        log::debug!(
            "round_tt: {} truncatable junctions, ‖t‖ = {:.3e}, δ² = {:.3e}",
            n_truncatable,
            total_norm,
            max_tail_sq
        );

        let t = if t.factors().iter().any(Option::is_some) {
            orthonormalize_factors(t)?
        } else {
            t.clone()
        };
        let (cores, factors) = t.into_parts();
        let cores = cores
            .into_iter()
            .map(|core| match core {
                Core::Train(block) => SweepCore::Train(block.to_array()),
                fixed => SweepCore::Fixed(fixed),
            })
            .collect();

        let state = if n_truncatable == 0 {
            SweepState::Done
        } else {
            SweepState::ForwardOrthogonalizing { junction: 0 }
        };

        Ok(Self {
            cores,
            factors,
            truncatable,
            caps,
            eps: target.eps,
            max_tail_sq,
            stable_tail_sq: max_tail_sq,
            state,
        })
    }

    fn n_truncatable(&self) -> usize {
        self.truncatable.iter().filter(|&&b| b).count()
    }

    /// Keep only ranks that a rounding of a network of norm `result_norm`
    /// would leave unchanged
    fn stable_for(mut self, result_norm: f64) -> Self {
        let n = self.n_truncatable().max(1) as f64;
        self.stable_tail_sq = (self.eps * result_norm).powi(2) / n;
        self
    }

    fn finish(mut self) -> NetworkResult<TensorNetwork> {
        self.run()?;
        self.into_network()
    }

    /// Current state
    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Current contents of train core `n`, `None` for a parafac core
    pub fn train_core(&self, n: usize) -> Option<ArrayView3<'_, f64>> {
        match &self.cores[n] {
            SweepCore::Train(core) => Some(core.view()),
            SweepCore::Fixed(_) => None,
        }
    }

    /// Current junction ranks (N+1 entries)
    pub fn ranks(&self) -> Vec<usize> {
        let mut ranks = vec![1];
        for core in &self.cores {
            ranks.push(match core {
                SweepCore::Train(c) => c.dim().2,
                SweepCore::Fixed(c) => c.parafac_rank().unwrap_or(1),
            });
        }
        if let Some(last) = ranks.last_mut() {
            *last = 1;
        }
        ranks
    }

    /// Advance by one junction.
    ///
    /// Returns `true` while there is work left.
    pub fn step(&mut self) -> NetworkResult<bool> {
        let last_junction = self.truncatable.len().saturating_sub(1);
        self.state = match self.state {
            SweepState::ForwardOrthogonalizing { junction } => {
                if self.truncatable[junction] {
                    self.orthogonalize(junction)?;
                }
                if junction < last_junction {
                    SweepState::ForwardOrthogonalizing {
                        junction: junction + 1,
                    }
                } else {
                    SweepState::BackwardTruncating {
                        junction: last_junction,
                    }
                }
            }
            SweepState::BackwardTruncating { junction } => {
                if self.truncatable[junction] {
                    self.truncate(junction)?;
                }
                if junction == 0 {
                    SweepState::Done
                } else {
                    SweepState::BackwardTruncating {
                        junction: junction - 1,
                    }
                }
            }
            SweepState::Done => SweepState::Done,
        };
        Ok(self.state != SweepState::Done)
    }

    /// Drive the sweep to [`SweepState::Done`]
    pub fn run(&mut self) -> NetworkResult<()> {
        while self.step()? {}
        Ok(())
    }

    /// Publish the swept network.
    ///
    /// Can be called in any state: every step leaves the represented tensor
    /// unchanged up to the truncations already made.
    pub fn into_network(self) -> NetworkResult<TensorNetwork> {
        let cores = self
            .cores
            .into_iter()
            .map(|core| match core {
                SweepCore::Train(array) => Core::train(array),
                SweepCore::Fixed(core) => core,
            })
            .collect();
        TensorNetwork::new(cores, self.factors)
    }

    /// Core n in feature space, parafac cores in train form
    fn feature_core(&self, n: usize) -> Cow<'_, Array3<f64>> {
        match &self.cores[n] {
            SweepCore::Train(core) => Cow::Borrowed(core),
            SweepCore::Fixed(core) => Cow::Owned(core_as_train(core, n, self.cores.len())),
        }
    }

    /// Gram matrix of the part of the network made of cores 0..=k
    fn left_gram(&self, k: usize) -> Array2<f64> {
        let mut env = Array2::<f64>::ones((1, 1));
        for n in 0..=k {
            let core = self.feature_core(n);
            let r_right = core.dim().2;
            let mut next = Array2::<f64>::zeros((r_right, r_right));
            for slice in core.axis_iter(Axis(1)) {
                next += &slice.t().dot(&env.dot(&slice));
            }
            env = next;
        }
        env
    }

    /// Gram matrix of the part of the network made of cores n+1..N
    fn right_gram(&self, n: usize) -> Array2<f64> {
        let mut env = Array2::<f64>::ones((1, 1));
        for m in (n + 1..self.cores.len()).rev() {
            let core = self.feature_core(m);
            let r_left = core.dim().0;
            let mut next = Array2::<f64>::zeros((r_left, r_left));
            for slice in core.axis_iter(Axis(1)) {
                next += &slice.dot(&env).dot(&slice.t());
            }
            env = next;
        }
        env
    }

    fn train_pair(&mut self, k: usize) -> NetworkResult<(&mut Array3<f64>, &mut Array3<f64>)> {
        let (left, right) = self.cores.split_at_mut(k + 1);
        match (&mut left[k], &mut right[0]) {
            (SweepCore::Train(a), SweepCore::Train(b)) => Ok((a, b)),
            _ => Err(NetworkError::invalid_argument(
                "round_tt",
                format!("junction {} is not between two train cores", k),
            )),
        }
    }

    /// Core k ← Q, core k+1 ← R · core k+1
    fn orthogonalize(&mut self, k: usize) -> NetworkResult<()> {
        let (left, right) = self.train_pair(k)?;
        let (r_left, size, _) = left.dim();
        let (q, r) = thin_qr(&unfold_left(&left.view())?.view())?;
        let rank = q.ncols();

        let (_, next_size, next_right) = right.dim();
        let absorbed = r.dot(&unfold_right(&right.view())?);

        *left = fold_core(&q.view(), (r_left, size, rank))?;
        *right = fold_core(&absorbed.view(), (rank, next_size, next_right))?;
        Ok(())
    }

    /// Core k+1 ← leading rows of Vᵀ·(I ⊗ √R)⁺, core k ← core k · M·(I ⊗ √R)·V
    fn truncate(&mut self, k: usize) -> NetworkResult<()> {
        let (left_root, _) = psd_sqrt(&self.left_gram(k).view())?;
        let (right_root, right_inverse_root) = psd_sqrt(&self.right_gram(k + 1).view())?;
        let cap = self.caps[k];
        let (max_tail_sq, stable_tail_sq) = (self.max_tail_sq, self.stable_tail_sq);
        let (left, right) = self.train_pair(k)?;

        let dims = right.dim();
        let (rank_in, next_size, next_right) = dims;
        let weighted = unfold_left(&right.view())?.dot(&right_root);
        let weighted = unfold_right(&fold_core(&weighted.view(), dims)?.view())?;
        let (_, sigma, vt) = thin_svd(&left_root.dot(&weighted).view())?;

        let stable = junction_rank(&sigma.view(), max_tail_sq, stable_tail_sq);
        let rank = cap.map_or(stable, |c| stable.min(c));
        log::debug!(
            "round_tt: junction {} rank {} -> {} (stable rank {})",
            k,
            rank_in,
            rank,
            stable
        );

        let kept = vt.slice(s![..rank, ..]);
        let (r_left, size, _) = left.dim();
        let absorbed = unfold_left(&left.view())?.dot(&weighted.dot(&kept.t()));
        *left = fold_core(&absorbed.view(), (r_left, size, rank))?;

        let basis = fold_core(&kept, (rank, next_size, next_right))?;
        let basis = unfold_left(&basis.view())?.dot(&right_inverse_root);
        *right = fold_core(&basis.view(), (rank, next_size, next_right))?;
        Ok(())
    }
}

/// `stable[r - 1]` tells whether a rounding with per-junction budget
/// `tail_sq` keeps all of σ₁..σᵣ when those are a junction's singular values.
///
/// Such a rounding keeps the smallest stable rank at or above its energy
/// rank, so a prefix is stable exactly when no shorter prefix within its
/// own energy budget is.
fn stable_prefixes(sigma: &ArrayView1<f64>, tail_sq: f64) -> Vec<bool> {
    let mut stable: Vec<bool> = Vec::with_capacity(sigma.len());
    for len in 1..=sigma.len() {
        let by_energy = truncation_rank(&sigma.slice(s![..len]), tail_sq);
        let reducible = (by_energy..len).any(|r| stable[r - 1]);
        stable.push(!reducible);
    }
    stable
}

/// Smallest rank within `max_tail_sq` that is stable under `stable_tail_sq`
fn junction_rank(sigma: &ArrayView1<f64>, max_tail_sq: f64, stable_tail_sq: f64) -> usize {
    let stable = stable_prefixes(sigma, stable_tail_sq);
    let by_energy = truncation_rank(sigma, max_tail_sq);
    (by_energy..=sigma.len())
        .find(|&r| stable[r - 1])
        .unwrap_or(sigma.len())
}

/// One rounding of `t`, repeated until the stable ranks agree with the norm
/// of the result they produce
fn round_once(t: &TensorNetwork, target: &RoundingTarget) -> NetworkResult<TensorNetwork> {
    let sweep = RoundingSweep::new(t, target)?;
    if sweep.state() == SweepState::Done {
        return sweep.into_network();
    }

    let mut rounded = sweep.clone().finish()?;
    for _ in 0..MAX_REFINEMENTS {
        let candidate = sweep.clone().stable_for(norm(&rounded)?).finish()?;
        let settled = candidate.ranks_tt() == rounded.ranks_tt();
        rounded = candidate;
        if settled {
            break;
        }
    }
    Ok(rounded)
}

/// Round the train junctions of a network.
///
/// Unlike a single [`RoundingSweep`], the result is stable: rounding it
/// again with the same target leaves every rank unchanged.
///
/// # Errors
///
/// See [`RoundingSweep::new`].
///
/// # Examples
///
/// ```
/// use tensornet_core::{RankSpec, TensorNetwork};
/// use tensornet_decomp::{round_tt, RoundingTarget};
/// use tensornet_kernels::add;
///
/// let t = TensorNetwork::random(&[5, 5, 5, 5], &RankSpec::train(4, 2), 0)?;
/// let doubled = add(&t, &t)?;
/// assert_eq!(doubled.ranks_tt(), vec![1, 4, 4, 4, 1]);
///
/// let rounded = round_tt(&doubled, &RoundingTarget::new(1e-10))?;
/// assert_eq!(rounded.ranks_tt(), vec![1, 2, 2, 2, 1]);
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
pub fn round_tt(t: &TensorNetwork, target: &RoundingTarget) -> NetworkResult<TensorNetwork> {
    let mut rounded = round_once(t, target)?;
    let budget = target.eps * norm(t)?;

    // A second rounding must not find anything left to drop
    for _ in 0..MAX_REFINEMENTS {
        let again = round_once(&rounded, target)?;
        if again.ranks_tt() == rounded.ranks_tt() {
            break;
        }
        let err = dist(t, &again)?;
        if err > budget {
            log::debug!(
                "round_tt: keeping ranks {:?}, {:?} would cost {:.3e} > {:.3e}",
                rounded.ranks_tt(),
                again.ranks_tt(),
                err,
                budget
            );
            break;
        }
        rounded = again;
    }
    Ok(rounded)
}

/// Whether the left unfolding of `core` has orthonormal columns
pub fn is_left_orthogonal(core: &ArrayView3<f64>, tol: f64) -> NetworkResult<bool> {
    Ok(orthogonality_defect(&unfold_left(core)?.view()) <= tol)
}

/// Whether the right unfolding of `core` has orthonormal rows
pub fn is_right_orthogonal(core: &ArrayView3<f64>, tol: f64) -> NetworkResult<bool> {
    Ok(orthogonality_defect(&unfold_right(core)?.t()) <= tol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;
    use tensornet_core::{CoreKind, NetworkConfig, RankSpec};
    use tensornet_kernels::{add, full, scale};

    fn max_abs_diff(a: &TensorNetwork, b: &TensorNetwork) -> f64 {
        let config = NetworkConfig::default();
        let da = full(a, &config).unwrap();
        let db = full(b, &config).unwrap();
        da.iter()
            .zip(db.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_exact_rounding_preserves_values() {
        let t = TensorNetwork::random(&[3, 4, 5, 3], &RankSpec::train(4, 3), 1).unwrap();
        let rounded = round_tt(&t, &RoundingTarget::exact()).unwrap();

        assert!(max_abs_diff(&t, &rounded) < 1e-10);
        for (r, r0) in rounded.ranks_tt().iter().zip(t.ranks_tt()) {
            assert!(*r <= r0);
        }
    }

    #[test]
    fn test_forward_pass_leaves_left_orthogonal_cores() {
        let t = TensorNetwork::random(&[4, 4, 4, 4], &RankSpec::train(4, 3), 2).unwrap();
        let mut sweep = RoundingSweep::new(&t, &RoundingTarget::new(1e-6)).unwrap();

        while matches!(sweep.state(), SweepState::ForwardOrthogonalizing { .. }) {
            sweep.step().unwrap();
        }
        assert_eq!(sweep.state(), SweepState::BackwardTruncating { junction: 2 });
        for n in 0..3 {
            let core = sweep.train_core(n).unwrap();
            assert!(is_left_orthogonal(&core, 1e-10).unwrap());
        }

        sweep.run().unwrap();
        for n in 1..4 {
            let core = sweep.train_core(n).unwrap();
            assert!(is_right_orthogonal(&core, 1e-10).unwrap());
        }
    }

    #[test]
    fn test_error_bound_respected() {
        let a = TensorNetwork::random(&[6, 6, 6, 6], &RankSpec::train(4, 2), 3).unwrap();
        let b = TensorNetwork::random(&[6, 6, 6, 6], &RankSpec::train(4, 4), 30).unwrap();
        let t = add(&a, &scale(&b, 1e-3).unwrap()).unwrap();
        assert_eq!(t.ranks_tt()[2], 6);

        let eps = 0.3;
        let rounded = round_tt(&t, &RoundingTarget::new(eps)).unwrap();

        let err = dist(&t, &rounded).unwrap();
        assert!(err <= eps * norm(&t).unwrap() * (1.0 + 1e-8));
        assert!(rounded.ranks_tt()[2] < 6);
    }

    #[test]
    fn test_error_bound_across_parafac_cores() {
        let shape = [4, 4, 4, 4, 4];
        let layouts = [
            RankSpec::train(5, 2).with_parafac_at(2, 2),
            RankSpec::train(5, 3).with_parafac_at(0, 2),
        ];
        for (i, spec) in layouts.iter().enumerate() {
            for seed in 0..6 {
                let t = TensorNetwork::random(&shape, spec, 100 * i as u64 + seed).unwrap();
                let reference = norm(&t).unwrap();
                for eps in [0.1, 0.3, 0.5] {
                    let rounded = round_tt(&t, &RoundingTarget::new(eps)).unwrap();
                    let err = dist(&t, &rounded).unwrap();
                    assert!(
                        err <= eps * reference * (1.0 + 1e-8),
                        "layout {} seed {} eps {}: {} > {}",
                        i,
                        seed,
                        eps,
                        err,
                        eps * reference
                    );
                    assert!(norm(&rounded).unwrap() > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_rounding_twice_keeps_ranks() {
        for seed in 0..12 {
            let t = TensorNetwork::random(&[6, 6, 6, 6, 6], &RankSpec::train(5, 5), seed).unwrap();
            let target = RoundingTarget::new(0.3);
            let once = round_tt(&t, &target).unwrap();
            let twice = round_tt(&once, &target).unwrap();

            assert_eq!(once.ranks_tt(), twice.ranks_tt(), "seed {}", seed);
            assert!(dist(&t, &once).unwrap() <= 0.3 * norm(&t).unwrap() * (1.0 + 1e-8));
        }
    }

    #[test]
    fn test_stable_prefixes() {
        let sigma = array![10.0, 5.0, 0.9, 0.5];
        assert_eq!(
            stable_prefixes(&sigma.view(), 1.0),
            vec![true, true, false, true]
        );
        // Dropping 0.5 alone would leave 0.9 for a second rounding to drop
        assert_eq!(junction_rank(&sigma.view(), 1.0, 1.0), 4);
        assert_eq!(junction_rank(&sigma.view(), 2.0, 2.0), 2);
        assert_eq!(junction_rank(&sigma.view(), 0.0, 0.0), 4);

        let zeros = array![0.0, 0.0];
        assert_eq!(junction_rank(&zeros.view(), 0.0, 0.0), 1);
    }

    #[test]
    fn test_rank_caps_are_applied() {
        let t = TensorNetwork::random(&[5, 5, 5, 5], &RankSpec::train(4, 4), 4).unwrap();
        let target = RoundingTarget::exact().max_ranks(vec![2, 3, 2]);
        let rounded = round_tt(&t, &target).unwrap();
        assert_eq!(rounded.ranks_tt(), vec![1, 2, 3, 2, 1]);

        let loose = round_tt(&t, &RoundingTarget::exact().max_rank(100)).unwrap();
        assert_eq!(loose.ranks_tt(), t.ranks_tt());
    }

    #[test]
    fn test_parafac_cores_pass_through() {
        let spec = RankSpec::train(4, 3).with_parafac_at(3, 2);
        let t = TensorNetwork::random(&[4, 4, 4, 4], &spec, 5).unwrap();
        let doubled = add(&t, &t).unwrap();

        let rounded = round_tt(&doubled, &RoundingTarget::new(1e-10)).unwrap();
        assert_eq!(rounded.kind(3), CoreKind::Parafac);
        assert_eq!(rounded.ranks_tt(), vec![1, 3, 3, 4, 1]);
        assert!(max_abs_diff(&doubled, &rounded) < 1e-9);
    }

    #[test]
    fn test_infeasible_targets() {
        let spec = RankSpec::train(3, 3).with_parafac_at(2, 2);
        let t = TensorNetwork::random(&[4, 4, 4], &spec, 6).unwrap();

        assert!(matches!(
            round_tt(&t, &RoundingTarget::exact().max_ranks(vec![0, 2])),
            Err(NetworkError::RankTargetInfeasible {
                junction: 0,
                requested: 0,
                minimum: 1
            })
        ));
        assert!(matches!(
            round_tt(&t, &RoundingTarget::exact().max_ranks(vec![2, 1])),
            Err(NetworkError::RankTargetInfeasible {
                junction: 1,
                requested: 1,
                minimum: 2
            })
        ));
        assert!(matches!(
            round_tt(&t, &RoundingTarget::new(-0.1)),
            Err(NetworkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            round_tt(&t, &RoundingTarget::exact().max_ranks(vec![2])),
            Err(NetworkError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_network_accepts_rank_zero_request() {
        let t = TensorNetwork::zeros(&[3, 3, 3]).unwrap();
        let rounded = round_tt(&t, &RoundingTarget::exact().max_rank(0)).unwrap();
        assert_eq!(rounded.ranks_tt(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_single_dimension_is_done_immediately() {
        let t = TensorNetwork::random(&[7], &RankSpec::train(1, 1), 7).unwrap();
        let sweep = RoundingSweep::new(&t, &RoundingTarget::default()).unwrap();
        assert_eq!(sweep.state(), SweepState::Done);
    }
}
