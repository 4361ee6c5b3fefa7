//! ANOVA decomposition and Sobol sensitivity indices
//!
//! A network T over N independent variables with marginals p₁, …, p_N
//! splits every slice into a mean and a centered part:
//!
//! ```text
//! Gₙ(i) = Mₙ + Cₙ(i)      Mₙ = Σᵢ pₙ(i)·Gₙ(i),   Σᵢ pₙ(i)·Cₙ(i) = 0
//! ```
//!
//! Expanding the product gives the orthogonal ANOVA decomposition
//! T = Σ_α f_α, where f_α takes the centered part for the variables in α
//! and the mean for the others. The variance component of α is
//!
//! ```text
//! D_α = E[f_α²] = ∏_{n ∈ α} Σᵢ pₙ(i)·Cₙ(i)⊗Cₙ(i) · ∏_{n ∉ α} Mₙ⊗Mₙ
//! ```
//!
//! which is itself a network over {0, 1}^N, the **variance network** V,
//! with D_∅ = E[T]². Every statistic below is one contraction of V against
//! a [`Mask`], so the 2^N subsets are never enumerated:
//!
//! ```text
//! masked_variance(mask) = ⟨mask, V⟩ − mask(∅)·D_∅
//! ```
//!
//! | statistic | mask |
//! |---|---|
//! | variance component of α | exactly α |
//! | total index of x | supersets of {x} |
//! | closed index of α | subsets of α |
//! | superset index of α | supersets of α |
//! | mean dimension | weight \|α\| |
//!
//! # References
//!
//! - Sobol, I. M. (2001). "Global sensitivity indices for nonlinear
//!   mathematical models and their Monte Carlo estimates"
//! - Ballester-Ripoll, R., et al. (2019). "Sobol tensor trains for global
//!   sensitivity analysis"

use crate::mask::Mask;
use scirs2_core::ndarray_ext::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use tensornet_core::{Block2, Core, NetworkError, NetworkResult, TensorNetwork};
use tensornet_kernels::{
    contract_weighted, inner, kronecker, normalize_marginal, sum, AmbientCore,
};

/// Variances below this fraction of E[T²] are treated as zero
const DEGENERATE_VARIANCE_RATIO: f64 = 1e-12;

/// Independent per-variable probability vectors
#[derive(Debug, Clone, PartialEq)]
pub struct Marginals {
    weights: Vec<Array1<f64>>,
}

impl Marginals {
    /// Uniform marginals for an ambient shape
    pub fn uniform(shape: &[usize]) -> Self {
        Self {
            weights: shape
                .iter()
                .map(|&size| Array1::from_elem(size, 1.0 / size as f64))
                .collect(),
        }
    }

    /// Normalize `weights` into marginals for an ambient shape.
    ///
    /// Exact zeros are allowed.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the number or lengths of the vectors do not
    /// match `shape`, `InvalidMarginal` for negative or all-zero weights.
    pub fn new(shape: &[usize], weights: Vec<Array1<f64>>) -> NetworkResult<Self> {
        let lengths: Vec<usize> = weights.iter().map(|w| w.len()).collect();
        if lengths != shape {
            return Err(NetworkError::dimension_mismatch(
                "Marginals::new",
                shape.to_vec(),
                lengths,
            ));
        }
        let weights = weights
            .iter()
            .enumerate()
            .map(|(n, w)| normalize_marginal(n, w))
            .collect::<NetworkResult<Vec<_>>>()?;
        Ok(Self { weights })
    }

    /// Probability vector of variable n
    pub fn get(&self, n: usize) -> ArrayView1<'_, f64> {
        self.weights[n].view()
    }

    /// All probability vectors
    pub fn as_slice(&self) -> &[Array1<f64>] {
        &self.weights
    }

    /// Number of variables
    pub fn ndim(&self) -> usize {
        self.weights.len()
    }

    fn check_shape(&self, operation: &str, shape: &[usize]) -> NetworkResult<()> {
        let lengths: Vec<usize> = self.weights.iter().map(|w| w.len()).collect();
        if lengths != shape {
            return Err(NetworkError::dimension_mismatch(
                operation,
                shape.to_vec(),
                lengths,
            ));
        }
        Ok(())
    }
}

fn resolve_marginals(
    operation: &str,
    t: &TensorNetwork,
    marginals: Option<&Marginals>,
) -> NetworkResult<Marginals> {
    match marginals {
        Some(m) => {
            m.check_shape(operation, t.shape())?;
            Ok(m.clone())
        }
        None => Ok(Marginals::uniform(t.shape())),
    }
}

/// Network of shape (I₁+1, …, I_N+1) holding the ANOVA basis.
///
/// Index 0 of dimension n is the marginal mean slice Mₙ and index i+1 the
/// centered slice Cₙ(i). Factored dimensions are centered on the factor
/// and keep sharing their core.
///
/// # Errors
///
/// `DimensionMismatch` if the marginals do not match the network's shape.
pub fn anova_decomposition(
    t: &TensorNetwork,
    marginals: Option<&Marginals>,
) -> NetworkResult<TensorNetwork> {
    let marginals = resolve_marginals("anova_decomposition", t, marginals)?;
    let mut cores = Vec::with_capacity(t.ndim());
    let mut factors = Vec::with_capacity(t.ndim());

    for n in 0..t.ndim() {
        let p = marginals.get(n);
        match t.factor(n) {
            Some(u) => {
                cores.push(t.core(n).clone());
                factors.push(Some(Block2::new(center_rows(&u.read().view(), &p))));
            }
            None => {
                let core = match t.core(n) {
                    Core::Train(block) => Core::train(center_slices(&block.read().view(), &p)),
                    Core::Parafac(block) => Core::parafac(center_rows(&block.read().view(), &p)),
                };
                cores.push(core);
                factors.push(None);
            }
        }
    }
    TensorNetwork::new(cores, factors)
}

/// Rows [mean; row₀ − mean; row₁ − mean; …]
fn center_rows(rows: &ArrayView2<f64>, p: &ArrayView1<f64>) -> Array2<f64> {
    let mean = rows.t().dot(p);
    let (size, width) = rows.dim();
    let mut out = Array2::<f64>::zeros((size + 1, width));
    out.row_mut(0).assign(&mean);
    for i in 0..size {
        out.row_mut(i + 1).assign(&(&rows.row(i) - &mean));
    }
    out
}

/// Slices [M, G(0) − M, G(1) − M, …] along the middle axis
fn center_slices(core: &ArrayView3<f64>, p: &ArrayView1<f64>) -> Array3<f64> {
    let (r_left, size, r_right) = core.dim();
    let mean = weighted_slice(core, p);
    let mut out = Array3::<f64>::zeros((r_left, size + 1, r_right));
    out.index_axis_mut(Axis(1), 0).assign(&mean);
    for i in 0..size {
        out.index_axis_mut(Axis(1), i + 1)
            .assign(&(&core.index_axis(Axis(1), i) - &mean));
    }
    out
}

fn weighted_slice(core: &ArrayView3<f64>, p: &ArrayView1<f64>) -> Array2<f64> {
    let (r_left, _, r_right) = core.dim();
    let mut mean = Array2::<f64>::zeros((r_left, r_right));
    for (i, &w) in p.iter().enumerate() {
        if w != 0.0 {
            mean.scaled_add(w, &core.index_axis(Axis(1), i));
        }
    }
    mean
}

/// Flattened outer product a ⊗ b with index a·len(b) + b
fn outer_flat(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> Array1<f64> {
    let nb = b.len();
    Array1::from_shape_fn(a.len() * nb, |k| a[k / nb] * b[k % nb])
}

/// Variance core of one dimension: state 0 = M⊗M, state 1 = Σᵢ pᵢ·Cᵢ⊗Cᵢ
fn variance_core(ambient: &AmbientCore, p: &ArrayView1<f64>) -> Core {
    match ambient {
        AmbientCore::Train(core) => {
            let view = core.view();
            let mean = weighted_slice(&view, p);
            let (r_left, _, r_right) = core.dim();
            let mut spread = Array2::<f64>::zeros((r_left * r_left, r_right * r_right));
            for (i, &w) in p.iter().enumerate() {
                if w != 0.0 {
                    let centered = &core.index_axis(Axis(1), i) - &mean;
                    spread.scaled_add(w, &kronecker(&centered.view(), &centered.view()));
                }
            }
            let mut out = Array3::<f64>::zeros((r_left * r_left, 2, r_right * r_right));
            out.index_axis_mut(Axis(1), 0)
                .assign(&kronecker(&mean.view(), &mean.view()));
            out.index_axis_mut(Axis(1), 1).assign(&spread);
            Core::train(out)
        }
        AmbientCore::Parafac { rows, .. } => {
            let mean = rows.t().dot(p);
            let rank = rows.ncols();
            let mut out = Array2::<f64>::zeros((2, rank * rank));
            out.row_mut(0).assign(&outer_flat(&mean.view(), &mean.view()));
            for (i, &w) in p.iter().enumerate() {
                if w != 0.0 {
                    let centered = &rows.row(i) - &mean;
                    out.row_mut(1)
                        .scaled_add(w, &outer_flat(&centered.view(), &centered.view()));
                }
            }
            Core::parafac(out)
        }
    }
}

/// Variance-based sensitivity analysis of one network.
///
/// Building the analysis costs one pass over the network; every query is
/// then a contraction of the variance network against a mask.
///
/// # Examples
///
/// ```
/// use tensornet_core::{RankSpec, TensorNetwork};
/// use tensornet_anova::{Mask, SensitivityAnalysis};
///
/// let t = TensorNetwork::random(&[8, 8, 8], &RankSpec::train(3, 3), 0)?;
/// let sa = SensitivityAnalysis::new(&t, None)?;
///
/// let first = sa.sobol(&Mask::only(3, 0)?)?;
/// let total = sa.total_index(0)?;
/// assert!(first <= total + 1e-12);
///
/// let distribution = sa.dimension_distribution()?;
/// assert!((distribution.sum() - 1.0).abs() < 1e-9);
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SensitivityAnalysis {
    variance_network: TensorNetwork,
    mean: f64,
    variance: f64,
    degenerate: bool,
}

impl SensitivityAnalysis {
    /// Build the variance network of `t` under `marginals` (uniform when
    /// `None`).
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the marginals do not match the network's shape.
    pub fn new(t: &TensorNetwork, marginals: Option<&Marginals>) -> NetworkResult<Self> {
        let marginals = resolve_marginals("SensitivityAnalysis::new", t, marginals)?;

        let n_dims = t.ndim();
        let cores = (0..n_dims)
            .map(|n| variance_core(&AmbientCore::new(t, n), &marginals.get(n)))
            .collect();
        let variance_network = TensorNetwork::new(cores, vec![None; n_dims])?;

        let mean = contract_weighted(t, marginals.as_slice())?;
        let second_moment = sum(&variance_network)?;
        let raw_variance = second_moment - mean * mean;
        let degenerate = raw_variance <= DEGENERATE_VARIANCE_RATIO * second_moment.abs();
        let variance = if degenerate { 0.0 } else { raw_variance };
        log::debug!(
            "sensitivity analysis: mean {:.6e}, variance {:.6e}, variance ranks {:?}",
            mean,
            variance,
            variance_network.ranks_tt()
        );

        Ok(Self {
            variance_network,
            mean,
            variance,
            degenerate,
        })
    }

    /// The network over {0, 1}^N whose entry at α is D_α
    pub fn variance_network(&self) -> &TensorNetwork {
        &self.variance_network
    }

    /// E[T] under the marginals
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Var[T] under the marginals (0 for a constant function)
    pub fn variance(&self) -> f64 {
        self.variance
    }

    fn check_mask(&self, mask: &Mask) -> NetworkResult<()> {
        let n_dims = self.variance_network.ndim();
        if mask.ndim() != n_dims {
            return Err(NetworkError::invalid_mask(format!(
                "mask has {} variables, the function has {}",
                mask.ndim(),
                n_dims
            )));
        }
        Ok(())
    }

    /// Σ_{α ∈ mask, α ≠ ∅} mask(α)·D_α (unnormalized)
    ///
    /// # Errors
    ///
    /// `InvalidMask` if the mask has a different number of variables.
    pub fn masked_variance(&self, mask: &Mask) -> NetworkResult<f64> {
        self.check_mask(mask)?;
        if self.degenerate {
            return Ok(0.0);
        }
        let total = inner(mask.network(), &self.variance_network, None)?;
        let empty = mask.at_empty()?;
        Ok(total - empty * self.mean * self.mean)
    }

    /// Fraction of the variance selected by `mask` (0 for a constant function)
    pub fn sobol(&self, mask: &Mask) -> NetworkResult<f64> {
        let masked = self.masked_variance(mask)?;
        Ok(if self.degenerate {
            0.0
        } else {
            masked / self.variance
        })
    }

    /// Normalized variance component of exactly the subset `dims`
    pub fn variance_component(&self, dims: &[usize]) -> NetworkResult<f64> {
        self.sobol(&Mask::exactly(self.ndim(), dims)?)
    }

    /// Total index of variable `x`: every subset containing it
    pub fn total_index(&self, x: usize) -> NetworkResult<f64> {
        self.sobol(&Mask::superset_of(self.ndim(), &[x])?)
    }

    /// Closed index of `dims`: every nonempty subset of `dims`
    pub fn closed_index(&self, dims: &[usize]) -> NetworkResult<f64> {
        self.sobol(&Mask::subset_of(self.ndim(), dims)?)
    }

    /// Superset index of `dims`: every subset containing all of `dims`
    pub fn superset_index(&self, dims: &[usize]) -> NetworkResult<f64> {
        self.sobol(&Mask::superset_of(self.ndim(), dims)?)
    }

    /// E[|α|] under the distribution D_α / Var (0 for a constant function)
    pub fn mean_dimension(&self) -> NetworkResult<f64> {
        if self.degenerate {
            return Ok(0.0);
        }
        let weighted = inner(
            Mask::cardinality(self.ndim())?.network(),
            &self.variance_network,
            None,
        )?;
        Ok(weighted / self.variance)
    }

    /// Distribution of |α| over 0..=N under D_α / Var.
    ///
    /// The variance network is contracted with a counter that tracks how
    /// many variables have been included so far. A constant function gives
    /// `[1, 0, …, 0]`.
    pub fn dimension_distribution(&self) -> NetworkResult<Array1<f64>> {
        let n_dims = self.ndim();
        let mut out = Array1::<f64>::zeros(n_dims + 1);
        if self.degenerate {
            out[0] = 1.0;
            return Ok(out);
        }

        // frontier[k]: 1 × r, subsets of size k so far
        let mut frontier: Vec<Array2<f64>> = vec![Array2::zeros((1, 1)); n_dims + 1];
        frontier[0] = Array2::ones((1, 1));
        for n in 0..n_dims {
            let core = AmbientCore::new(&self.variance_network, n);
            let (_, r_right) = core.ranks();
            let mut next = vec![Array2::<f64>::zeros((1, r_right)); n_dims + 1];
            for k in 0..=n {
                next[k] += &core.apply(&frontier[k].view(), 0);
                next[k + 1] += &core.apply(&frontier[k].view(), 1);
            }
            frontier = next;
        }

        for k in 1..=n_dims {
            out[k] = frontier[k][[0, 0]] / self.variance;
        }
        Ok(out)
    }

    fn ndim(&self) -> usize {
        self.variance_network.ndim()
    }
}

/// Sobol index of `mask` for `t` (see [`SensitivityAnalysis::sobol`])
pub fn sobol(t: &TensorNetwork, mask: &Mask, marginals: Option<&Marginals>) -> NetworkResult<f64> {
    SensitivityAnalysis::new(t, marginals)?.sobol(mask)
}

/// Mean effective dimension of `t`
pub fn mean_dimension(t: &TensorNetwork, marginals: Option<&Marginals>) -> NetworkResult<f64> {
    SensitivityAnalysis::new(t, marginals)?.mean_dimension()
}

/// Distribution of the effective dimension of `t`
pub fn dimension_distribution(
    t: &TensorNetwork,
    marginals: Option<&Marginals>,
) -> NetworkResult<Array1<f64>> {
    SensitivityAnalysis::new(t, marginals)?.dimension_distribution()
}

/// Network equal to Σ_{α} mask(α)·f_α, the ANOVA terms kept by `mask`.
///
/// Each dimension's core becomes M⊗mask(0) + C(i)⊗mask(1), so ranks
/// multiply by the mask's ranks. The result has no factors.
///
/// # Errors
///
/// `InvalidMask` if the mask has a different number of variables,
/// `DimensionMismatch` if the marginals do not match the network's shape.
pub fn truncate_anova(
    t: &TensorNetwork,
    mask: &Mask,
    marginals: Option<&Marginals>,
) -> NetworkResult<TensorNetwork> {
    let n_dims = t.ndim();
    if mask.ndim() != n_dims {
        return Err(NetworkError::invalid_mask(format!(
            "mask has {} variables, the network has {}",
            mask.ndim(),
            n_dims
        )));
    }
    let marginals = resolve_marginals("truncate_anova", t, marginals)?;

    let mut cores = Vec::with_capacity(n_dims);
    for n in 0..n_dims {
        let branches = AmbientCore::new(mask.network(), n);
        let skip = branches.slice_matrix(n, 0)?;
        let keep = branches.slice_matrix(n, 1)?;

        let core = AmbientCore::new(t, n).to_train();
        let mean = weighted_slice(&core.view(), &marginals.get(n));
        let base = kronecker(&skip.view(), &mean.view());

        let (m_left, m_right) = skip.dim();
        let (r_left, size, r_right) = core.dim();
        let mut out = Array3::<f64>::zeros((m_left * r_left, size, m_right * r_right));
        for i in 0..size {
            let centered = &core.index_axis(Axis(1), i) - &mean;
            let slice = &base + &kronecker(&keep.view(), &centered.view());
            out.index_axis_mut(Axis(1), i).assign(&slice);
        }
        cores.push(Core::train(out));
    }
    TensorNetwork::new(cores, vec![None; n_dims])
}
