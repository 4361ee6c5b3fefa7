//! Variable-subset masks
//!
//! A [`Mask`] selects a family of variable subsets α ⊆ {0, …, N−1}. It is
//! stored as a rank-compressed indicator network over {0, 1}^N, where index
//! 1 at dimension n means "variable n is in α":
//!
//! ```text
//! mask(α) = 1  if α is selected
//!           0  otherwise
//! ```
//!
//! Simple families (a single variable, a [`Cube`] of literals, exact
//! subsets, subsets and supersets of a set) are rank-1 networks. Families
//! defined by subset size use a counter network whose state tracks how many
//! variables have been included so far. Masks combine with `&`, `|` and `!`
//! (or [`Mask::and`], [`Mask::or`], [`Mask::not`]); every combination is
//! rounded back to its minimal ranks.
//!
//! # Examples
//!
//! ```
//! use tensornet_anova::Mask;
//!
//! let x = Mask::variable(3, 0)?;
//! let z = Mask::variable(3, 2)?;
//! let either = (&x | &z)?;
//!
//! assert_eq!(either.evaluate(&[true, false, false])?, 1.0);
//! assert_eq!(either.evaluate(&[false, true, false])?, 0.0);
//! # Ok::<(), tensornet_core::NetworkError>(())
//! ```

use scirs2_core::ndarray_ext::Array3;
use std::ops::{BitAnd, BitOr, Not};
use tensornet_core::{Block3, Core, NetworkError, NetworkResult, TensorNetwork};
use tensornet_decomp::{round_tt, RoundingTarget};
use tensornet_kernels::{add, evaluate, hadamard, sub};

/// Relative error budget used when re-compressing combined masks
const MASK_ROUNDING_EPS: f64 = 1e-12;

/// A variable, either required (positive) or forbidden (negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Variable n must be in α
    Positive(usize),
    /// Variable n must not be in α
    Negative(usize),
}

impl Literal {
    /// Variable the literal refers to
    pub fn variable(&self) -> usize {
        match self {
            Literal::Positive(n) | Literal::Negative(n) => *n,
        }
    }
}

/// Per-variable constraint of a [`Cube`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector {
    /// No constraint
    #[default]
    Unset,
    /// Variable must be in α
    Include,
    /// Variable must not be in α
    Exclude,
}

impl Selector {
    /// Indicator over the two states (excluded, included)
    fn indicator(self) -> [f64; 2] {
        match self {
            Selector::Unset => [1.0, 1.0],
            Selector::Include => [0.0, 1.0],
            Selector::Exclude => [1.0, 0.0],
        }
    }
}

/// A conjunction of literals, one selector per variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cube {
    selectors: Vec<Selector>,
}

impl Cube {
    /// Build a cube over `n_dims` variables.
    ///
    /// Repeating a literal is allowed.
    ///
    /// # Errors
    ///
    /// `InvalidMask` if a literal refers to a variable outside 0..n_dims,
    /// or if a variable appears both positive and negative.
    pub fn new(n_dims: usize, literals: &[Literal]) -> NetworkResult<Self> {
        let mut selectors = vec![Selector::Unset; n_dims];
        for literal in literals {
            let n = literal.variable();
            if n >= n_dims {
                return Err(NetworkError::invalid_mask(format!(
                    "literal refers to variable {} but there are only {}",
                    n, n_dims
                )));
            }
            let wanted = match literal {
                Literal::Positive(_) => Selector::Include,
                Literal::Negative(_) => Selector::Exclude,
            };
            match selectors[n] {
                Selector::Unset => selectors[n] = wanted,
                current if current == wanted => {}
                _ => {
                    return Err(NetworkError::invalid_mask(format!(
                        "variable {} is both positive and negative",
                        n
                    )))
                }
            }
        }
        Ok(Self { selectors })
    }

    /// Selector of every variable
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Number of variables
    pub fn ndim(&self) -> usize {
        self.selectors.len()
    }
}

/// Indicator network over variable subsets
#[derive(Debug, Clone)]
pub struct Mask {
    network: TensorNetwork,
}

impl Mask {
    /// Wrap an existing network over {0, 1}^N.
    ///
    /// # Errors
    ///
    /// `InvalidMask` unless every dimension has size 2.
    pub fn from_network(network: TensorNetwork) -> NetworkResult<Self> {
        if let Some(n) = network.shape().iter().position(|&size| size != 2) {
            return Err(NetworkError::invalid_mask(format!(
                "dimension {} has size {}, masks need size 2",
                n,
                network.shape()[n]
            )));
        }
        Ok(Self { network })
    }

    /// Every subset
    pub fn all(n_dims: usize) -> NetworkResult<Self> {
        Self::from_selectors(&vec![Selector::Unset; n_dims])
    }

    /// No subset
    pub fn none(n_dims: usize) -> NetworkResult<Self> {
        Self::from_network(TensorNetwork::zeros(&vec![2; n_dims])?)
    }

    /// Subsets containing variable `n`
    pub fn variable(n_dims: usize, n: usize) -> NetworkResult<Self> {
        Self::from_cube(&Cube::new(n_dims, &[Literal::Positive(n)])?)
    }

    /// Subsets satisfying every literal of `cube`
    pub fn from_cube(cube: &Cube) -> NetworkResult<Self> {
        Self::from_selectors(cube.selectors())
    }

    /// Exactly the subset `dims`
    pub fn exactly(n_dims: usize, dims: &[usize]) -> NetworkResult<Self> {
        let selectors = selectors_for(n_dims, dims, Selector::Include, Selector::Exclude)?;
        Self::from_selectors(&selectors)
    }

    /// Every subset of `dims`, the empty set included
    pub fn subset_of(n_dims: usize, dims: &[usize]) -> NetworkResult<Self> {
        let selectors = selectors_for(n_dims, dims, Selector::Unset, Selector::Exclude)?;
        Self::from_selectors(&selectors)
    }

    /// Every superset of `dims`
    pub fn superset_of(n_dims: usize, dims: &[usize]) -> NetworkResult<Self> {
        let selectors = selectors_for(n_dims, dims, Selector::Include, Selector::Unset)?;
        Self::from_selectors(&selectors)
    }

    /// Exactly the singleton {n}
    pub fn only(n_dims: usize, n: usize) -> NetworkResult<Self> {
        Self::exactly(n_dims, &[n])
    }

    /// Weight network |α| (not an indicator).
    ///
    /// Contracting it against a variance network gives Σ_α |α|·D_α.
    pub fn cardinality(n_dims: usize) -> NetworkResult<Self> {
        check_ndim(n_dims)?;
        if n_dims == 1 {
            return Self::from_network(TensorNetwork::rank_one(&[vec![0.0, 1.0]])?);
        }

        // Running sum: state (1, Σ so far)
        let mut cores = Vec::with_capacity(n_dims);
        for n in 0..n_dims {
            let core = if n == 0 {
                Array3::from_shape_fn((1, 2, 2), |(_, x, k)| if k == 0 { 1.0 } else { x as f64 })
            } else if n + 1 == n_dims {
                Array3::from_shape_fn((2, 2, 1), |(k, x, _)| if k == 0 { x as f64 } else { 1.0 })
            } else {
                Array3::from_shape_fn((2, 2, 2), |(l, x, r)| match (l, r) {
                    (0, 0) | (1, 1) => 1.0,
                    (0, 1) => x as f64,
                    _ => 0.0,
                })
            };
            cores.push(Core::Train(Block3::new(core)));
        }
        Self::from_network(TensorNetwork::new(cores, vec![None; n_dims])?)
    }

    /// Subsets whose size is one of `sizes`.
    ///
    /// # Errors
    ///
    /// `InvalidMask` if a size exceeds `n_dims`.
    pub fn cardinality_in(n_dims: usize, sizes: &[usize]) -> NetworkResult<Self> {
        check_ndim(n_dims)?;
        if let Some(&k) = sizes.iter().find(|&&k| k > n_dims) {
            return Err(NetworkError::invalid_mask(format!(
                "subset size {} exceeds the number of variables {}",
                k, n_dims
            )));
        }

        // Counter: state k = number of variables included so far
        let states = n_dims + 1;
        let accept = |k: usize| sizes.contains(&k);
        let mut cores = Vec::with_capacity(n_dims);
        for n in 0..n_dims {
            let r_left = if n == 0 { 1 } else { states };
            let r_right = if n + 1 == n_dims { 1 } else { states };
            let mut core = Array3::<f64>::zeros((r_left, 2, r_right));
            for k in 0..r_left {
                for x in 0..2 {
                    let next = k + x;
                    if next >= states {
                        continue;
                    }
                    if n + 1 == n_dims {
                        if accept(next) {
                            core[[k, x, 0]] = 1.0;
                        }
                    } else {
                        core[[k, x, next]] = 1.0;
                    }
                }
            }
            cores.push(Core::Train(Block3::new(core)));
        }

        let counter = TensorNetwork::new(cores, vec![None; n_dims])?;
        Self::from_network(compress(&counter)?)
    }

    /// The underlying indicator network
    pub fn network(&self) -> &TensorNetwork {
        &self.network
    }

    /// Number of variables
    pub fn ndim(&self) -> usize {
        self.network.ndim()
    }

    /// Value of the mask at subset `alpha` (true = included)
    pub fn evaluate(&self, alpha: &[bool]) -> NetworkResult<f64> {
        let point: Vec<usize> = alpha.iter().map(|&b| usize::from(b)).collect();
        Ok(evaluate(&self.network, &[point])?[0])
    }

    /// Value at the empty subset
    pub fn at_empty(&self) -> NetworkResult<f64> {
        self.evaluate(&vec![false; self.ndim()])
    }

    /// Intersection
    pub fn and(&self, other: &Mask) -> NetworkResult<Mask> {
        self.check_compatible(other)?;
        Self::from_network(compress(&hadamard(&self.network, &other.network)?)?)
    }

    /// Union, a + b − a·b
    pub fn or(&self, other: &Mask) -> NetworkResult<Mask> {
        self.check_compatible(other)?;
        let both = hadamard(&self.network, &other.network)?;
        let union = sub(&add(&self.network, &other.network)?, &both)?;
        Self::from_network(compress(&union)?)
    }

    /// Complement, 1 − a
    pub fn not(&self) -> NetworkResult<Mask> {
        let all = Mask::all(self.ndim())?;
        Self::from_network(compress(&sub(&all.network, &self.network)?)?)
    }

    /// Difference a ∧ ¬b
    pub fn and_not(&self, other: &Mask) -> NetworkResult<Mask> {
        self.check_compatible(other)?;
        self.and(&other.not()?)
    }

    fn check_compatible(&self, other: &Mask) -> NetworkResult<()> {
        if self.ndim() != other.ndim() {
            return Err(NetworkError::invalid_mask(format!(
                "cannot combine masks over {} and {} variables",
                self.ndim(),
                other.ndim()
            )));
        }
        Ok(())
    }

    fn from_selectors(selectors: &[Selector]) -> NetworkResult<Self> {
        check_ndim(selectors.len())?;
        let vectors: Vec<Vec<f64>> = selectors.iter().map(|s| s.indicator().to_vec()).collect();
        Self::from_network(TensorNetwork::rank_one(&vectors)?)
    }
}

impl BitAnd for &Mask {
    type Output = NetworkResult<Mask>;

    fn bitand(self, rhs: &Mask) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for &Mask {
    type Output = NetworkResult<Mask>;

    fn bitor(self, rhs: &Mask) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for &Mask {
    type Output = NetworkResult<Mask>;

    fn not(self) -> Self::Output {
        Mask::not(self)
    }
}

fn check_ndim(n_dims: usize) -> NetworkResult<()> {
    if n_dims == 0 {
        return Err(NetworkError::invalid_mask("a mask needs at least one variable"));
    }
    Ok(())
}

/// `inside` for variables in `dims`, `outside` for the rest
fn selectors_for(
    n_dims: usize,
    dims: &[usize],
    inside: Selector,
    outside: Selector,
) -> NetworkResult<Vec<Selector>> {
    let mut selectors = vec![outside; n_dims];
    for &n in dims {
        if n >= n_dims {
            return Err(NetworkError::invalid_mask(format!(
                "variable {} out of range for {} variables",
                n, n_dims
            )));
        }
        selectors[n] = inside;
    }
    Ok(selectors)
}

fn compress(t: &TensorNetwork) -> NetworkResult<TensorNetwork> {
    round_tt(t, &RoundingTarget::new(MASK_ROUNDING_EPS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subsets(n_dims: usize) -> impl Iterator<Item = Vec<bool>> {
        (0..1usize << n_dims).map(move |bits| (0..n_dims).map(|n| (bits >> n) & 1 == 1).collect())
    }

    fn assert_indicator(mask: &Mask, expected: impl Fn(&[bool]) -> bool) {
        for alpha in subsets(mask.ndim()) {
            let want = if expected(&alpha) { 1.0 } else { 0.0 };
            let got = mask.evaluate(&alpha).unwrap();
            assert!((got - want).abs() < 1e-10, "{:?}: {} vs {}", alpha, got, want);
        }
    }

    #[test]
    fn test_cube_validation() {
        assert!(Cube::new(3, &[Literal::Positive(0), Literal::Positive(0)]).is_ok());
        assert!(matches!(
            Cube::new(3, &[Literal::Positive(3)]),
            Err(NetworkError::InvalidMask { .. })
        ));
        assert!(matches!(
            Cube::new(3, &[Literal::Positive(1), Literal::Negative(1)]),
            Err(NetworkError::InvalidMask { .. })
        ));
    }

    #[test]
    fn test_rank_one_masks() {
        let cube = Cube::new(4, &[Literal::Positive(1), Literal::Negative(3)]).unwrap();
        assert_indicator(&Mask::from_cube(&cube).unwrap(), |a| a[1] && !a[3]);
        assert_indicator(&Mask::exactly(4, &[0, 2]).unwrap(), |a| {
            a == [true, false, true, false]
        });
        assert_indicator(&Mask::subset_of(4, &[0, 2]).unwrap(), |a| !a[1] && !a[3]);
        assert_indicator(&Mask::superset_of(4, &[0, 2]).unwrap(), |a| a[0] && a[2]);
        assert_indicator(&Mask::only(4, 3).unwrap(), |a| a == [false, false, false, true]);
        assert_indicator(&Mask::none(4).unwrap(), |_| false);
        assert_indicator(&Mask::all(4).unwrap(), |_| true);
    }

    #[test]
    fn test_cardinality_weights() {
        let mask = Mask::cardinality(4).unwrap();
        for alpha in subsets(4) {
            let size = alpha.iter().filter(|&&b| b).count() as f64;
            assert!((mask.evaluate(&alpha).unwrap() - size).abs() < 1e-12);
        }
        assert_eq!(Mask::cardinality(1).unwrap().evaluate(&[true]).unwrap(), 1.0);
    }

    #[test]
    fn test_cardinality_in() {
        let mask = Mask::cardinality_in(5, &[0, 2, 5]).unwrap();
        assert_indicator(&mask, |a| {
            let k = a.iter().filter(|&&b| b).count();
            k == 0 || k == 2 || k == 5
        });
        assert!(matches!(
            Mask::cardinality_in(3, &[4]),
            Err(NetworkError::InvalidMask { .. })
        ));
    }

    #[test]
    fn test_combinators() {
        let x = Mask::variable(3, 0).unwrap();
        let z = Mask::variable(3, 2).unwrap();

        assert_indicator(&(&x & &z).unwrap(), |a| a[0] && a[2]);
        assert_indicator(&(&x | &z).unwrap(), |a| a[0] || a[2]);
        assert_indicator(&(!&x).unwrap(), |a| !a[0]);
        assert_indicator(&x.and_not(&z).unwrap(), |a| a[0] && !a[2]);

        let union = (&x | &z).unwrap();
        assert!(union.network().ranks_tt().iter().all(|&r| r <= 2));
    }

    #[test]
    fn test_incompatible_masks() {
        let a = Mask::variable(3, 0).unwrap();
        let b = Mask::variable(4, 0).unwrap();
        assert!(matches!(a.and(&b), Err(NetworkError::InvalidMask { .. })));
        assert!(matches!(
            Mask::variable(3, 7),
            Err(NetworkError::InvalidMask { .. })
        ));
        assert!(matches!(
            Mask::from_network(TensorNetwork::ones(&[2, 3]).unwrap()),
            Err(NetworkError::InvalidMask { .. })
        ));
    }
}
