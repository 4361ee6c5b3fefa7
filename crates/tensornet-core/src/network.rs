//! The tensor network type
//!
//! A [`TensorNetwork`] represents an N-dimensional array of shape
//! (I₁, …, I_N) as an ordered sequence of N cores, one per dimension, plus
//! an optional Tucker factor per dimension:
//!
//! - **Train** cores have shape (r_L, Sₙ, r_R) and chain left/right ranks.
//! - **Parafac** cores have shape (Sₙ, R) and act as train cores whose
//!   middle slices are diagonal R × R matrices. A parafac core in the first
//!   position acts as a 1 × R row and one in the last position as an
//!   R × 1 column, so the boundary ranks are always 1.
//! - A **factor** Uₙ of shape (Iₙ, Sₙ) maps the ambient index of dimension
//!   n onto the core's feature axis. Without a factor, Sₙ = Iₙ.
//!
//! ```text
//!   I₁        I₂        I₃
//!   |         |         |
//!  [U₁]      [U₂]       |
//!   |S₁       |S₂       |
//!  (G₁)--r₁--<G₂>--R--<G₃>
//!  train     parafac  parafac
//! ```
//!
//! # Invariants
//!
//! Checked once, at construction:
//!
//! - right rank of core n equals left rank of core n+1;
//! - left rank of core 0 and right rank of core N-1 are 1;
//! - a factor's column count equals its core's feature size.

use crate::block::{Block2, Block3};
use crate::error::{NetworkError, NetworkResult};
use crate::types::{RankPair, Shape};
use scirs2_core::ndarray_ext::{Array2, Array3, ArrayD, Ix2, Ix3};
use std::fmt;

/// How a core participates in contraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoreKind {
    /// Three-axis core chaining a left and a right rank
    Train,
    /// Two-axis core acting as a diagonal three-axis core
    Parafac,
}

/// A per-dimension core block, tagged by kind
#[derive(Debug, Clone)]
pub enum Core {
    /// (r_L, Sₙ, r_R) block
    Train(Block3),
    /// (Sₙ, R) block
    Parafac(Block2),
}

impl Core {
    /// Wrap an owned three-axis array as a train core
    pub fn train(array: Array3<f64>) -> Self {
        Core::Train(Block3::new(array))
    }

    /// Wrap an owned two-axis array as a parafac core
    pub fn parafac(array: Array2<f64>) -> Self {
        Core::Parafac(Block2::new(array))
    }

    /// Kind tag of this core
    pub fn kind(&self) -> CoreKind {
        match self {
            Core::Train(_) => CoreKind::Train,
            Core::Parafac(_) => CoreKind::Parafac,
        }
    }

    /// Size of the feature (middle) axis
    pub fn feature_size(&self) -> usize {
        match self {
            Core::Train(block) => block.read().dim().1,
            Core::Parafac(block) => block.read().nrows(),
        }
    }

    /// Number of stored elements
    pub fn len(&self) -> usize {
        match self {
            Core::Train(block) => block.len(),
            Core::Parafac(block) => block.len(),
        }
    }

    /// True if the core stores no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the underlying block is flagged trainable
    pub fn is_trainable(&self) -> bool {
        match self {
            Core::Train(block) => block.is_trainable(),
            Core::Parafac(block) => block.is_trainable(),
        }
    }

    /// Flag the underlying block as trainable or frozen
    pub fn set_trainable(&self, trainable: bool) {
        match self {
            Core::Train(block) => block.set_trainable(trainable),
            Core::Parafac(block) => block.set_trainable(trainable),
        }
    }

    /// Copy of this core with freshly allocated storage
    pub fn deep_copy(&self) -> Self {
        match self {
            Core::Train(block) => Core::Train(block.deep_copy()),
            Core::Parafac(block) => Core::Parafac(block.deep_copy()),
        }
    }

    /// Rank pair at position `n` of an `n_dims`-dimensional network
    pub fn rank_pair(&self, n: usize, n_dims: usize) -> RankPair {
        match self {
            Core::Train(block) => {
                let (left, _, right) = block.read().dim();
                (left, right)
            }
            Core::Parafac(block) => {
                let rank = block.read().ncols();
                let left = if n == 0 { 1 } else { rank };
                let right = if n + 1 == n_dims { 1 } else { rank };
                (left, right)
            }
        }
    }

    /// Column count of a parafac core
    pub fn parafac_rank(&self) -> Option<usize> {
        match self {
            Core::Train(_) => None,
            Core::Parafac(block) => Some(block.read().ncols()),
        }
    }
}

/// Metadata describing a network for display purposes
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkSummary {
    /// Ambient shape
    pub shape: Vec<usize>,
    /// Kind of every core
    pub kinds: Vec<CoreKind>,
    /// N+1 junction ranks, boundaries included
    pub ranks_tt: Vec<usize>,
    /// Feature size of every core (`None` where no factor is attached)
    pub ranks_tucker: Vec<Option<usize>>,
    /// Total element count of cores and factors
    pub num_parameters: usize,
}

/// Compressed N-dimensional array built from train / parafac cores and
/// optional Tucker factors
#[derive(Debug, Clone)]
pub struct TensorNetwork {
    cores: Vec<Core>,
    factors: Vec<Option<Block2>>,
    shape: Shape,
}

impl TensorNetwork {
    /// Build a network from cores and (optional) factors, validating every
    /// adjacency and shape invariant.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` naming the offending pair of dimensions if a factor
    /// does not match its core or two consecutive ranks disagree.
    pub fn new(cores: Vec<Core>, factors: Vec<Option<Block2>>) -> NetworkResult<Self> {
        let n_dims = cores.len();
        if n_dims == 0 {
            return Err(NetworkError::invalid_argument(
                "TensorNetwork::new",
                "a network needs at least one core",
            ));
        }
        if factors.len() != n_dims {
            return Err(NetworkError::shape_mismatch(
                0,
                n_dims.saturating_sub(1),
                format!("{} cores but {} factor slots", n_dims, factors.len()),
            ));
        }

        let mut shape = Shape::with_capacity(n_dims);
        for (n, (core, factor)) in cores.iter().zip(factors.iter()).enumerate() {
            let features = core.feature_size();
            let ambient = match factor {
                Some(factor) => {
                    let (rows, cols) = factor.read().dim();
                    if cols != features {
                        return Err(NetworkError::shape_mismatch(
                            n,
                            n,
                            format!(
                                "factor has {} columns but the core has {} features",
                                cols, features
                            ),
                        ));
                    }
                    rows
                }
                None => features,
            };
            shape.push(ambient);
        }

        let pairs: Vec<RankPair> = cores
            .iter()
            .enumerate()
            .map(|(n, core)| core.rank_pair(n, n_dims))
            .collect();

        if pairs[0].0 != 1 {
            return Err(NetworkError::shape_mismatch(
                0,
                0,
                format!("first core must have left rank 1, got {}", pairs[0].0),
            ));
        }
        if pairs[n_dims - 1].1 != 1 {
            return Err(NetworkError::shape_mismatch(
                n_dims - 1,
                n_dims - 1,
                format!(
                    "last core must have right rank 1, got {}",
                    pairs[n_dims - 1].1
                ),
            ));
        }
        for n in 0..n_dims - 1 {
            if pairs[n].1 != pairs[n + 1].0 {
                return Err(NetworkError::shape_mismatch(
                    n,
                    n + 1,
                    format!(
                        "right rank {} does not match left rank {}",
                        pairs[n].1,
                        pairs[n + 1].0
                    ),
                ));
            }
        }

        Ok(Self {
            cores,
            factors,
            shape,
        })
    }

    /// Build a network from owned arrays.
    ///
    /// Two-axis blocks become parafac cores and three-axis blocks train
    /// cores. A four-axis block (r_L, I, J, r_R) becomes a train core over
    /// the merged ambient axis of size I·J (row-major).
    pub fn from_blocks(
        blocks: Vec<ArrayD<f64>>,
        factors: Vec<Option<Array2<f64>>>,
    ) -> NetworkResult<Self> {
        let mut cores = Vec::with_capacity(blocks.len());
        for (n, block) in blocks.into_iter().enumerate() {
            let core = match block.ndim() {
                2 => Core::Parafac(Block2::new(
                    block
                        .into_dimensionality::<Ix2>()
                        .map_err(|e| NetworkError::shape_mismatch(n, n, e.to_string()))?,
                )),
                3 => Core::Train(Block3::new(
                    block
                        .into_dimensionality::<Ix3>()
                        .map_err(|e| NetworkError::shape_mismatch(n, n, e.to_string()))?,
                )),
                4 => {
                    let s = block.shape().to_vec();
                    let merged = block
                        .as_standard_layout()
                        .to_owned()
                        .into_shape_with_order((s[0], s[1] * s[2], s[3]))
                        .map_err(|e| NetworkError::shape_mismatch(n, n, e.to_string()))?;
                    Core::Train(Block3::new(merged))
                }
                other => {
                    return Err(NetworkError::shape_mismatch(
                        n,
                        n,
                        format!("blocks must have 2, 3 or 4 axes, got {}", other),
                    ))
                }
            };
            cores.push(core);
        }
        let factors = factors.into_iter().map(|f| f.map(Block2::new)).collect();
        Self::new(cores, factors)
    }

    /// Build a pure parafac network from (possibly shared) factor blocks.
    ///
    /// Passing clones of one [`Block2`] at several positions yields a
    /// symmetric network whose dimensions share storage.
    pub fn from_parafac_blocks(blocks: Vec<Block2>) -> NetworkResult<Self> {
        let n_dims = blocks.len();
        let cores = blocks.into_iter().map(Core::Parafac).collect();
        Self::new(cores, vec![None; n_dims])
    }

    /// Ambient shape (I₁, …, I_N)
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions N
    pub fn ndim(&self) -> usize {
        self.cores.len()
    }

    /// Number of entries of the represented array
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// All cores in order
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Core of dimension `n`
    pub fn core(&self, n: usize) -> &Core {
        &self.cores[n]
    }

    /// All factor slots in order
    pub fn factors(&self) -> &[Option<Block2>] {
        &self.factors
    }

    /// Factor of dimension `n`, if any
    pub fn factor(&self, n: usize) -> Option<&Block2> {
        self.factors[n].as_ref()
    }

    /// Kind tag of dimension `n`
    pub fn kind(&self, n: usize) -> CoreKind {
        self.cores[n].kind()
    }

    /// Kind tags of all dimensions
    pub fn kinds(&self) -> Vec<CoreKind> {
        self.cores.iter().map(Core::kind).collect()
    }

    /// (left, right) rank pair of dimension `n`
    pub fn rank_pair(&self, n: usize) -> RankPair {
        self.cores[n].rank_pair(n, self.ndim())
    }

    /// The N+1 junction ranks, including the two boundary 1s
    pub fn ranks_tt(&self) -> Vec<usize> {
        let mut ranks = Vec::with_capacity(self.ndim() + 1);
        ranks.push(1);
        for n in 0..self.ndim() {
            ranks.push(self.rank_pair(n).1);
        }
        ranks
    }

    /// Feature size of every dimension that carries a factor
    pub fn ranks_tucker(&self) -> Vec<Option<usize>> {
        self.cores
            .iter()
            .zip(self.factors.iter())
            .map(|(core, factor)| factor.as_ref().map(|_| core.feature_size()))
            .collect()
    }

    /// Sum of core and factor element counts over all positions
    pub fn num_parameters(&self) -> usize {
        let cores: usize = self.cores.iter().map(Core::len).sum();
        let factors: usize = self.factors.iter().flatten().map(|f| f.len()).sum();
        cores + factors
    }

    /// Degrees of freedom: element count of every trainable core and factor
    pub fn dof(&self) -> usize {
        let mut result = 0;
        for (core, factor) in self.cores.iter().zip(self.factors.iter()) {
            if core.is_trainable() {
                result += core.len();
            }
            if let Some(factor) = factor {
                if factor.is_trainable() {
                    result += factor.len();
                }
            }
        }
        result
    }

    /// Ratio between the dense element count and the stored parameters
    pub fn compression_ratio(&self) -> f64 {
        self.numel() as f64 / self.num_parameters().max(1) as f64
    }

    /// Flag every core and factor as trainable or frozen
    pub fn set_trainable(&self, trainable: bool) {
        for core in &self.cores {
            core.set_trainable(trainable);
        }
        for factor in self.factors.iter().flatten() {
            factor.set_trainable(trainable);
        }
    }

    /// Copy of the network with no storage shared with `self`
    pub fn deep_copy(&self) -> Self {
        Self {
            cores: self.cores.iter().map(Core::deep_copy).collect(),
            factors: self
                .factors
                .iter()
                .map(|f| f.as_ref().map(Block2::deep_copy))
                .collect(),
            shape: self.shape.clone(),
        }
    }

    /// Metadata for external renderers
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            shape: self.shape.to_vec(),
            kinds: self.kinds(),
            ranks_tt: self.ranks_tt(),
            ranks_tucker: self.ranks_tucker(),
            num_parameters: self.num_parameters(),
        }
    }

    /// Decompose into cores and factors
    pub fn into_parts(self) -> (Vec<Core>, Vec<Option<Block2>>) {
        (self.cores, self.factors)
    }
}

impl fmt::Display for TensorNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n_dims = self.ndim();
        let has_train = self.cores.iter().any(|c| c.kind() == CoreKind::Train);
        let has_parafac = self.cores.iter().any(|c| c.kind() == CoreKind::Parafac);
        let has_tucker = self.factors.iter().any(Option::is_some);

        let mut formats = Vec::new();
        if has_train {
            formats.push("TT");
        }
        if has_parafac {
            formats.push("CP");
        }
        if has_tucker {
            formats.push("Tucker");
        }
        writeln!(f, "{}D {} tensor:", n_dims, formats.join("-"))?;

        let cell = |s: String| format!("{:^5}", s);
        let line: String = self.shape.iter().map(|i| cell(i.to_string())).collect();
        writeln!(f, " {}", line)?;
        let line: String = (0..n_dims).map(|_| cell("|".to_string())).collect();
        writeln!(f, " {}", line)?;

        if has_tucker {
            let line: String = self
                .ranks_tucker()
                .iter()
                .map(|r| cell(r.map_or(String::new(), |r| r.to_string())))
                .collect();
            writeln!(f, " {}", line)?;
        }

        let line: String = self
            .cores
            .iter()
            .enumerate()
            .map(|(n, core)| match core.kind() {
                CoreKind::Train => cell(format!("({})", n)),
                CoreKind::Parafac => cell(format!("<{}>", n)),
            })
            .collect();
        writeln!(f, " {}", line)?;

        let ranks = self.ranks_tt();
        let line: String = ranks.iter().map(|r| cell(r.to_string())).collect();
        write!(f, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::Array3;

    fn train_network(shape: &[usize], rank: usize) -> TensorNetwork {
        let n_dims = shape.len();
        let cores = shape
            .iter()
            .enumerate()
            .map(|(n, &i)| {
                let left = if n == 0 { 1 } else { rank };
                let right = if n + 1 == n_dims { 1 } else { rank };
                Core::train(Array3::ones((left, i, right)))
            })
            .collect();
        TensorNetwork::new(cores, vec![None; n_dims]).unwrap()
    }

    #[test]
    fn test_train_network_metadata() {
        let t = train_network(&[3, 4, 5], 2);

        assert_eq!(t.shape(), &[3, 4, 5]);
        assert_eq!(t.ndim(), 3);
        assert_eq!(t.ranks_tt(), vec![1, 2, 2, 1]);
        assert_eq!(t.kinds(), vec![CoreKind::Train; 3]);
        assert_eq!(t.num_parameters(), 3 * 2 + 2 * 4 * 2 + 2 * 5);
        assert_eq!(t.numel(), 60);
    }

    #[test]
    fn test_rank_mismatch_names_pair() {
        let cores = vec![
            Core::train(Array3::ones((1, 3, 2))),
            Core::train(Array3::ones((3, 4, 1))),
        ];
        let err = TensorNetwork::new(cores, vec![None, None]).unwrap_err();

        match err {
            NetworkError::ShapeMismatch { dims, .. } => assert_eq!(dims, (0, 1)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_boundary_rank_checked() {
        let cores = vec![Core::train(Array3::ones((2, 3, 1)))];
        assert!(matches!(
            TensorNetwork::new(cores, vec![None]),
            Err(NetworkError::ShapeMismatch { dims: (0, 0), .. })
        ));
    }

    #[test]
    fn test_factor_columns_checked() {
        let cores = vec![Core::train(Array3::ones((1, 3, 1)))];
        let factors = vec![Some(Block2::new(Array2::ones((10, 4))))];
        assert!(matches!(
            TensorNetwork::new(cores, factors),
            Err(NetworkError::ShapeMismatch { dims: (0, 0), .. })
        ));
    }

    #[test]
    fn test_factor_sets_ambient_size() {
        let cores = vec![
            Core::train(Array3::ones((1, 3, 2))),
            Core::parafac(Array2::ones((4, 2))),
        ];
        let factors = vec![Some(Block2::new(Array2::ones((10, 3)))), None];
        let t = TensorNetwork::new(cores, factors).unwrap();

        assert_eq!(t.shape(), &[10, 4]);
        assert_eq!(t.ranks_tucker(), vec![Some(3), None]);
        assert_eq!(t.rank_pair(1), (2, 1));
    }

    #[test]
    fn test_parafac_boundary_caps() {
        let shared = Block2::new(Array2::ones((5, 3)));
        let t = TensorNetwork::from_parafac_blocks(vec![
            shared.clone(),
            shared.clone(),
            Block2::new(Array2::ones((7, 3))),
        ])
        .unwrap();

        assert_eq!(t.ranks_tt(), vec![1, 3, 3, 1]);
        assert_eq!(t.shape(), &[5, 5, 7]);
        match (t.core(0), t.core(1)) {
            (Core::Parafac(a), Core::Parafac(b)) => assert!(a.ptr_eq(b)),
            _ => panic!("expected parafac cores"),
        }
    }

    #[test]
    fn test_from_blocks_dispatches_on_axes() {
        let blocks = vec![
            Array3::<f64>::ones((1, 2, 3)).into_dyn(),
            ArrayD::<f64>::ones(scirs2_core::ndarray_ext::IxDyn(&[3, 2, 2, 1])),
        ];
        let t = TensorNetwork::from_blocks(blocks, vec![None, None]).unwrap();

        assert_eq!(t.shape(), &[2, 4]);
        assert_eq!(t.kinds(), vec![CoreKind::Train, CoreKind::Train]);
    }

    #[test]
    fn test_dof_counts_trainable_only() {
        let t = train_network(&[3, 3], 2);
        assert_eq!(t.dof(), 0);

        t.core(0).set_trainable(true);
        assert_eq!(t.dof(), 6);

        t.set_trainable(true);
        assert_eq!(t.dof(), t.num_parameters());
    }

    #[test]
    fn test_display_lists_ranks() {
        let t = train_network(&[3, 4], 2);
        let text = format!("{}", t);

        assert!(text.starts_with("2D TT tensor:"));
        assert!(text.contains("(0)"));
        assert!(text.contains("(1)"));
    }

    #[test]
    fn test_deep_copy_shares_nothing() {
        let t = train_network(&[3, 4], 2);
        let copy = t.deep_copy();

        match (t.core(0), copy.core(0)) {
            (Core::Train(a), Core::Train(b)) => assert!(!a.ptr_eq(b)),
            _ => panic!("expected train cores"),
        }
    }
}
