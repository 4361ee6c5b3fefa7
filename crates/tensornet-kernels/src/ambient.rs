//! Per-dimension cores in ambient index space
//!
//! An [`AmbientCore`] is one dimension of a network with its Tucker factor
//! (if any) already applied, so that its middle axis runs over the ambient
//! indices 0..Iₙ. Every contraction routine walks a network as a chain of
//! ambient cores and a running frontier matrix of shape (m × r_L):
//!
//! ```text
//! frontier (m × r_L)  --apply(i)-->  frontier (m × r_R)
//! ```
//!
//! Parafac slices are diagonal R × R matrices. They are applied as a
//! broadcast multiply on the frontier columns and never materialized. At
//! the two ends of the network a parafac core is capped: a first core acts
//! as a 1 × R row and a last core as an R × 1 column.

use scirs2_core::ndarray_ext::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use tensornet_core::{Core, NetworkError, NetworkResult, RankPair, TensorNetwork};

/// One dimension of a network, expressed over its ambient indices
#[derive(Debug, Clone)]
pub enum AmbientCore {
    /// (r_L, Iₙ, r_R) core
    Train(Array3<f64>),
    /// (Iₙ, R) rows acting as diagonal slices
    Parafac {
        rows: Array2<f64>,
        left_cap: bool,
        right_cap: bool,
    },
}

impl AmbientCore {
    /// Ambient core of dimension `n`, factor applied
    pub fn new(t: &TensorNetwork, n: usize) -> Self {
        let n_dims = t.ndim();
        let factor = t.factor(n).map(|f| f.to_array());

        match t.core(n) {
            Core::Train(block) => {
                let core = block.read();
                match factor {
                    None => AmbientCore::Train(core.to_owned()),
                    Some(u) => {
                        let (r_left, _, r_right) = core.dim();
                        let mut out = Array3::<f64>::zeros((r_left, u.nrows(), r_right));
                        for l in 0..r_left {
                            let slab = u.dot(&core.index_axis(Axis(0), l));
                            out.index_axis_mut(Axis(0), l).assign(&slab);
                        }
                        AmbientCore::Train(out)
                    }
                }
            }
            Core::Parafac(block) => {
                let core = block.read();
                let rows = match factor {
                    None => core.to_owned(),
                    Some(u) => u.dot(&*core),
                };
                AmbientCore::Parafac {
                    rows,
                    left_cap: n == 0,
                    right_cap: n + 1 == n_dims,
                }
            }
        }
    }

    /// Ambient cores of every dimension in order
    pub fn all(t: &TensorNetwork) -> Vec<Self> {
        (0..t.ndim()).map(|n| Self::new(t, n)).collect()
    }

    /// Ambient size Iₙ
    pub fn size(&self) -> usize {
        match self {
            AmbientCore::Train(core) => core.dim().1,
            AmbientCore::Parafac { rows, .. } => rows.nrows(),
        }
    }

    /// (left, right) rank pair
    pub fn ranks(&self) -> RankPair {
        match self {
            AmbientCore::Train(core) => {
                let (l, _, r) = core.dim();
                (l, r)
            }
            AmbientCore::Parafac {
                rows,
                left_cap,
                right_cap,
            } => {
                let rank = rows.ncols();
                (
                    if *left_cap { 1 } else { rank },
                    if *right_cap { 1 } else { rank },
                )
            }
        }
    }

    fn check_index(&self, dim: usize, index: usize) -> NetworkResult<()> {
        let size = self.size();
        if index >= size {
            return Err(NetworkError::IndexOutOfBounds { dim, index, size });
        }
        Ok(())
    }

    /// Slice Gₙ(i) as an explicit (r_L × r_R) matrix.
    ///
    /// `dim` is only used to label the error.
    pub fn slice_matrix(&self, dim: usize, i: usize) -> NetworkResult<Array2<f64>> {
        self.check_index(dim, i)?;
        Ok(match self {
            AmbientCore::Train(core) => core.index_axis(Axis(1), i).to_owned(),
            AmbientCore::Parafac {
                rows,
                left_cap,
                right_cap,
            } => diagonal_slice(rows.row(i), *left_cap, *right_cap),
        })
    }

    /// Frontier update x · Gₙ(i)
    ///
    /// `x` has shape (m × r_L); the result has shape (m × r_R).
    pub fn apply(&self, x: &ArrayView2<f64>, i: usize) -> Array2<f64> {
        match self {
            AmbientCore::Train(core) => x.dot(&core.index_axis(Axis(1), i)),
            AmbientCore::Parafac {
                rows,
                left_cap,
                right_cap,
            } => apply_diagonal(x, rows.row(i), *left_cap, *right_cap),
        }
    }

    /// Frontier update x · Σᵢ wᵢ Gₙ(i)
    pub fn apply_weighted(&self, x: &ArrayView2<f64>, weights: &ArrayView1<f64>) -> Array2<f64> {
        match self {
            AmbientCore::Train(core) => {
                let (r_left, _, r_right) = core.dim();
                let mut merged = Array2::<f64>::zeros((r_left, r_right));
                for (i, &w) in weights.iter().enumerate() {
                    if w != 0.0 {
                        merged.scaled_add(w, &core.index_axis(Axis(1), i));
                    }
                }
                x.dot(&merged)
            }
            AmbientCore::Parafac {
                rows,
                left_cap,
                right_cap,
            } => {
                let diagonal: Array1<f64> = rows.t().dot(weights);
                apply_diagonal(x, diagonal.view(), *left_cap, *right_cap)
            }
        }
    }

    /// Expand the frontier over every ambient index.
    ///
    /// `x` has shape (m × r_L); the result has shape (m·Iₙ × r_R) with the
    /// ambient index running fastest.
    pub fn expand(&self, x: &ArrayView2<f64>) -> NetworkResult<Array2<f64>> {
        let m = x.nrows();
        let size = self.size();
        let (r_left, r_right) = self.ranks();

        match self {
            AmbientCore::Train(core) => {
                let unfolded = core
                    .to_shape((r_left, size * r_right))
                    .map_err(|e| NetworkError::linalg("expand", e))?;
                x.dot(&unfolded)
                    .into_shape_with_order((m * size, r_right))
                    .map_err(|e| NetworkError::linalg("expand", e))
            }
            AmbientCore::Parafac { .. } => {
                let mut out = Array3::<f64>::zeros((m, size, r_right));
                for i in 0..size {
                    out.index_axis_mut(Axis(1), i).assign(&self.apply(x, i));
                }
                out.into_shape_with_order((m * size, r_right))
                    .map_err(|e| NetworkError::linalg("expand", e))
            }
        }
    }

    /// Explicit three-axis form of this dimension
    pub fn to_train(&self) -> Array3<f64> {
        match self {
            AmbientCore::Train(core) => core.clone(),
            AmbientCore::Parafac {
                rows,
                left_cap,
                right_cap,
            } => parafac_as_train(&rows.view(), *left_cap, *right_cap),
        }
    }
}

/// Explicit (r_L, S, r_R) form of a parafac block (S × R), caps applied
pub fn parafac_as_train(rows: &ArrayView2<f64>, left_cap: bool, right_cap: bool) -> Array3<f64> {
    let (size, rank) = rows.dim();
    let r_left = if left_cap { 1 } else { rank };
    let r_right = if right_cap { 1 } else { rank };

    let mut out = Array3::<f64>::zeros((r_left, size, r_right));
    for ((i, r), &v) in rows.indexed_iter() {
        let l = if left_cap { 0 } else { r };
        let k = if right_cap { 0 } else { r };
        out[[l, i, k]] += v;
    }
    out
}

/// Explicit train form of core `n` in feature space (factor not applied)
pub fn core_as_train(core: &Core, n: usize, n_dims: usize) -> Array3<f64> {
    match core {
        Core::Train(block) => block.to_array(),
        Core::Parafac(block) => parafac_as_train(&block.read().view(), n == 0, n + 1 == n_dims),
    }
}

fn diagonal_slice(diagonal: ArrayView1<f64>, left_cap: bool, right_cap: bool) -> Array2<f64> {
    let rank = diagonal.len();
    match (left_cap, right_cap) {
        (false, false) => Array2::from_diag(&diagonal),
        (true, false) => Array2::from_shape_fn((1, rank), |(_, r)| diagonal[r]),
        (false, true) => Array2::from_shape_fn((rank, 1), |(r, _)| diagonal[r]),
        (true, true) => Array2::from_elem((1, 1), diagonal.sum()),
    }
}

fn apply_diagonal(
    x: &ArrayView2<f64>,
    diagonal: ArrayView1<f64>,
    left_cap: bool,
    right_cap: bool,
) -> Array2<f64> {
    match (left_cap, right_cap) {
        (false, false) => x * &diagonal,
        (true, false) => x.dot(&diagonal.insert_axis(Axis(0))),
        (false, true) => x.dot(&diagonal.insert_axis(Axis(1))),
        (true, true) => {
            let total = diagonal.sum();
            x.mapv(|v| v * total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;
    use tensornet_core::Block2;

    fn cp_network() -> TensorNetwork {
        TensorNetwork::from_parafac_blocks(vec![
            Block2::new(array![[1.0, 2.0], [3.0, 4.0]]),
            Block2::new(array![[1.0, -1.0], [0.5, 2.0], [1.0, 1.0]]),
            Block2::new(array![[2.0, 1.0], [1.0, 3.0]]),
        ])
        .unwrap()
    }

    #[test]
    fn test_parafac_caps() {
        let t = cp_network();
        let cores = AmbientCore::all(&t);

        assert_eq!(cores[0].ranks(), (1, 2));
        assert_eq!(cores[1].ranks(), (2, 2));
        assert_eq!(cores[2].ranks(), (2, 1));
    }

    #[test]
    fn test_apply_matches_slice_matrix() {
        let t = cp_network();
        let cores = AmbientCore::all(&t);
        let x = array![[1.0, 2.0], [-1.0, 0.5]];

        for i in 0..3 {
            let expected = x.dot(&cores[1].slice_matrix(1, i).unwrap());
            assert_eq!(cores[1].apply(&x.view(), i), expected);
        }
        let first = array![[2.0]];
        let expected = first.dot(&cores[0].slice_matrix(0, 1).unwrap());
        assert_eq!(cores[0].apply(&first.view(), 1), expected);
    }

    #[test]
    fn test_to_train_matches_slices() {
        let t = cp_network();
        let cores = AmbientCore::all(&t);

        for core in &cores {
            let train = core.to_train();
            for i in 0..core.size() {
                assert_eq!(
                    train.index_axis(Axis(1), i).to_owned(),
                    core.slice_matrix(0, i).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_factor_is_applied() {
        let core = Array3::from_shape_fn((1, 2, 1), |(_, s, _)| (s + 1) as f64);
        let factor = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let t = TensorNetwork::from_blocks(vec![core.into_dyn()], vec![Some(factor)]).unwrap();
        let ambient = AmbientCore::new(&t, 0);

        assert_eq!(ambient.size(), 3);
        assert_eq!(ambient.slice_matrix(0, 2).unwrap()[[0, 0]], 3.0);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let t = cp_network();
        let core = AmbientCore::new(&t, 1);
        assert!(matches!(
            core.slice_matrix(1, 3),
            Err(NetworkError::IndexOutOfBounds {
                dim: 1,
                index: 3,
                size: 3
            })
        ));
    }

    #[test]
    fn test_apply_weighted_is_linear() {
        let t = cp_network();
        let cores = AmbientCore::all(&t);
        let x = array![[1.0, 1.0]];
        let w = array![0.25, 0.5, 0.25];

        let mut expected = Array2::<f64>::zeros((1, 2));
        for i in 0..3 {
            expected.scaled_add(w[i], &cores[1].apply(&x.view(), i));
        }
        let got = cores[1].apply_weighted(&x.view(), &w.view());
        for (a, b) in got.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
