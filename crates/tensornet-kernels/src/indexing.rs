//! Compressed indexing
//!
//! Selecting entries of a network returns another network (or a scalar when
//! every dimension is fixed), never a dense array:
//!
//! - [`Index::At`] fixes a coordinate. The dimension's slice matrix Gₙ(i)
//!   is absorbed into the nearest surviving neighbour and the dimension
//!   disappears. A parafac neighbour that absorbs a slice is converted to
//!   train form.
//! - [`Index::Range`] and [`Index::Take`] sub-select rows of the factor (or
//!   of the core's ambient axis when there is no factor); the dimension
//!   stays, with a smaller Iₙ.
//! - [`Index::Full`] keeps the dimension as is, sharing its blocks.

use crate::ambient::{core_as_train, AmbientCore};
use scirs2_core::ndarray_ext::{Array2, Array3, Axis};
use std::ops::Range;
use tensornet_core::{Block2, Core, NetworkError, NetworkResult, TensorNetwork};

/// Per-dimension selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// Fix the coordinate; the dimension is removed
    At(usize),
    /// Keep a contiguous range of coordinates
    Range(Range<usize>),
    /// Keep an arbitrary list of coordinates (repeats allowed)
    Take(Vec<usize>),
    /// Keep every coordinate
    Full,
}

/// Result of [`select`]
#[derive(Debug, Clone)]
pub enum Selection {
    /// Every dimension was fixed
    Scalar(f64),
    /// At least one dimension survived
    Network(TensorNetwork),
}

impl Selection {
    /// The scalar value, if every dimension was fixed
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Selection::Scalar(v) => Some(*v),
            Selection::Network(_) => None,
        }
    }

    /// The resulting network, if any dimension survived
    pub fn into_network(self) -> Option<TensorNetwork> {
        match self {
            Selection::Scalar(_) => None,
            Selection::Network(t) => Some(t),
        }
    }
}

/// Select a sub-tensor.
///
/// Missing trailing indices are treated as [`Index::Full`].
///
/// # Errors
///
/// `DimensionMismatch` if more indices than dimensions are given,
/// `IndexOutOfBounds` for a coordinate outside its dimension,
/// `InvalidArgument` for a range or list that selects nothing (including a
/// range whose start lies past its end).
///
/// # Examples
///
/// ```
/// use tensornet_core::{RankSpec, TensorNetwork};
/// use tensornet_kernels::{select, Index};
///
/// let t = TensorNetwork::random(&[5, 6, 7], &RankSpec::train(3, 2), 0)?;
/// let sub = select(&t, &[Index::At(2), Index::Range(1..4)])?
///     .into_network()
///     .unwrap();
/// assert_eq!(sub.shape(), &[3, 7]);
/// # Ok::<(), tensornet_core::NetworkError>(())
/// ```
pub fn select(t: &TensorNetwork, indices: &[Index]) -> NetworkResult<Selection> {
    let n_dims = t.ndim();
    if indices.len() > n_dims {
        return Err(NetworkError::dimension_mismatch(
            "select",
            vec![n_dims],
            vec![indices.len()],
        ));
    }

    // Surviving dimensions as (original position, train override, core, factor)
    let mut kept: Vec<(usize, Option<Array3<f64>>, Core, Option<Block2>)> = Vec::new();
    let mut pending: Option<Array2<f64>> = None;
    let full = Index::Full;

    for n in 0..n_dims {
        let index = indices.get(n).unwrap_or(&full);
        if let Index::At(i) = index {
            let slice = AmbientCore::new(t, n).slice_matrix(n, *i)?;
            pending = Some(match pending {
                Some(p) => p.dot(&slice),
                None => slice,
            });
            continue;
        }

        let rows = match index {
            Index::Range(range) => Some(range.clone().collect::<Vec<_>>()),
            Index::Take(rows) => Some(rows.clone()),
            _ => None,
        };
        if rows.as_ref().is_some_and(Vec::is_empty) {
            return Err(NetworkError::invalid_argument(
                "select",
                format!("dimension {} would be empty ({:?})", n, index),
            ));
        }
        let (core, factor) = subselect(t, n, rows.as_deref())?;

        let absorbed = pending.take().map(|p| {
            let train = core_as_train(&core, n, n_dims);
            absorb_left(&p, &train)
        });
        kept.push((n, absorbed, core, factor));
    }

    let Some(last) = kept.last_mut() else {
        let value = pending.map_or(1.0, |p| p[[0, 0]]);
        return Ok(Selection::Scalar(value));
    };

    if let Some(p) = pending {
        let train = match last.1.take() {
            Some(train) => train,
            None => core_as_train(&last.2, last.0, n_dims),
        };
        last.1 = Some(absorb_right(&train, &p));
    }

    let mut cores = Vec::with_capacity(kept.len());
    let mut factors = Vec::with_capacity(kept.len());
    for (_, train, core, factor) in kept {
        cores.push(match train {
            Some(train) => Core::train(train),
            None => core,
        });
        factors.push(factor);
    }
    log::trace!("select: {} of {} dimensions kept", cores.len(), n_dims);
    TensorNetwork::new(cores, factors).map(Selection::Network)
}

/// Restrict dimension `n` to `rows` (all rows when `None`)
fn subselect(
    t: &TensorNetwork,
    n: usize,
    rows: Option<&[usize]>,
) -> NetworkResult<(Core, Option<Block2>)> {
    let core = t.core(n).clone();
    let factor = t.factor(n).cloned();
    let Some(rows) = rows else {
        return Ok((core, factor));
    };

    let size = t.shape()[n];
    if let Some(&index) = rows.iter().find(|&&i| i >= size) {
        return Err(NetworkError::IndexOutOfBounds {
            dim: n,
            index,
            size,
        });
    }

    Ok(match factor {
        Some(u) => {
            let selected = u.read().select(Axis(0), rows);
            (core, Some(Block2::new(selected)))
        }
        None => {
            let core = match &core {
                Core::Train(block) => Core::train(block.read().select(Axis(1), rows)),
                Core::Parafac(block) => Core::parafac(block.read().select(Axis(0), rows)),
            };
            (core, None)
        }
    })
}

/// G'[:, s, :] = P · G[:, s, :]
fn absorb_left(p: &Array2<f64>, core: &Array3<f64>) -> Array3<f64> {
    let (_, size, r_right) = core.dim();
    let mut out = Array3::<f64>::zeros((p.nrows(), size, r_right));
    for s in 0..size {
        out.index_axis_mut(Axis(1), s)
            .assign(&p.dot(&core.index_axis(Axis(1), s)));
    }
    out
}

/// G'[:, s, :] = G[:, s, :] · P
fn absorb_right(core: &Array3<f64>, p: &Array2<f64>) -> Array3<f64> {
    let (r_left, size, _) = core.dim();
    let mut out = Array3::<f64>::zeros((r_left, size, p.ncols()));
    for s in 0..size {
        out.index_axis_mut(Axis(1), s)
            .assign(&core.index_axis(Axis(1), s).dot(p));
    }
    out
}
