//! Shared type definitions for tensor networks.
//!
//! - Type aliases for shapes and rank pairs ([`Shape`], [`RankPair`])
//! - Per-dimension rank requests ([`RankSpec`]) used when a network is
//!   created from a target shape rather than from explicit blocks
//!
//! # Examples
//!
//! ```
//! use tensornet_core::RankSpec;
//!
//! // Tensor train with internal ranks 5 and a parafac tail of rank 3
//! let spec = RankSpec::train(4, 5).with_parafac_at(3, 3);
//! assert_eq!(spec.parafac[3], Some(3));
//! ```

use crate::error::{NetworkError, NetworkResult};
use crate::network::CoreKind;
use smallvec::SmallVec;

/// Ambient shape storage.
///
/// Inline for networks with up to 6 dimensions, heap allocated beyond.
pub type Shape = SmallVec<[usize; 6]>;

/// (left rank, right rank) of a core
pub type RankPair = (usize, usize);

/// Requested ranks for every dimension of a network.
///
/// Each of the three rank kinds is specified independently; `None` means
/// the dimension (or junction) does not use that kind:
///
/// - `train[k]` is the rank of the junction between dimensions k and k+1
///   (length N-1). It may be `None` only where a parafac core sits on
///   either side of the junction, in which case the parafac rank applies.
/// - `tucker[n]` is the feature size of dimension n's factor.
/// - `parafac[n]` makes dimension n a parafac core of that rank.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankSpec {
    /// Junction ranks between consecutive train cores (length N-1)
    pub train: Vec<Option<usize>>,
    /// Tucker feature sizes (length N)
    pub tucker: Vec<Option<usize>>,
    /// Parafac ranks (length N)
    pub parafac: Vec<Option<usize>>,
    /// Builder calls whose index fell outside the spec, reported by `resolve`
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    rejected: Vec<String>,
}

impl RankSpec {
    /// Pure tensor train with every internal junction at rank `rank`
    pub fn train(n_dims: usize, rank: usize) -> Self {
        Self {
            train: vec![Some(rank); n_dims.saturating_sub(1)],
            tucker: vec![None; n_dims],
            parafac: vec![None; n_dims],
            rejected: Vec::new(),
        }
    }

    /// Pure CP network of rank `rank`
    pub fn parafac(n_dims: usize, rank: usize) -> Self {
        Self {
            train: vec![None; n_dims.saturating_sub(1)],
            tucker: vec![None; n_dims],
            parafac: vec![Some(rank); n_dims],
            rejected: Vec::new(),
        }
    }

    /// Attach a factor of feature size `size` to every dimension
    pub fn with_tucker(mut self, size: usize) -> Self {
        self.tucker = vec![Some(size); self.tucker.len()];
        self
    }

    /// Attach a factor of feature size `size` to dimension `n`.
    ///
    /// An out-of-range `n` is reported by [`RankSpec::resolve`].
    pub fn with_tucker_at(mut self, n: usize, size: usize) -> Self {
        match self.tucker.get_mut(n) {
            Some(slot) => *slot = Some(size),
            None => self.reject("with_tucker_at", n, self.ndim()),
        }
        self
    }

    /// Make dimension `n` a parafac core of rank `rank`.
    ///
    /// The junctions on either side of `n` take the parafac rank. An
    /// out-of-range `n` is reported by [`RankSpec::resolve`].
    pub fn with_parafac_at(mut self, n: usize, rank: usize) -> Self {
        let Some(slot) = self.parafac.get_mut(n) else {
            self.reject("with_parafac_at", n, self.ndim());
            return self;
        };
        *slot = Some(rank);
        if n > 0 {
            self.train[n - 1] = None;
        }
        if n < self.train.len() {
            self.train[n] = None;
        }
        self
    }

    /// Set the rank of junction `k` (between dimensions k and k+1)
    pub fn with_train_at(mut self, k: usize, rank: usize) -> Self {
        match self.train.get_mut(k) {
            Some(slot) => *slot = Some(rank),
            None => self.reject("with_train_at", k, self.train.len()),
        }
        self
    }

    fn reject(&mut self, builder: &str, index: usize, len: usize) {
        self.rejected.push(format!(
            "{}({}) is out of range for {} entries",
            builder, index, len
        ));
    }

    /// Number of dimensions the spec describes
    pub fn ndim(&self) -> usize {
        self.parafac.len()
    }

    /// Kind of every dimension
    pub fn kinds(&self) -> Vec<CoreKind> {
        self.parafac
            .iter()
            .map(|r| match r {
                Some(_) => CoreKind::Parafac,
                None => CoreKind::Train,
            })
            .collect()
    }

    /// Resolve the N+1 junction ranks for a network of ambient `shape`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` when the spec's lengths disagree with `shape`, when
    /// consecutive parafac ranks differ, when an explicit train rank
    /// contradicts a neighbouring parafac rank, when a junction between two
    /// train cores has no rank, or when a Tucker size exceeds its ambient size.
    /// `InvalidArgument` when a `with_*_at` builder was given an index
    /// outside the spec.
    pub fn resolve(&self, shape: &[usize]) -> NetworkResult<Vec<usize>> {
        if let Some(reason) = self.rejected.first() {
            return Err(NetworkError::invalid_argument(
                "RankSpec::resolve",
                reason.clone(),
            ));
        }
        let n_dims = shape.len();
        if n_dims == 0 {
            return Err(NetworkError::invalid_argument(
                "RankSpec::resolve",
                "a network needs at least one dimension",
            ));
        }
        if self.parafac.len() != n_dims || self.tucker.len() != n_dims {
            return Err(NetworkError::dimension_mismatch(
                "RankSpec::resolve",
                vec![n_dims],
                vec![self.parafac.len(), self.tucker.len()],
            ));
        }
        if self.train.len() != n_dims - 1 {
            return Err(NetworkError::dimension_mismatch(
                "RankSpec::resolve",
                vec![n_dims - 1],
                vec![self.train.len()],
            ));
        }

        for (n, (&size, tucker)) in shape.iter().zip(self.tucker.iter()).enumerate() {
            if let Some(features) = tucker {
                if *features == 0 || *features > size {
                    return Err(NetworkError::shape_mismatch(
                        n,
                        n,
                        format!(
                            "tucker rank {} must lie in 1..={} (ambient size)",
                            features, size
                        ),
                    ));
                }
            }
        }

        let mut ranks = Vec::with_capacity(n_dims + 1);
        ranks.push(1);
        for k in 0..n_dims - 1 {
            let left = self.parafac[k];
            let right = self.parafac[k + 1];
            let explicit = self.train[k];

            let rank = match (left, right) {
                (Some(a), Some(b)) if a != b => {
                    return Err(NetworkError::shape_mismatch(
                        k,
                        k + 1,
                        format!("consecutive parafac ranks differ ({} vs {})", a, b),
                    ))
                }
                (Some(r), _) | (None, Some(r)) => {
                    if let Some(t) = explicit {
                        if t != r {
                            return Err(NetworkError::shape_mismatch(
                                k,
                                k + 1,
                                format!("train rank {} contradicts parafac rank {}", t, r),
                            ));
                        }
                    }
                    r
                }
                (None, None) => explicit.ok_or_else(|| {
                    NetworkError::shape_mismatch(k, k + 1, "no rank given between two train cores")
                })?,
            };
            if rank == 0 {
                return Err(NetworkError::shape_mismatch(k, k + 1, "ranks must be positive"));
            }
            ranks.push(rank);
        }
        ranks.push(1);
        Ok(ranks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_spec_resolves_boundaries() {
        let ranks = RankSpec::train(4, 5).resolve(&[8, 8, 8, 8]).unwrap();
        assert_eq!(ranks, vec![1, 5, 5, 5, 1]);
    }

    #[test]
    fn test_parafac_spec_resolves() {
        let ranks = RankSpec::parafac(3, 4).resolve(&[10, 10, 64]).unwrap();
        assert_eq!(ranks, vec![1, 4, 4, 1]);
    }

    #[test]
    fn test_mixed_spec() {
        let spec = RankSpec::train(4, 3).with_parafac_at(2, 6);
        let ranks = spec.resolve(&[5, 5, 5, 5]).unwrap();

        assert_eq!(ranks, vec![1, 3, 6, 6, 1]);
        assert_eq!(
            spec.kinds(),
            vec![
                CoreKind::Train,
                CoreKind::Train,
                CoreKind::Parafac,
                CoreKind::Train
            ]
        );
    }

    #[test]
    fn test_out_of_range_builders_fail_to_resolve() {
        let shape = [4, 4, 4];
        for spec in [
            RankSpec::train(3, 2).with_parafac_at(3, 2),
            RankSpec::train(3, 2).with_tucker_at(5, 2),
            RankSpec::train(3, 2).with_train_at(2, 2),
        ] {
            assert!(matches!(
                spec.resolve(&shape),
                Err(NetworkError::InvalidArgument { .. })
            ));
        }

        // In-range calls chained after a bad one do not hide it
        let spec = RankSpec::train(3, 2).with_parafac_at(9, 2).with_tucker_at(0, 2);
        assert_eq!(spec.tucker[0], Some(2));
        assert!(spec.resolve(&shape).is_err());
    }

    #[test]
    fn test_consecutive_parafac_ranks_must_agree() {
        let spec = RankSpec::parafac(3, 4).with_parafac_at(1, 5);
        assert!(matches!(
            spec.resolve(&[4, 4, 4]),
            Err(NetworkError::ShapeMismatch { dims: (0, 1), .. })
        ));
    }

    #[test]
    fn test_explicit_train_rank_conflict() {
        let spec = RankSpec::train(3, 2)
            .with_parafac_at(1, 4)
            .with_train_at(0, 2);
        assert!(matches!(
            spec.resolve(&[4, 4, 4]),
            Err(NetworkError::ShapeMismatch { dims: (0, 1), .. })
        ));
    }

    #[test]
    fn test_tucker_rank_bounded_by_ambient() {
        let spec = RankSpec::train(2, 2).with_tucker_at(1, 9);
        assert!(matches!(
            spec.resolve(&[4, 4]),
            Err(NetworkError::ShapeMismatch { dims: (1, 1), .. })
        ));
    }
}
