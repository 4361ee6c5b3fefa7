//! # tensornet-decomp - Rank Truncation for Tensor Networks
//!
//! Rounding compresses a network that has grown through arithmetic (sums
//! add ranks, products multiply them) back to the smallest ranks that keep
//! it within a relative error budget.
//!
//! ## Overview
//!
//! ### TT rounding
//!
//! Orthogonalize-then-truncate sweep over the train junctions:
//!
//! ```text
//! ‖round_tt(T) − T‖ ≤ ε·‖T‖
//! ```
//!
//! The sweep is exposed as a state machine ([`RoundingSweep`]) so that the
//! orthogonality invariant of each pass can be inspected between steps.
//! Parafac cores are passed through; their rank is fixed.
//!
//! ### Tucker rounding
//!
//! Shrinks the feature sizes of factored dimensions using the exact
//! per-dimension error of a feature projection.
//!
//! ## Quick Start
//!
//! ```
//! use tensornet_core::{RankSpec, TensorNetwork};
//! use tensornet_decomp::{round, round_tt, RoundingTarget};
//! use tensornet_kernels::{add, dist, norm};
//!
//! let t = TensorNetwork::random(&[6, 6, 6, 6], &RankSpec::train(4, 3), 0)?;
//! let tripled = add(&add(&t, &t)?, &t)?;
//! assert_eq!(tripled.ranks_tt(), vec![1, 9, 9, 9, 1]);
//!
//! let rounded = round_tt(&tripled, &RoundingTarget::new(1e-10))?;
//! assert_eq!(rounded.ranks_tt(), vec![1, 3, 3, 3, 1]);
//! assert!(dist(&rounded, &tripled)? <= 1e-6 * norm(&tripled)?);
//!
//! let capped = round(&tripled, 0.5)?;
//! assert!(capped.ranks_tt()[2] <= 3);
//! # Ok::<(), tensornet_core::NetworkError>(())
//! ```
//!
//! ## SciRS2 Integration
//!
//! QR and SVD go through `scirs2-linalg` (via the `tensornet-kernels`
//! wrappers); arrays are `scirs2_core::ndarray_ext` arrays.
//!
//! ## References
//!
//! - Oseledets, I. V. (2011). "Tensor-Train Decomposition"
//! - De Lathauwer, L., et al. (2000). "A Multilinear Singular Value Decomposition"

#![deny(warnings)]

pub mod round;
pub mod tucker;


pub use round::{
    is_left_orthogonal, is_right_orthogonal, round_tt, RoundingSweep, RoundingTarget, SweepState,
};
pub use tucker::{orthonormalize_factors, round, round_tucker};
