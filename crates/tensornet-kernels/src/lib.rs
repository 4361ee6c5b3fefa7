//! # tensornet-kernels
//!
//! Contraction primitives and the algebra built directly on them.
//!
//! ## Overview
//!
//! Every routine in this crate walks a `TensorNetwork` left to right as a
//! chain of per-dimension [`AmbientCore`]s, carrying a small frontier
//! matrix. Nothing is decompressed unless [`full`] is called explicitly.
//!
//! **Key Features:**
//! - **Contraction** - dense decompression (guarded), point evaluation,
//!   weighted contraction, lockstep inner products
//! - **Arithmetic** - sums (ranks add), Hadamard products (ranks multiply),
//!   scaling
//! - **Indexing** - fixed coordinates, ranges and fancy indices that keep
//!   the result compressed
//! - **Reductions** - sum, mean, weighted means, norms
//! - **Metrics** - distances, relative error, RMSE, R², variance
//! - **Dense kernels** - Kronecker and Khatri-Rao products, thin QR / SVD
//!
//! ## Quick Start
//!
//! ```rust
//! use tensornet_core::{RankSpec, TensorNetwork};
//! use tensornet_kernels::{add, hadamard, mean, norm};
//!
//! let a = TensorNetwork::random(&[8, 8, 8], &RankSpec::train(3, 3), 0)?;
//! let b = TensorNetwork::random(&[8, 8, 8], &RankSpec::parafac(3, 2), 1)?;
//!
//! let sum = add(&a, &b)?;
//! assert_eq!(sum.ranks_tt(), vec![1, 5, 5, 1]);
//!
//! let product = hadamard(&a, &b)?;
//! assert_eq!(product.ranks_tt(), vec![1, 6, 6, 1]);
//!
//! assert!(norm(&sum)? >= 0.0);
//! let _ = mean(&product)?;
//! # Ok::<(), tensornet_core::NetworkError>(())
//! ```
//!
//! ## SciRS2 Integration
//!
//! This crate uses `scirs2-core` for all array operations and
//! `scirs2-linalg` for QR and SVD.

#![deny(warnings)]

pub mod ambient;
pub mod arithmetic;
pub mod contraction;
pub mod indexing;
pub mod linalg;
pub mod metrics;
pub mod products;
pub mod reductions;

#[cfg(test)]
mod property_tests;

pub use ambient::{core_as_train, parafac_as_train, AmbientCore};
pub use arithmetic::{add, hadamard, neg, scale, sub};
pub use contraction::{check_same_shape, contract_weighted, evaluate, full, inner};
pub use indexing::{select, Index, Selection};
pub use linalg::{
    fold_core, orthogonality_defect, psd_sqrt, thin_qr, thin_svd, truncation_rank, unfold_left,
    unfold_right,
};
pub use metrics::{dist, r_squared, relative_error, rmse, std_dev, variance};
pub use products::{core_kronecker, core_kronecker_features, kronecker, row_khatri_rao};
pub use reductions::{
    dot, mean, norm, normalize_marginal, normsq, sum, weighted_mean, weighted_sum,
};
