//! # tensornet-core
//!
//! Core storage types for compressed tensor networks.
//!
//! A [`TensorNetwork`] represents an N-dimensional array through a sequence
//! of small per-dimension cores that may freely mix three formats:
//!
//! - **Tensor train** cores of shape (r_L, Sₙ, r_R)
//! - **Parafac (CP)** cores of shape (Sₙ, R)
//! - **Tucker** factors of shape (Iₙ, Sₙ) attached to any core
//!
//! This crate owns the data model only: shared [`Block`]s, [`Core`]s, the
//! validated [`TensorNetwork`], rank requests ([`RankSpec`]), engine
//! configuration ([`NetworkConfig`]) and the error type shared by every
//! crate of the stack ([`NetworkError`]). Contraction, arithmetic and
//! reductions live in `tensornet-kernels`, rounding in `tensornet-decomp`
//! and sensitivity analysis in `tensornet-anova`.
//!
//! ## Core Principles
//!
//! ### SciRS2 Integration
//!
//! Arrays and random number generation go through `scirs2-core`
//! (`ndarray_ext`, `random`). Direct use of `ndarray` or `rand` is avoided.
//!
//! ### Shared storage
//!
//! Cloning a network clones block handles, not data. Two dimensions (or two
//! networks) holding clones of the same [`Block`] observe each other's
//! in-place updates. Use [`TensorNetwork::deep_copy`] for independent
//! storage.
//!
//! ## Quick Start
//!
//! ```
//! use tensornet_core::{CoreKind, RankSpec, TensorNetwork};
//!
//! // 4D train of rank 5 with a parafac last dimension of rank 5
//! let spec = RankSpec::train(4, 5).with_parafac_at(3, 5);
//! let t = TensorNetwork::random(&[32, 32, 32, 32], &spec, 0)?;
//!
//! assert_eq!(t.shape(), &[32, 32, 32, 32]);
//! assert_eq!(t.kind(3), CoreKind::Parafac);
//! assert_eq!(t.ranks_tt(), vec![1, 5, 5, 5, 1]);
//! # Ok::<(), tensornet_core::NetworkError>(())
//! ```
//!
//! ## Features
//!
//! - `serde`: serialization of configuration, rank requests and summaries

#![deny(warnings)]

pub mod block;
pub mod config;
pub mod error;
pub mod init;
pub mod network;
pub mod types;

#[cfg(test)]
mod property_tests;

pub use block::{Block, Block2, Block3};
pub use config::{NetworkConfig, DEFAULT_MAX_DENSE_ELEMENTS};
pub use error::{NetworkError, NetworkResult};
pub use network::{Core, CoreKind, NetworkSummary, TensorNetwork};
pub use types::{RankPair, RankSpec, Shape};
