//! # tensornet-anova - Sensitivity Analysis on Tensor Networks
//!
//! Global sensitivity analysis of a function stored as a compressed
//! tensor network, without ever enumerating its 2^N ANOVA terms.
//!
//! ## Overview
//!
//! ### Masks
//!
//! A [`Mask`] is a network over {0, 1}^N that assigns a weight to each
//! subset α of the variables: exact subsets, subsets and supersets of a
//! set, subsets of a given size, the weight |α|, and their boolean
//! combinations. Indicator masks built from cubes are rank one.
//!
//! ### ANOVA and Sobol indices
//!
//! [`SensitivityAnalysis`] builds the variance network of a function under
//! independent marginals once, then answers each query as one contraction:
//!
//! - Sobol indices of arbitrary masks
//! - total, closed and superset indices
//! - mean effective dimension and its distribution
//!
//! [`anova_decomposition`] and [`truncate_anova`] expose the ANOVA terms
//! themselves as networks.
//!
//! ## Quick Start
//!
//! ```
//! use tensornet_core::{RankSpec, TensorNetwork};
//! use tensornet_anova::{Mask, SensitivityAnalysis};
//!
//! let t = TensorNetwork::random(&[10, 10, 10, 10], &RankSpec::train(4, 3), 7)?;
//! let sa = SensitivityAnalysis::new(&t, None)?;
//!
//! let all = sa.sobol(&Mask::all(4)?)?;
//! assert!((all - 1.0).abs() < 1e-9);
//!
//! let x0 = sa.sobol(&Mask::variable(4, 0)?)?;
//! assert!((x0 - sa.total_index(0)?).abs() < 1e-9);
//!
//! assert!(sa.mean_dimension()? >= 1.0 - 1e-9);
//! # Ok::<(), tensornet_core::NetworkError>(())
//! ```
//!
//! ## References
//!
//! - Sobol, I. M. (2001). "Global sensitivity indices for nonlinear
//!   mathematical models and their Monte Carlo estimates"
//! - Ballester-Ripoll, R., et al. (2019). "Sobol tensor trains for global
//!   sensitivity analysis"

#![deny(warnings)]

pub mod anova;
pub mod mask;


pub use anova::{
    anova_decomposition, dimension_distribution, mean_dimension, sobol, truncate_anova,
    Marginals, SensitivityAnalysis,
};
pub use mask::{Cube, Literal, Mask, Selector};
