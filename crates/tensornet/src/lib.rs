//! # tensornet - Compressed Tensor Networks
//!
//! High-dimensional arrays stored as chains of small cores, where each
//! dimension can be a tensor-train core, a CP (parafac) core, and carry an
//! optional Tucker factor. Every operation works on the compressed form;
//! the full array is only built on explicit request.
//!
//! This is the **meta crate** that re-exports all components.
//!
//! ## Quick Start
//!
//! ```
//! use tensornet::prelude::*;
//!
//! let t = TensorNetwork::random(&[16, 16, 16, 16], &RankSpec::train(4, 4), 1)?;
//! let doubled = add(&t, &t)?;
//! assert_eq!(doubled.ranks_tt(), vec![1, 8, 8, 8, 1]);
//!
//! let rounded = round_tt(&doubled, &RoundingTarget::new(1e-10))?;
//! assert_eq!(rounded.ranks_tt(), vec![1, 4, 4, 4, 1]);
//!
//! let sa = SensitivityAnalysis::new(&rounded, None)?;
//! let s0 = sa.sobol(&Mask::only(4, 0)?)?;
//! assert!((0.0..=1.0).contains(&s0));
//! # Ok::<(), tensornet::core::NetworkError>(())
//! ```
//!
//! ## Components
//!
//! ### Data model ([`core`])
//!
//! [`core::TensorNetwork`], shared [`core::Block`]s, creation from a
//! [`core::RankSpec`], and validation of rank and feature compatibility.
//!
//! ### Operations ([`kernels`])
//!
//! Evaluation, expansion, linear algebra (sums, products, scaling),
//! compressed indexing, norms, means and weighted contractions.
//!
//! ```
//! use tensornet::core::{RankSpec, TensorNetwork};
//! use tensornet::kernels::{evaluate, hadamard, mean, norm, select, Index};
//!
//! let t = TensorNetwork::random(&[5, 6, 7], &RankSpec::parafac(3, 2), 3)?;
//! let sq = hadamard(&t, &t)?;
//! assert!((mean(&sq)? * 210.0 - norm(&t)?.powi(2)).abs() < 1e-9);
//!
//! let row = select(&t, &[Index::At(1), Index::Full, Index::At(2)])?;
//! let row = row.into_network().unwrap();
//! let v = evaluate(&row, &[vec![4]])?[0];
//! assert!((v - evaluate(&t, &[vec![1, 4, 2]])?[0]).abs() < 1e-12);
//! # Ok::<(), tensornet::core::NetworkError>(())
//! ```
//!
//! ### Rounding ([`decomp`])
//!
//! TT rounding with a relative error budget or rank caps, and Tucker
//! rounding of the factored dimensions.
//!
//! ### Sensitivity analysis ([`anova`])
//!
//! Masks over subsets of variables, ANOVA decomposition, Sobol indices,
//! mean dimension and dimension distribution.
//!
//! ## Features
//!
//! - `serde`: serialization of the data-model types

#![deny(warnings)]

pub use tensornet_anova as anova;
pub use tensornet_core as core;
pub use tensornet_decomp as decomp;
pub use tensornet_kernels as kernels;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use tensornet::prelude::*;
    //!
    //! let t = TensorNetwork::ones(&[2, 3, 4]).unwrap();
    //! assert_eq!(sum(&t).unwrap(), 24.0);
    //! ```

    // Data model
    pub use crate::core::{
        Block2, Block3, Core, CoreKind, NetworkConfig, NetworkError, NetworkResult, RankSpec,
        TensorNetwork,
    };

    // Operations
    pub use crate::kernels::{
        add, contract_weighted, dist, dot, evaluate, full, hadamard, inner, mean, neg, norm,
        normsq, scale, select, sub, sum, weighted_mean, weighted_sum, Index, Selection,
    };

    // Rounding
    pub use crate::decomp::{round, round_tt, round_tucker, RoundingTarget};

    // Sensitivity analysis
    pub use crate::anova::{
        anova_decomposition, dimension_distribution, mean_dimension, sobol, truncate_anova,
        Marginals, Mask, SensitivityAnalysis,
    };
}
