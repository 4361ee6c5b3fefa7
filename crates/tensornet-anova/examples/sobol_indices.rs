//! Sobol Indices Example
//!
//! This example runs a variance-based sensitivity analysis on a function
//! stored as a tensor train: first-order and total indices per variable,
//! interaction terms, and the distribution of the effective dimension.
//!
//! Run with:
//! ```bash
//! cargo run --example sobol_indices
//! ```

use scirs2_core::ndarray_ext::Array1;
use tensornet_anova::{truncate_anova, Marginals, Mask, SensitivityAnalysis};
use tensornet_core::{RankSpec, TensorNetwork};
use tensornet_kernels::relative_error;

fn main() -> anyhow::Result<()> {
    println!("{}", "=".repeat(80));
    println!("Sobol Sensitivity Analysis Example");
    println!("{}", "=".repeat(80));
    println!();

    let n_dims = 6;
    let t = TensorNetwork::random(&[32; 6], &RankSpec::train(n_dims, 5), 11)?;

    // ========================================================================
    // Example 1: Per-variable indices
    // ========================================================================
    println!("Example 1: First-order and total indices (uniform marginals)");
    println!("{}", "-".repeat(80));

    let sa = SensitivityAnalysis::new(&t, None)?;
    println!("  - E[f] = {:.6}, Var[f] = {:.6}", sa.mean(), sa.variance());
    println!("  {:>8} {:>12} {:>12}", "variable", "first", "total");
    for n in 0..n_dims {
        println!(
            "  {:>8} {:>12.6} {:>12.6}",
            n,
            sa.variance_component(&[n])?,
            sa.total_index(n)?
        );
    }
    println!();

    // ========================================================================
    // Example 2: Interactions through masks
    // ========================================================================
    println!("Example 2: Mask algebra");
    println!("{}", "-".repeat(80));

    let x0 = Mask::variable(n_dims, 0)?;
    let x1 = Mask::variable(n_dims, 1)?;
    println!("  - S(x0 | x1)  = {:.6}", sa.sobol(&(&x0 | &x1)?)?);
    println!("  - S(x0 & x1)  = {:.6}", sa.sobol(&(&x0 & &x1)?)?);
    println!("  - S(x0 & !x1) = {:.6}", sa.sobol(&x0.and_not(&x1)?)?);
    println!("  - Closed index of {{0, 1, 2}}: {:.6}", sa.closed_index(&[0, 1, 2])?);
    println!();

    // ========================================================================
    // Example 3: Effective dimension
    // ========================================================================
    println!("Example 3: Effective dimension");
    println!("{}", "-".repeat(80));

    let distribution = sa.dimension_distribution()?;
    println!("  - Mean dimension: {:.4}", sa.mean_dimension()?);
    for (k, p) in distribution.iter().enumerate().skip(1) {
        println!("    |α| = {}: {:.6}", k, p);
    }

    let low_order = truncate_anova(&t, &Mask::cardinality_in(n_dims, &[0, 1, 2])?, None)?;
    println!(
        "  - Error of the order-2 ANOVA truncation: {:.3e}",
        relative_error(&t, &low_order)?
    );
    println!();

    // ========================================================================
    // Example 4: Non-uniform marginals
    // ========================================================================
    println!("Example 4: Skewed marginal on variable 0");
    println!("{}", "-".repeat(80));

    let mut weights: Vec<Array1<f64>> = vec![Array1::ones(32); n_dims];
    weights[0] = Array1::from_shape_fn(32, |i| (-(i as f64) / 4.0).exp());
    let marginals = Marginals::new(t.shape(), weights)?;
    let skewed = SensitivityAnalysis::new(&t, Some(&marginals))?;
    println!("  - Total index of x0 (uniform): {:.6}", sa.total_index(0)?);
    println!("  - Total index of x0 (skewed):  {:.6}", skewed.total_index(0)?);
    println!();

    Ok(())
}
