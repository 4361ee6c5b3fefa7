//! Rounding Example
//!
//! This example grows the ranks of a network through arithmetic and then
//! compresses it back with TT and Tucker rounding.
//!
//! Run with:
//! ```bash
//! cargo run --example rounding
//! ```

use tensornet_core::{RankSpec, TensorNetwork};
use tensornet_decomp::{round, round_tt, RoundingSweep, RoundingTarget};
use tensornet_kernels::{add, hadamard, norm, relative_error};

fn main() -> anyhow::Result<()> {
    println!("{}", "=".repeat(80));
    println!("Tensor Network Rounding Example");
    println!("{}", "=".repeat(80));
    println!();

    // ========================================================================
    // Example 1: Exact recompression of a sum
    // ========================================================================
    println!("Example 1: t + t + t back to the ranks of t");
    println!("{}", "-".repeat(80));

    let t = TensorNetwork::random(&[16, 16, 16, 16, 16], &RankSpec::train(5, 6), 7)?;
    let tripled = add(&add(&t, &t)?, &t)?;

    let start = std::time::Instant::now();
    let rounded = round_tt(&tripled, &RoundingTarget::new(1e-10))?;
    let elapsed = start.elapsed();

    println!("  - Ranks before: {:?}", tripled.ranks_tt());
    println!("  - Ranks after:  {:?}", rounded.ranks_tt());
    println!("  - Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    println!(
        "  - Relative error: {:.3e}",
        relative_error(&tripled, &rounded)?
    );
    println!();

    // ========================================================================
    // Example 2: Lossy rounding of a product
    // ========================================================================
    println!("Example 2: Elementwise square at several tolerances");
    println!("{}", "-".repeat(80));

    let square = hadamard(&t, &t)?;
    println!("  - Ranks of t * t: {:?}", square.ranks_tt());
    println!("  - ‖t * t‖ = {:.6}", norm(&square)?);
    for eps in [1e-2, 1e-1, 3e-1] {
        let approx = round_tt(&square, &RoundingTarget::new(eps))?;
        println!(
            "    eps = {:<6} ranks = {:?}  error = {:.3e}",
            eps,
            approx.ranks_tt(),
            relative_error(&square, &approx)?
        );
    }
    let capped = round_tt(&square, &RoundingTarget::new(0.0).max_rank(4))?;
    println!("  - Capped at rank 4: {:?}", capped.ranks_tt());
    println!();

    // ========================================================================
    // Example 3: Watching the sweep
    // ========================================================================
    println!("Example 3: Step-by-step sweep");
    println!("{}", "-".repeat(80));

    let mut sweep = RoundingSweep::new(&tripled, &RoundingTarget::new(1e-10))?;
    println!("  - {:?}", sweep.state());
    while sweep.step()? {
        println!("  - {:?}  ranks {:?}", sweep.state(), sweep.ranks());
    }
    println!();

    // ========================================================================
    // Example 4: Tucker and TT together
    // ========================================================================
    println!("Example 4: Combined rounding of a Tucker network");
    println!("{}", "-".repeat(80));

    let tucker = TensorNetwork::random(
        &[30, 30, 30, 30],
        &RankSpec::train(4, 3).with_tucker(5),
        3,
    )?;
    let doubled = add(&tucker, &tucker)?;
    let compact = round(&doubled, 1e-6)?;
    println!("  - Feature sizes before: {:?}", doubled.ranks_tucker());
    println!("  - Feature sizes after:  {:?}", compact.ranks_tucker());
    println!("  - TT ranks after:       {:?}", compact.ranks_tt());
    println!(
        "  - Relative error: {:.3e}",
        relative_error(&doubled, &compact)?
    );
    println!();

    Ok(())
}
