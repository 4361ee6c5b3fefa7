//! Network Algebra Example
//!
//! This example builds hybrid networks (train, parafac and Tucker cores
//! mixed along the same chain) and works on them without decompressing:
//! sums, elementwise products, indexing and reductions.
//!
//! Run with:
//! ```bash
//! cargo run --example network_algebra
//! ```

use tensornet_core::{NetworkConfig, RankSpec, TensorNetwork};
use tensornet_kernels::{add, dist, full, hadamard, mean, norm, scale, select, Index};

fn main() -> anyhow::Result<()> {
    println!("{}", "=".repeat(80));
    println!("Compressed Network Algebra Example");
    println!("{}", "=".repeat(80));
    println!();

    // ========================================================================
    // Example 1: A hybrid network
    // ========================================================================
    println!("Example 1: Hybrid network (5D)");
    println!("{}", "-".repeat(80));

    let spec = RankSpec::train(5, 4)
        .with_parafac_at(0, 3)
        .with_parafac_at(1, 3)
        .with_tucker_at(3, 6);
    let t = TensorNetwork::random(&[20, 20, 20, 20, 20], &spec, 42)?;

    println!("{}", t);
    println!("  - Parameters: {}", t.num_parameters());
    println!("  - Compression ratio: {:.1}x", t.compression_ratio());
    println!();

    // ========================================================================
    // Example 2: Arithmetic
    // ========================================================================
    println!("Example 2: Sums and elementwise products");
    println!("{}", "-".repeat(80));

    let sum = add(&t, &scale(&t, 2.0)?)?;
    let square = hadamard(&t, &t)?;
    println!("  - TT ranks of t:       {:?}", t.ranks_tt());
    println!("  - TT ranks of t + 2t:  {:?}", sum.ranks_tt());
    println!("  - TT ranks of t * t:   {:?}", square.ranks_tt());
    println!("  - ‖(t + 2t) − 3t‖:     {:.3e}", dist(&sum, &scale(&t, 3.0)?)?);
    println!(
        "  - mean(t * t) = ‖t‖² / numel: {:.6} vs {:.6}",
        mean(&square)?,
        norm(&t)?.powi(2) / t.numel() as f64
    );
    println!();

    // ========================================================================
    // Example 3: Indexing
    // ========================================================================
    println!("Example 3: Compressed indexing");
    println!("{}", "-".repeat(80));

    let slab = select(
        &t,
        &[Index::At(3), Index::Range(0..5), Index::Full, Index::At(7)],
    )?;
    if let Some(slab) = slab.into_network() {
        println!("  - Selected shape: {:?}", slab.shape());
        println!("  - Kinds: {:?}", slab.kinds());
        let dense = full(&slab, &NetworkConfig::default())?;
        println!("  - Dense slab elements: {}", dense.len());
    }

    let point: Vec<Index> = [1, 2, 3, 4, 5].iter().map(|&i| Index::At(i)).collect();
    if let Some(value) = select(&t, &point)?.as_scalar() {
        println!("  - t[1, 2, 3, 4, 5] = {:.6}", value);
    }
    println!();

    Ok(())
}
