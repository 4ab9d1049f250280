//! Stochastic primitives.
//!
//! Every draw goes through an explicit `SmallRng` owned by one run, so runs
//! are independent and reproducible from their seed. Draws use fixed-width
//! integer ranges, never `usize`, so streams match across platforms.
//!
//! Out-of-range arguments are contract violations: a correct timestep
//! controller never produces a negative probability or a sum above one, so
//! these return errors instead of clamping.

use anyhow::{ensure, Result};
use rand::{rngs::SmallRng, Rng};

/// Slack absorbed when checking probability sums, against float rounding.
const PROB_TOLERANCE: f64 = 1e-9;

/// Uniform integer over `[0, n)`.
pub fn uniform_int(rng: &mut SmallRng, n: u32) -> Result<u32> {
    ensure!(n > 0, "uniform_int: empty range");
    Ok(rng.gen_range(0..n))
}

/// Bernoulli draw: true with probability `p`.
pub fn bernoulli(rng: &mut SmallRng, p: f64) -> Result<bool> {
    ensure!(
        (-PROB_TOLERANCE..=1.0 + PROB_TOLERANCE).contains(&p),
        "bernoulli: invalid probability {}",
        p
    );
    Ok(rng.gen::<f64>() < p)
}

/// Ternary draw: 0 with probability `p0`, 1 with probability `p1`,
/// 2 otherwise.
pub fn ternary(rng: &mut SmallRng, p0: f64, p1: f64) -> Result<u8> {
    ensure!(
        p0 >= -PROB_TOLERANCE && p1 >= -PROB_TOLERANCE && p0 + p1 <= 1.0 + PROB_TOLERANCE,
        "ternary: invalid probabilities {} {}",
        p0,
        p1
    );
    let r = rng.gen::<f64>();
    if r < p0 {
        Ok(0)
    } else if r < p0 + p1 {
        Ok(1)
    } else {
        Ok(2)
    }
}
