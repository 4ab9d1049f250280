//! Random 3-SAT instance generation.
//!
//! Clause count is fixed at floor(4.267 * variables), the clause-to-variable
//! ratio of the satisfiability phase transition, which is where the walk's
//! tuned parameters apply.

use crate::instance::Instance;
use anyhow::{ensure, Result};
use ndarray::{Array2, Axis};
use rand::{
    distributions::{Distribution, Uniform},
    rngs::SmallRng,
    SeedableRng,
};

pub const CLAUSES_TO_VARIABLES_RATIO: f64 = 4.267;

/// Generate a uniform random 3-SAT instance at the phase transition.
pub fn generate(num_variables: usize, seed: u64) -> Result<Instance> {
    ensure!(num_variables >= 1, "cannot generate an instance with no variables");
    let mut rng = SmallRng::seed_from_u64(seed);
    let num_clauses = (num_variables as f64 * CLAUSES_TO_VARIABLES_RATIO).floor() as usize;

    let var_distr = Uniform::new(1, num_variables as i32 + 1);
    let neg_distr = Uniform::new(0, 2);

    let clauses_array = Array2::from_shape_fn((num_clauses, 3), |_| var_distr.sample(&mut rng));
    let negations = Array2::from_shape_fn((num_clauses, 3), |_| {
        if neg_distr.sample(&mut rng) == 0 {
            -1
        } else {
            1
        }
    });
    let clauses_array = clauses_array * negations;

    let clauses = clauses_array
        .axis_iter(Axis(0))
        .map(|row| row.to_vec())
        .collect();

    Instance::new(num_variables, clauses)
}
