//! Diffusion Monte Carlo walk over SAT assignments.
//!
//! A population of walkers evolves under hop / teleport / sit transitions
//! whose probabilities are driven by an adiabatically increasing potential,
//! mimicking stoquastic adiabatic dynamics. The walk is invariant under a
//! uniform shift of the potential because teleport probabilities subtract
//! the population minimum.

pub mod coordinator;
pub mod engine;
pub mod rng;
pub mod walker;

pub use coordinator::run_parallel;
pub use engine::{RunReport, WalkEngine, WalkParams};
pub use walker::Walker;
