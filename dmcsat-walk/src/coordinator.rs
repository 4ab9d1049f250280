//! Independent parallel runs.
//!
//! Each run is a full walk over its own population with its own RNG
//! stream, all reading the same immutable instance. Runs never communicate
//! and are never cancelled: every run proceeds to its own terminal state
//! and reports, even after another run has found a solution.

use crate::engine::{RunReport, WalkEngine, WalkParams};
use anyhow::{anyhow, Result};
use dmcsat_cnf::Instance;
use std::thread;

/// Launch `num_runs` independent runs, one OS thread each, seeded
/// `base.seed + run index`, and join them all. Reports come back in run
/// order. A run that fails (or panics) surfaces as an error only after
/// every other run has been joined.
pub fn run_parallel(
    instance: &Instance,
    base: WalkParams,
    num_runs: usize,
    verbose: bool,
) -> Result<Vec<RunReport>> {
    thread::scope(|scope| {
        let handles: Vec<_> = (0..num_runs)
            .map(|t| {
                let params = WalkParams {
                    seed: base.seed.wrapping_add(t as u64),
                    ..base
                };
                scope.spawn(move || -> Result<RunReport> {
                    let mut engine = WalkEngine::new(instance, params)?;
                    engine.run(verbose)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| anyhow!("walk thread panicked"))?
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmcsat_cnf::generate::generate;

    #[test]
    fn every_run_reports_with_its_own_seed() {
        let instance = generate(15, 21).unwrap();
        let base = WalkParams {
            num_walkers: 10,
            duration: 100.0,
            scale: 75.0 / 15.0,
            seed: 500,
        };
        let reports = run_parallel(&instance, base, 4, false).unwrap();
        assert_eq!(reports.len(), 4);
        for (t, report) in reports.iter().enumerate() {
            assert_eq!(report.seed, 500 + t as u64);
            assert!(!report.assignments.is_empty());
        }
    }

    #[test]
    fn parallel_runs_match_sequential_runs() {
        let instance = generate(12, 33).unwrap();
        let base = WalkParams {
            num_walkers: 8,
            duration: 50.0,
            scale: 75.0 / 12.0,
            seed: 900,
        };
        let parallel = run_parallel(&instance, base, 3, false).unwrap();
        for t in 0..3 {
            let params = WalkParams {
                seed: base.seed + t as u64,
                ..base
            };
            let sequential = WalkEngine::new(&instance, params)
                .unwrap()
                .run(false)
                .unwrap();
            assert_eq!(parallel[t].solved, sequential.solved);
            assert_eq!(parallel[t].steps, sequential.steps);
            assert_eq!(parallel[t].assignments, sequential.assignments);
        }
    }

    #[test]
    fn unsatisfiable_instance_reports_best_approximation() {
        let instance = Instance::new(1, vec![vec![1], vec![-1]]).unwrap();
        let base = WalkParams {
            num_walkers: 5,
            duration: 20.0,
            scale: 1.0,
            seed: 7,
        };
        let reports = run_parallel(&instance, base, 2, false).unwrap();
        for report in reports {
            assert!(!report.solved);
            assert_eq!(report.best_violated, 1);
        }
    }
}
