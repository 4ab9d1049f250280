use crate::rng::{ternary, uniform_int};
use crate::walker::{randomize, Walker};
use anyhow::{anyhow, ensure, Result};
use dmcsat_cnf::Instance;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Cached potentials this close to zero count as satisfying assignments.
/// The comparison is not exact because potentials accumulate float deltas.
pub const WINNER_TOLERANCE: f64 = 1e-5;

/// Safety margin keeping every walker's `phop + ptel` strictly below one,
/// so float rounding cannot push the ternary probabilities past a sum of 1.
const DT_MARGIN: f64 = 0.99;

/// Parameters of one independent run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WalkParams {
    /// Number of walkers in the population.
    pub num_walkers: usize,
    /// Total physical duration of the adiabatic evolution (hbar = 1).
    pub duration: f64,
    /// Scaling of the potential: potential = scale * violated clauses.
    pub scale: f64,
    /// RNG seed for this run.
    pub seed: u64,
}

/// Final state of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub solved: bool,
    pub steps: u64,
    pub elapsed: f64,
    /// Violated clause count of the best walker, derived from its potential.
    pub best_violated: usize,
    /// Satisfying assignments when solved, otherwise the minimum-potential
    /// assignments, as `0`/`1` bitstrings with variable 0 first.
    pub assignments: Vec<String>,
    pub hops: u64,
    pub teleports: u64,
    pub sits: u64,
}

/// Adaptive timestep from the adiabatic parameter and the population's
/// potential spread. For every walker the resulting `phop + ptel` is at
/// most [`DT_MARGIN`], so no ternary probability can go negative. Must be
/// recomputed every iteration as `s` and the spread change.
pub fn timestep(s: f64, vmin: f64, vmax: f64) -> f64 {
    DT_MARGIN / (1.0 - s + s * (vmax - vmin))
}

/// The stochastic kernel of one run: a double-buffered population of
/// walkers evolved by hop / teleport / sit transitions.
pub struct WalkEngine<'a> {
    instance: &'a Instance,
    params: WalkParams,
    /// Double buffer; `cur` selects the current role, swap is an index
    /// flip. The two halves are never mutably aliased at the same time.
    buffers: [Vec<Walker>; 2],
    cur: usize,
    rng: SmallRng,
    elapsed: f64,
    steps: u64,
    hops: u64,
    teleports: u64,
    sits: u64,
}

impl<'a> WalkEngine<'a> {
    pub fn new(instance: &'a Instance, params: WalkParams) -> Result<Self> {
        ensure!(params.num_walkers > 0, "population must not be empty");
        ensure!(
            params.duration > 0.0 && params.duration.is_finite(),
            "duration must be positive"
        );
        // One violated clause must weigh more than the winner tolerance,
        // or unsatisfying assignments would be reported as solutions.
        ensure!(
            params.scale > WINNER_TOLERANCE && params.scale.is_finite(),
            "scale must exceed the winner tolerance {}",
            WINNER_TOLERANCE
        );
        let mut rng = SmallRng::seed_from_u64(params.seed);
        let mut buffers = [
            alloc_walkers(params.num_walkers)?,
            alloc_walkers(params.num_walkers)?,
        ];
        randomize(&mut buffers[0], instance, params.scale, &mut rng)?;
        Ok(Self {
            instance,
            params,
            buffers,
            cur: 0,
            rng,
            elapsed: 0.0,
            steps: 0,
            hops: 0,
            teleports: 0,
            sits: 0,
        })
    }

    pub fn params(&self) -> &WalkParams {
        &self.params
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// The population currently holding the "current" role.
    pub fn current(&self) -> &[Walker] {
        &self.buffers[self.cur]
    }

    fn extremes(&self) -> (f64, f64) {
        let mut vmin = self.current()[0].potential;
        let mut vmax = vmin;
        for w in self.current() {
            if w.potential < vmin {
                vmin = w.potential;
            }
            if w.potential > vmax {
                vmax = w.potential;
            }
        }
        (vmin, vmax)
    }

    fn winners(&self) -> usize {
        self.current()
            .iter()
            .filter(|w| w.potential.abs() < WINNER_TOLERANCE)
            .count()
    }

    /// Advance the population by one timestep and return the `dt` consumed.
    pub fn step(&mut self) -> Result<f64> {
        let s = self.elapsed / self.params.duration;
        let (vmin, vmax) = self.extremes();
        let dt = timestep(s, vmin, vmax);
        let phop = (1.0 - s) * dt;
        let scale = self.params.scale;
        let instance = self.instance;
        let (mut hops, mut teleports, mut sits) = (0u64, 0u64, 0u64);
        {
            let (head, tail) = self.buffers.split_at_mut(1);
            let (cur, pro) = if self.cur == 0 {
                (&head[0], &mut tail[0])
            } else {
                (&tail[0], &mut head[0])
            };
            let rng = &mut self.rng;
            for w in 0..cur.len() {
                // Subtracting vmin makes the process invariant under a
                // uniform shift of the potential.
                let ptel = dt * s * (cur[w].potential - vmin);
                match ternary(rng, phop, ptel)? {
                    0 => {
                        hop(instance, &cur[w], &mut pro[w], scale, rng)?;
                        hops += 1;
                    }
                    1 => {
                        teleport(cur, pro, w, rng)?;
                        teleports += 1;
                    }
                    _ => {
                        sit(&cur[w], &mut pro[w]);
                        sits += 1;
                    }
                }
            }
        }
        self.cur ^= 1;
        self.steps += 1;
        self.elapsed += dt;
        self.hops += hops;
        self.teleports += teleports;
        self.sits += sits;
        Ok(dt)
    }

    /// Run to a terminal state: at least one walker at zero potential, or
    /// the physical duration exhausted. With `verbose`, action-rate
    /// statistics are printed roughly once per 1% of the duration.
    pub fn run(&mut self, verbose: bool) -> Result<RunReport> {
        let mut last_output = 0.0;
        let mut last_counts = (0u64, 0u64, 0u64);
        let mut last_steps = 0u64;
        loop {
            self.step()?;
            if verbose
                && (self.steps == 1
                    || self.elapsed - last_output >= self.params.duration / 100.0)
            {
                let steps = (self.steps - last_steps) as f64;
                let per = steps * self.params.num_walkers as f64;
                let (vmin, _) = self.extremes();
                println!(
                    "seed {}: sitters: {:e}\thoppers: {:e}\tteleporters: {:e}\tviolated = {}",
                    self.params.seed,
                    (self.sits - last_counts.2) as f64 / per,
                    (self.hops - last_counts.0) as f64 / per,
                    (self.teleports - last_counts.1) as f64 / per,
                    (vmin / self.params.scale).round() as i64,
                );
                last_output = self.elapsed;
                last_counts = (self.hops, self.teleports, self.sits);
                last_steps = self.steps;
            }
            if self.winners() > 0 {
                return Ok(self.report(true));
            }
            if self.elapsed >= self.params.duration {
                return Ok(self.report(false));
            }
        }
    }

    fn report(&self, solved: bool) -> RunReport {
        let num_bits = self.instance.num_variables();
        let (vmin, _) = self.extremes();
        let assignments: Vec<String> = if solved {
            self.current()
                .iter()
                .filter(|w| w.potential.abs() < WINNER_TOLERANCE)
                .map(|w| w.bits.bitstring(num_bits))
                .collect()
        } else {
            self.current()
                .iter()
                .filter(|w| w.potential == vmin)
                .map(|w| w.bits.bitstring(num_bits))
                .collect()
        };
        RunReport {
            seed: self.params.seed,
            solved,
            steps: self.steps,
            elapsed: self.elapsed,
            best_violated: if solved {
                0
            } else {
                (vmin / self.params.scale).round() as usize
            },
            assignments,
            hops: self.hops,
            teleports: self.teleports,
            sits: self.sits,
        }
    }
}

fn alloc_walkers(num_walkers: usize) -> Result<Vec<Walker>> {
    // Exhaustion fails this run alone instead of aborting the process.
    let mut walkers = Vec::new();
    walkers
        .try_reserve_exact(num_walkers)
        .map_err(|e| anyhow!("unable to allocate memory for walkers: {}", e))?;
    walkers.resize(num_walkers, Walker::default());
    Ok(walkers)
}

/// Hop: flip one uniformly random bit. The potential delta is computed
/// only over the clauses containing the flipped bit, so the cost is
/// O(degree), not O(clauses).
fn hop(
    instance: &Instance,
    cur: &Walker,
    pro: &mut Walker,
    scale: f64,
    rng: &mut SmallRng,
) -> Result<()> {
    let num_bits = instance.num_variables();
    let bflip = uniform_int(rng, num_bits as u32)? as usize;
    pro.bits.copy_from(&cur.bits);
    pro.bits.flip(bflip, num_bits)?;
    let mut diff = 0i32;
    for &c in instance.presence(bflip) {
        let clause = &instance.clauses()[c];
        diff += clause.violated(&pro.bits) as i32 - clause.violated(&cur.bits) as i32;
    }
    pro.potential = cur.potential + scale * diff as f64;
    Ok(())
}

/// Teleport: adopt the assignment and potential of a uniformly random
/// walker (possibly self) from the current population.
fn teleport(cur: &[Walker], pro: &mut [Walker], w: usize, rng: &mut SmallRng) -> Result<()> {
    let destination = uniform_int(rng, cur.len() as u32)? as usize;
    pro[w].bits.copy_from(&cur[destination].bits);
    pro[w].potential = cur[destination].potential;
    Ok(())
}

/// Sit: carry the walker over unchanged.
fn sit(cur: &Walker, pro: &mut Walker) {
    pro.bits.copy_from(&cur.bits);
    pro.potential = cur.potential;
}
