use crate::rng::bernoulli;
use anyhow::Result;
use dmcsat_cnf::{BitVec256, Instance};
use rand::rngs::SmallRng;

/// One candidate assignment carried through the walk, with its potential
/// cached so it is computed at most once per timestep.
///
/// The cached value is `scale * violated_count` and is maintained
/// incrementally; after every engine step it equals a from-scratch
/// recomputation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Walker {
    pub bits: BitVec256,
    pub potential: f64,
}

impl Walker {
    /// Full-scan potential of this walker's assignment.
    pub fn recompute_potential(&self, instance: &Instance, scale: f64) -> f64 {
        scale * instance.count_violated(&self.bits) as f64
    }
}

/// Distribute the walkers uniformly at random and cache their potentials.
/// The only full clause scan in a run happens here.
pub fn randomize(
    walkers: &mut [Walker],
    instance: &Instance,
    scale: f64,
    rng: &mut SmallRng,
) -> Result<()> {
    let num_bits = instance.num_variables();
    for walker in walkers.iter_mut() {
        walker.bits.zero();
        for b in 0..num_bits {
            if bernoulli(rng, 0.5)? {
                walker.bits.flip(b, num_bits)?;
            }
        }
        walker.potential = walker.recompute_potential(instance, scale);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn randomize_caches_true_potentials() {
        let instance =
            Instance::new(5, vec![vec![1, 2, 3], vec![-1, -2], vec![4, -5, 1]]).unwrap();
        let scale = 0.5;
        let mut rng = SmallRng::seed_from_u64(11);
        let mut walkers = vec![Walker::default(); 20];
        randomize(&mut walkers, &instance, scale, &mut rng).unwrap();
        for w in &walkers {
            assert_eq!(w.potential, w.recompute_potential(&instance, scale));
        }
    }

    #[test]
    fn randomize_spreads_the_population() {
        let instance = Instance::new(16, vec![vec![1, 2, 3]]).unwrap();
        let mut rng = SmallRng::seed_from_u64(12);
        let mut walkers = vec![Walker::default(); 30];
        randomize(&mut walkers, &instance, 1.0, &mut rng).unwrap();
        let first = walkers[0].bits.bitstring(16);
        assert!(walkers
            .iter()
            .any(|w| w.bits.bitstring(16) != first));
    }
}
