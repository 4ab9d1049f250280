use crate::bits::{BitVec256, CAPACITY};
use anyhow::{anyhow, ensure, Result};

/// Maximum number of literals per clause.
pub const MAX_CLAUSE_VARS: usize = 3;

/// One literal of a clause: a variable index and whether it is negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    pub var: usize,
    pub negated: bool,
}

/// A clause of one to three literals.
///
/// `bitmask` has a bit set at every referenced variable position, `notmask`
/// at every negated one. Both are derived once at construction and never
/// mutated; `notmask` is a subset of `bitmask`. They let `violated` test
/// all literals with a handful of word operations.
#[derive(Debug, Clone)]
pub struct Clause {
    literals: Vec<Literal>,
    bitmask: BitVec256,
    notmask: BitVec256,
}

impl Clause {
    /// Build a clause from DIMACS-style signed literals: `3` means variable
    /// index 2 positive, `-3` means variable index 2 negated.
    ///
    /// Repeated literals are collapsed to one copy. A clause holding both
    /// signs of a variable is rejected: it is satisfied by every
    /// assignment, and the per-variable masks cannot encode that (the
    /// notmask records exactly one polarity per position).
    pub fn new(literals: &[i32], num_variables: usize) -> Result<Self> {
        ensure!(
            !literals.is_empty() && literals.len() <= MAX_CLAUSE_VARS,
            "clause must have 1 to {} literals, got {}",
            MAX_CLAUSE_VARS,
            literals.len()
        );
        let mut parsed: Vec<Literal> = Vec::with_capacity(literals.len());
        for &lit in literals {
            ensure!(lit != 0, "literal 0 is reserved as the clause terminator");
            let var = lit.unsigned_abs() as usize - 1;
            ensure!(
                var < num_variables,
                "literal {} references a variable beyond the declared {}",
                lit,
                num_variables
            );
            let literal = Literal {
                var,
                negated: lit < 0,
            };
            if parsed.contains(&literal) {
                continue;
            }
            ensure!(
                !parsed.iter().any(|l| l.var == var),
                "tautological clause: variable {} appears with both signs",
                var + 1
            );
            parsed.push(literal);
        }
        // The literals are now duplicate-free, so each mask bit is set
        // exactly once; a repeat can never toggle a bit back off. Masks
        // span the full physical capacity, as copies do.
        let mut bitmask = BitVec256::new();
        let mut notmask = BitVec256::new();
        for literal in &parsed {
            bitmask.flip(literal.var, CAPACITY)?;
            if literal.negated {
                notmask.flip(literal.var, CAPACITY)?;
            }
        }
        Ok(Self {
            literals: parsed,
            bitmask,
            notmask,
        })
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// True iff the clause is violated under `assignment`.
    ///
    /// A clause is violated iff every literal's bit disagrees with what
    /// would satisfy it, which collapses to a single bitwise test. This is
    /// the workhorse of the walk, so it stays branch free across the words.
    #[inline]
    pub fn violated(&self, assignment: &BitVec256) -> bool {
        let a = assignment.words();
        let m = self.bitmask.words();
        let n = self.notmask.words();
        let w0 = (m[0] & a[0]) ^ n[0];
        let w1 = (m[1] & a[1]) ^ n[1];
        let w2 = (m[2] & a[2]) ^ n[2];
        let w3 = (m[3] & a[3]) ^ n[3];
        ((w0 | w1) | (w2 | w3)) == 0
    }

    /// Reference evaluation, literal by literal. Used at initialization and
    /// by tests to cross-check the mask formula.
    pub fn violated_direct(&self, assignment: &BitVec256, num_bits: usize) -> Result<bool> {
        for lit in &self.literals {
            let value = assignment.extract(lit.var, num_bits)?;
            if value != lit.negated {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// An immutable SAT instance: the clauses, the variable count, and the
/// presence index mapping each variable to the clauses that reference it.
#[derive(Debug, Clone)]
pub struct Instance {
    num_variables: usize,
    clauses: Vec<Clause>,
    presence: Vec<Vec<usize>>,
}

impl Instance {
    /// Build an instance from clauses in DIMACS-style signed literal form.
    pub fn new(num_variables: usize, clauses: Vec<Vec<i32>>) -> Result<Self> {
        ensure!(
            num_variables >= 1 && num_variables <= CAPACITY,
            "variable count {} outside supported range 1..={}",
            num_variables,
            CAPACITY
        );
        ensure!(!clauses.is_empty(), "instance has no clauses");
        // Tautological clauses (both signs of a variable) are satisfied by
        // every assignment and can never contribute to the violated count,
        // so they are dropped here instead of being carried through the
        // mask machinery, which cannot represent them.
        let clauses = clauses
            .iter()
            .enumerate()
            .filter(|(_, lits)| !is_tautology(lits))
            .map(|(i, lits)| {
                Clause::new(lits, num_variables).map_err(|e| anyhow!("clause {}: {}", i + 1, e))
            })
            .collect::<Result<Vec<_>>>()?;
        // Presence lists hold clause indices in declaration order, each
        // clause at most once per variable (its literals are duplicate
        // free), so incremental updates count every affected clause
        // exactly once.
        let mut presence = vec![Vec::new(); num_variables];
        for (i, clause) in clauses.iter().enumerate() {
            for lit in clause.literals() {
                presence[lit.var].push(i);
            }
        }
        Ok(Self {
            num_variables,
            clauses,
            presence,
        })
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Indices of the clauses referencing `var`.
    #[inline]
    pub fn presence(&self, var: usize) -> &[usize] {
        &self.presence[var]
    }

    /// Count violated clauses by a full scan. Only used at walker
    /// initialization and in tests; the walk itself updates incrementally.
    pub fn count_violated(&self, assignment: &BitVec256) -> usize {
        self.clauses
            .iter()
            .filter(|c| c.violated(assignment))
            .count()
    }
}

fn is_tautology(literals: &[i32]) -> bool {
    literals
        .iter()
        .any(|&l| l != 0 && literals.contains(&-l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn mask_formula_matches_direct_evaluation() {
        let mut rng = SmallRng::seed_from_u64(7);
        let num_variables = 24;
        for _ in 0..200 {
            let arity = rng.gen_range(1..=3u32) as usize;
            let lits: Vec<i32> = (0..arity)
                .map(|_| {
                    let v = rng.gen_range(1..=num_variables as i32);
                    if rng.gen::<bool>() {
                        v
                    } else {
                        -v
                    }
                })
                .collect();
            // Variables are drawn with replacement, so repeated and
            // opposite-sign literals both show up here.
            match Clause::new(&lits, num_variables) {
                Ok(clause) => {
                    for _ in 0..20 {
                        let mut assignment = BitVec256::new();
                        for i in 0..num_variables {
                            if rng.gen::<bool>() {
                                assignment.flip(i, num_variables).unwrap();
                            }
                        }
                        assert_eq!(
                            clause.violated(&assignment),
                            clause
                                .violated_direct(&assignment, num_variables)
                                .unwrap(),
                            "clause {:?} disagreed on {}",
                            lits,
                            assignment.bitstring(num_variables)
                        );
                    }
                }
                Err(_) => {
                    // only tautological clauses are unrepresentable
                    assert!(lits.iter().any(|&l| lits.contains(&-l)));
                }
            }
        }
    }

    #[test]
    fn repeated_literal_sets_masks_once() {
        // A same-sign repeat must not toggle the mask bit back off.
        let clause = Clause::new(&[1, 1, 2], 2).unwrap();
        assert_eq!(clause.literals().len(), 2);
        let mut assignment = BitVec256::new();
        assignment.flip(0, 2).unwrap(); // x1 = 1, x2 = 0: satisfied
        assert!(!clause.violated(&assignment));
        assert_eq!(
            clause.violated(&assignment),
            clause.violated_direct(&assignment, 2).unwrap()
        );
        let zero = BitVec256::new(); // x1 = 0, x2 = 0: violated
        assert!(clause.violated(&zero));
        assert_eq!(
            clause.violated(&zero),
            clause.violated_direct(&zero, 2).unwrap()
        );

        let negated = Clause::new(&[-3, -3, -3], 3).unwrap();
        assert_eq!(negated.literals().len(), 1);
        assert!(!negated.violated(&zero));
        let mut third = BitVec256::new();
        third.flip(2, 3).unwrap();
        assert!(negated.violated(&third));
    }

    #[test]
    fn tautological_clause_is_rejected() {
        assert!(Clause::new(&[1, -1], 2).is_err());
        assert!(Clause::new(&[2, -2, 1], 2).is_err());
        assert!(Clause::new(&[-1, 2, 1], 2).is_err());
    }

    #[test]
    fn instance_drops_tautological_clauses() {
        let instance = Instance::new(2, vec![vec![1, -1, 2], vec![1, 2]]).unwrap();
        assert_eq!(instance.num_clauses(), 1);
        assert_eq!(instance.presence(0), &[0]);
        assert_eq!(instance.presence(1), &[0]);
        // 00 violates the surviving clause only; the tautology never counts.
        assert_eq!(instance.count_violated(&BitVec256::new()), 1);
        let mut one = BitVec256::new();
        one.flip(0, 2).unwrap();
        assert_eq!(instance.count_violated(&one), 0);
    }

    #[test]
    fn notmask_is_subset_of_bitmask() {
        for lits in [
            vec![1, -2, -3],
            vec![1, 1, -2],
            vec![-3, -3, -3],
            vec![-2, 1, -2],
            vec![2],
        ] {
            let clause = Clause::new(&lits, 3).unwrap();
            let b = clause.bitmask.words();
            let n = clause.notmask.words();
            for w in 0..4 {
                assert_eq!(n[w] & !b[w], 0, "clause {:?}", lits);
            }
        }
    }

    #[test]
    fn presence_lists_every_referencing_clause() {
        let instance =
            Instance::new(4, vec![vec![1, 2, 3], vec![-2, 4], vec![2, -3, 1]]).unwrap();
        assert_eq!(instance.presence(0), &[0, 2]);
        assert_eq!(instance.presence(1), &[0, 1, 2]);
        assert_eq!(instance.presence(2), &[0, 2]);
        assert_eq!(instance.presence(3), &[1]);
        for (var, list) in (0..4).map(|v| (v, instance.presence(v))) {
            for &c in list {
                assert!(instance.clauses()[c]
                    .literals()
                    .iter()
                    .any(|lit| lit.var == var));
            }
        }
    }

    #[test]
    fn presence_lists_repeated_variable_once() {
        let instance = Instance::new(2, vec![vec![1, 1, -2]]).unwrap();
        assert_eq!(instance.presence(0), &[0]);
        assert_eq!(instance.presence(1), &[0]);
    }

    #[test]
    fn count_violated_full_scan() {
        let instance = Instance::new(2, vec![vec![1], vec![-1], vec![1, 2]]).unwrap();
        let zero = BitVec256::new();
        // 00 violates (x1) but satisfies (!x1); (x1 v x2) violated
        assert_eq!(instance.count_violated(&zero), 2);
        let mut one = BitVec256::new();
        one.flip(0, 2).unwrap();
        assert_eq!(instance.count_violated(&one), 1);
    }

    #[test]
    fn rejects_bad_construction() {
        assert!(Instance::new(0, vec![vec![1]]).is_err());
        assert!(Instance::new(300, vec![vec![1]]).is_err());
        assert!(Instance::new(3, vec![]).is_err());
        assert!(Instance::new(3, vec![vec![1, 2, 3, 1]]).is_err());
        assert!(Instance::new(3, vec![vec![4]]).is_err());
        assert!(Instance::new(3, vec![vec![0]]).is_err());
    }
}
