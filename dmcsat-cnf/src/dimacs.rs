//! DIMACS CNF parsing and rendering.
//!
//! Lines starting with `c` are comments, the `p cnf <vars> <clauses>` line
//! declares the instance size, and every other non-blank line (barring the
//! `%` trailer some benchmark sets append) is a clause of whitespace
//! separated literals terminated by `0`.

use crate::instance::Instance;
use anyhow::{anyhow, ensure, Context, Result};

impl Instance {
    /// Parse DIMACS CNF text into an instance.
    ///
    /// Format errors are detected here, before any run starts.
    pub fn from_dimacs(text: &str) -> Result<Self> {
        let mut declared: Option<(usize, usize)> = None;
        let mut clauses: Vec<Vec<i32>> = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('c') || line.starts_with('%') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('p') {
                ensure!(
                    declared.is_none(),
                    "line {}: duplicate problem line",
                    lineno + 1
                );
                let fields: Vec<&str> = rest.split_whitespace().collect();
                ensure!(
                    fields.len() == 3 && fields[0] == "cnf",
                    "line {}: malformed problem line '{}'",
                    lineno + 1,
                    line
                );
                let vars = fields[1]
                    .parse::<usize>()
                    .with_context(|| format!("line {}: bad variable count", lineno + 1))?;
                let num_clauses = fields[2]
                    .parse::<usize>()
                    .with_context(|| format!("line {}: bad clause count", lineno + 1))?;
                declared = Some((vars, num_clauses));
                continue;
            }
            ensure!(
                declared.is_some(),
                "line {}: clause before the problem line",
                lineno + 1
            );
            let mut literals: Vec<i32> = Vec::new();
            let mut terminated = false;
            for token in line.split_whitespace() {
                let lit = token
                    .parse::<i32>()
                    .with_context(|| format!("line {}: bad literal '{}'", lineno + 1, token))?;
                if lit == 0 {
                    terminated = true;
                    break;
                }
                literals.push(lit);
            }
            if !terminated {
                eprintln!("Warning: line {} not terminated with 0", lineno + 1);
            }
            if literals.is_empty() && terminated {
                // lone "0" trailer line, as some benchmark sets append
                continue;
            }
            ensure!(!literals.is_empty(), "line {}: empty clause", lineno + 1);
            clauses.push(literals);
        }
        let (num_variables, num_clauses) =
            declared.ok_or_else(|| anyhow!("no problem line found"))?;
        ensure!(
            clauses.len() == num_clauses,
            "problem line declares {} clauses but {} were read",
            num_clauses,
            clauses.len()
        );
        Instance::new(num_variables, clauses)
    }

    /// Render the instance back to DIMACS CNF text.
    pub fn to_dimacs(&self) -> String {
        let mut out = format!(
            "p cnf {} {}\n",
            self.num_variables(),
            self.num_clauses()
        );
        for clause in self.clauses() {
            for lit in clause.literals() {
                let signed = (lit.var as i32 + 1) * if lit.negated { -1 } else { 1 };
                out.push_str(&signed.to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}
