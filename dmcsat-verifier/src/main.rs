//! Standalone solution checker.
//!
//! Deliberately shares no code with the solver crates: it has its own
//! DIMACS parser and evaluates clauses literal by literal, so a bug in the
//! solver's bitmask machinery cannot hide here.

use anyhow::{anyhow, ensure, Context, Result};
use clap::{arg, Command};
use std::{fs, io::Read, path::PathBuf, process::ExitCode};

fn cli() -> Command {
    Command::new("dmcsat-verifier")
        .about("Counts the clauses of a DIMACS CNF instance violated by an assignment")
        .arg_required_else_help(true)
        .arg(
            arg!(<CNF_FILE> "Path to a DIMACS CNF file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(<ASSIGNMENT> "Assignment as a 0/1 bitstring (variable 1 first), a path to a file holding one, or '-' for stdin")
                .value_parser(clap::value_parser!(String)),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match verify(
        matches.get_one::<PathBuf>("CNF_FILE").unwrap().clone(),
        matches.get_one::<String>("ASSIGNMENT").unwrap().clone(),
    ) {
        Ok(violated) => {
            println!("{} clauses violated", violated);
            if violated == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

struct Cnf {
    num_variables: usize,
    clauses: Vec<Vec<i32>>,
}

fn verify(cnf_file: PathBuf, assignment: String) -> Result<usize> {
    let text = fs::read_to_string(&cnf_file)
        .with_context(|| format!("unable to read {}", cnf_file.display()))?;
    let cnf = parse_cnf(&text)?;
    let bits = load_assignment(&assignment)?;
    ensure!(
        bits.len() == cnf.num_variables,
        "bitstring has {} variables, instance has {}",
        bits.len(),
        cnf.num_variables
    );
    let unused = (1..=cnf.num_variables as i32)
        .filter(|v| !cnf.clauses.iter().flatten().any(|l| l.abs() == *v))
        .count();
    if unused > 0 {
        eprintln!("Warning: {} unused (free) variables", unused);
    }
    Ok(num_violated(&bits, &cnf.clauses))
}

fn num_violated(bits: &[bool], clauses: &[Vec<i32>]) -> usize {
    clauses
        .iter()
        .filter(|clause| {
            !clause.iter().any(|&literal| {
                let value = bits[literal.unsigned_abs() as usize - 1];
                (literal > 0 && value) || (literal < 0 && !value)
            })
        })
        .count()
}

fn parse_cnf(text: &str) -> Result<Cnf> {
    let mut declared: Option<(usize, usize)> = None;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') || line.starts_with('%') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('p') {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            ensure!(
                fields.len() == 3 && fields[0] == "cnf",
                "line {}: malformed problem line",
                lineno + 1
            );
            declared = Some((fields[1].parse()?, fields[2].parse()?));
            continue;
        }
        let mut literals = Vec::new();
        for token in line.split_whitespace() {
            let literal: i32 = token
                .parse()
                .with_context(|| format!("line {}: bad literal '{}'", lineno + 1, token))?;
            if literal == 0 {
                break;
            }
            literals.push(literal);
        }
        ensure!(!literals.is_empty(), "line {}: empty clause", lineno + 1);
        clauses.push(literals);
    }
    let (num_variables, claimed_clauses) =
        declared.ok_or_else(|| anyhow!("no problem line found"))?;
    ensure!(
        clauses.len() == claimed_clauses,
        "{} clauses claimed, {} clauses counted",
        claimed_clauses,
        clauses.len()
    );
    for clause in &clauses {
        for &literal in clause {
            ensure!(
                literal.unsigned_abs() as usize <= num_variables,
                "{} variables claimed, literal {} counted",
                num_variables,
                literal
            );
        }
    }
    Ok(Cnf {
        num_variables,
        clauses,
    })
}

fn load_assignment(arg: &str) -> Result<Vec<bool>> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if arg.chars().all(|c| c == '0' || c == '1') && !arg.is_empty() {
        arg.to_string()
    } else {
        fs::read_to_string(arg).with_context(|| format!("unable to read {}", arg))?
    };
    let line = text
        .lines()
        .next()
        .ok_or_else(|| anyhow!("empty assignment"))?
        .trim();
    line.chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(anyhow!("non-binary value '{}' in bitstring", c)),
        })
        .collect()
}
