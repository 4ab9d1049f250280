use anyhow::{anyhow, Context, Result};
use clap::{arg, ArgAction, Command};
use dmcsat_cnf::Instance;
use dmcsat_walk::{run_parallel, RunReport, WalkParams};
use serde::Serialize;
use std::{
    fs,
    path::PathBuf,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

fn cli() -> Command {
    Command::new("dmcsat-runtime")
        .about("Searches SAT instances with a diffusion Monte Carlo walk")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("solve")
                .about("Runs independent walks against a DIMACS CNF instance")
                .arg(
                    arg!(<CNF_FILE> "Path to a DIMACS CNF file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--walkers [WALKERS] "Number of walkers per run")
                        .default_value("50")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--runs [RUNS] "Number of independent parallel runs")
                        .default_value("8")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--duration [DURATION] "Physical duration of the evolution (default: tuned to the instance size)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--scale [SCALE] "Scaling of the potential (default: tuned to the instance size)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--seed [SEED] "Base RNG seed; run t uses seed + t (default: system time)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, a json report will be saved to this file path")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--quiet "Suppress the periodic per-run statistics")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generates a random 3-SAT instance at the phase transition")
                .arg(
                    arg!(<NUM_VARIABLES> "Number of variables (at most 256)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--seed [SEED] "RNG seed for generation")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "Write the DIMACS text here instead of stdout")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("solve", sub_m)) => solve(
            sub_m.get_one::<PathBuf>("CNF_FILE").unwrap().clone(),
            *sub_m.get_one::<usize>("walkers").unwrap(),
            *sub_m.get_one::<usize>("runs").unwrap(),
            sub_m.get_one::<f64>("duration").cloned(),
            sub_m.get_one::<f64>("scale").cloned(),
            sub_m.get_one::<u64>("seed").cloned(),
            sub_m.get_one::<PathBuf>("output").cloned(),
            sub_m.get_flag("quiet"),
        ),
        Some(("generate", sub_m)) => generate(
            *sub_m.get_one::<usize>("NUM_VARIABLES").unwrap(),
            *sub_m.get_one::<u64>("seed").unwrap(),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[derive(Serialize)]
struct SolveOutput {
    num_variables: usize,
    num_clauses: usize,
    params: WalkParams,
    num_runs: usize,
    runs: Vec<RunReport>,
    walltime: f64,
}

fn solve(
    cnf_file: PathBuf,
    walkers: usize,
    runs: usize,
    duration: Option<f64>,
    scale: Option<f64>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let text = fs::read_to_string(&cnf_file)
        .with_context(|| format!("unable to read {}", cnf_file.display()))?;
    let instance = Instance::from_dimacs(&text)?;
    let num_bits = instance.num_variables();

    // Tuned by trial and error for random 3-SAT at the sat/unsat phase
    // transition.
    let params = WalkParams {
        num_walkers: walkers,
        duration: duration.unwrap_or(188.0 * (0.053 * num_bits as f64).exp()),
        scale: scale.unwrap_or(75.0 / num_bits as f64),
        seed: seed.map_or_else(system_time_seed, Ok)?,
    };

    println!(
        "{} clauses, {} variables",
        instance.num_clauses(),
        num_bits
    );
    // Echoed so a run can be reproduced exactly.
    println!("master seed = {}", params.seed);
    println!("walkers = {}", params.num_walkers);
    println!("runs = {}", runs);
    println!("duration = {:e}", params.duration);
    println!("scale = {:e}", params.scale);

    let begin = Instant::now();
    let reports = run_parallel(&instance, params, runs, !quiet)?;
    let walltime = begin.elapsed().as_secs_f64();

    for report in &reports {
        if report.solved {
            if report.assignments.len() == 1 {
                println!("Seed {} found 1 solution:", report.seed);
            } else {
                println!(
                    "Seed {} found {} solutions:",
                    report.seed,
                    report.assignments.len()
                );
            }
        } else {
            println!(
                "Seed {}: best approximations found: {} clauses violated.",
                report.seed, report.best_violated
            );
        }
        for assignment in &report.assignments {
            println!("{}", assignment);
        }
    }
    let solved = reports.iter().filter(|r| r.solved).count();
    println!("{} of {} runs found a satisfying assignment", solved, runs);
    println!("walltime: {:.6} seconds", walltime);

    if let Some(path) = output {
        let out = SolveOutput {
            num_variables: num_bits,
            num_clauses: instance.num_clauses(),
            params,
            num_runs: runs,
            runs: reports,
            walltime,
        };
        fs::write(&path, serde_json::to_string_pretty(&out)?)
            .with_context(|| format!("unable to write {}", path.display()))?;
    }
    Ok(())
}

fn generate(num_variables: usize, seed: u64, output: Option<PathBuf>) -> Result<()> {
    let instance = dmcsat_cnf::generate::generate(num_variables, seed)?;
    let text = instance.to_dimacs();
    match output {
        Some(path) => fs::write(&path, text)
            .with_context(|| format!("unable to write {}", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}

fn system_time_seed() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow!("system clock error: {}", e))?
        .as_secs())
}
