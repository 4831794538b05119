//! ReelRun simulator CLI
//!
//! Usage:
//!   rr-sim run <config>         - Play one run, print the result
//!   rr-sim batch <config>       - Play many runs in parallel, print the report
//!   rr-sim defaults             - Print the default configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use rr_batch_sim::{BatchConfig, BatchRunner};
use rr_slot_core::{ConfigFormat, SimulationConfig};

#[derive(Parser)]
#[command(name = "rr-sim", about = "ReelRun slot progression simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one run
    Run {
        /// Config file (.json, .yaml or .yml)
        config: PathBuf,
        /// Override the configured seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Drop the spin history from the output
        #[arg(long)]
        no_history: bool,
    },
    /// Play many runs in parallel
    Batch {
        /// Config file (.json, .yaml or .yml)
        config: PathBuf,
        /// Number of runs (default: from config)
        #[arg(short = 'n', long)]
        iterations: Option<usize>,
        /// Worker threads (0 = all CPUs)
        #[arg(short = 'j', long, default_value_t = 0)]
        threads: usize,
        /// Base seed; run i uses seed + i
        #[arg(short, long)]
        seed: Option<u64>,
        /// Print aggregate stats only
        #[arg(long)]
        summary_only: bool,
    },
    /// Print the default configuration as JSON
    Defaults,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, seed, no_history } => run_single(&config, seed, no_history),
        Commands::Batch {
            config,
            iterations,
            threads,
            seed,
            summary_only,
        } => run_batch(&config, iterations, threads, seed, summary_only),
        Commands::Defaults => print_json(&SimulationConfig::default()),
    }
}

fn load_config(path: &Path) -> Result<SimulationConfig> {
    let Some(format) = ConfigFormat::from_path(path) else {
        bail!("Unsupported config extension: {}", path.display());
    };
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SimulationConfig::parse(&text, format).with_context(|| format!("Invalid config {}", path.display()))
}

fn run_single(path: &Path, seed: Option<u64>, no_history: bool) -> Result<()> {
    let mut config = load_config(path)?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let mut result = rr_slot_core::run(&config).context("Simulation failed")?;
    if no_history {
        result.history.clear();
    }
    print_json(&result)
}

fn run_batch(path: &Path, iterations: Option<usize>, threads: usize, seed: Option<u64>, summary_only: bool) -> Result<()> {
    let config = load_config(path)?;

    let mut batch = BatchConfig::default().with_threads(threads);
    if let Some(n) = iterations {
        batch = batch.with_iterations(n);
    }
    if let Some(seed) = seed {
        batch = batch.with_base_seed(seed);
    }

    let report = BatchRunner::new(batch).run(&config).context("Batch failed")?;
    if summary_only {
        print_json(&report.stats)
    } else {
        print_json(&report)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
