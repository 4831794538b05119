//! # rr-batch-sim: batch simulation for ReelRun
//!
//! Runs many seeded simulations in parallel and reduces them to aggregate
//! statistics.
//!
//! ```rust,ignore
//! let config = SimulationConfig::default().with_seed(7);
//! let report = rr_batch_sim::run_batch(&config, 1_000)?;
//! println!("success rate {:.2}", report.stats.success_rate);
//! ```

pub mod runner;
pub mod stats;

pub use runner::{BatchConfig, BatchRunner, BatchState};
pub use stats::AggregateStats;

use serde::{Deserialize, Serialize};

use rr_slot_core::{SimulationConfig, SimulationResult, SlotResult};

/// Output of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Successful runs, in iteration order
    pub results: Vec<SimulationResult>,
    pub stats: AggregateStats,
    /// Iterations that errored; excluded from `results`
    pub failed_iterations: Vec<usize>,
    pub cancelled: bool,
    /// Iteration `i` was seeded with `base_seed + i`
    pub base_seed: u64,
}

/// Run `iterations` copies of `config` on all CPUs, keeping per-run history.
/// Use [`BatchRunner`] with `keep_history: false` for summary-only results.
pub fn run_batch(config: &SimulationConfig, iterations: usize) -> SlotResult<BatchReport> {
    BatchRunner::new(BatchConfig::default().with_iterations(iterations).with_history(true)).run(config)
}
