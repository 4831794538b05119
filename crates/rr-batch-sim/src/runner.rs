//! Parallel batch runner
//!
//! Plays many independent runs of one configuration on a rayon pool. Each
//! iteration gets its own generator seeded `base_seed + i`, so a batch is
//! reproducible regardless of thread count.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rr_slot_core::{CancelToken, SimulationConfig, SimulationEngine, SimulationResult, SlotError, SlotResult};

use crate::BatchReport;
use crate::stats::AggregateStats;

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Batch execution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Overrides `SimulationConfig::iterations`
    pub iterations: Option<usize>,
    /// Worker threads; 0 = one per CPU
    pub threads: usize,
    /// Overrides `SimulationConfig::seed`
    pub base_seed: Option<u64>,
    /// Keep per-run history in the report
    pub keep_history: bool,
}

impl BatchConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = Some(seed);
        self
    }

    pub fn with_history(mut self, keep: bool) -> Self {
        self.keep_history = keep;
        self
    }

    fn thread_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Complete,
    Cancelled,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH RUNNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs a batch and exposes progress and cancellation to other threads
pub struct BatchRunner {
    config: BatchConfig,
    state: Arc<RwLock<BatchState>>,
    completed: Arc<AtomicU64>,
    total: Arc<AtomicU64>,
    cancel: CancelToken,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(BatchState::Idle)),
            completed: Arc::new(AtomicU64::new(0)),
            total: Arc::new(AtomicU64::new(0)),
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Stop remaining iterations and interrupt runs in flight. Applies to the
    /// current (or next) `run` only.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Shared flag, for cancelling from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        *self.state.read()
    }

    /// Finished iterations over total, in 0..=1
    pub fn progress(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.completed.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Validate `sim` and play the batch
    pub fn run(&self, sim: &SimulationConfig) -> SlotResult<BatchReport> {
        sim.validate()?;

        let iterations = self.config.iterations.unwrap_or(sim.iterations);
        let base_seed = self
            .config
            .base_seed
            .or(sim.seed)
            .unwrap_or_else(|| rand::rng().random());
        let threads = self.config.thread_count();

        self.total.store(iterations as u64, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        *self.state.write() = BatchState::Running;
        log::info!("Batch: {iterations} iterations on {threads} threads (base seed {base_seed})");

        let work = || {
            (0..iterations)
                .into_par_iter()
                .filter_map(|i| self.run_one(sim, base_seed, i))
                .collect::<Vec<_>>()
        };

        let outcomes = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(work),
            Err(e) => {
                log::warn!("Thread pool build failed ({e}), using global pool");
                work()
            }
        };

        let mut results = Vec::with_capacity(outcomes.len());
        let mut failed_iterations = Vec::new();
        for (i, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(SlotError::Cancelled) => {}
                Err(e) => {
                    log::warn!("Iteration {i} failed: {e}");
                    failed_iterations.push(i);
                }
            }
        }

        let cancelled = self.is_cancelled();
        // Consumed by this batch; the next run starts clean
        self.cancel.reset();
        *self.state.write() = if cancelled {
            BatchState::Cancelled
        } else {
            BatchState::Complete
        };

        let stats = AggregateStats::from_results(&results);
        log::info!(
            "Batch done: {} runs, success rate {:.3}, {} failed",
            stats.runs,
            stats.success_rate,
            failed_iterations.len()
        );

        Ok(BatchReport {
            results,
            stats,
            failed_iterations,
            cancelled,
            base_seed,
        })
    }

    fn run_one(&self, sim: &SimulationConfig, base_seed: u64, i: usize) -> Option<(usize, SlotResult<SimulationResult>)> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(i as u64));
        let outcome = SimulationEngine::with_rng(sim, rng)
            .with_cancel(self.cancel.clone())
            .run()
            .map(|mut result| {
                if !self.config.keep_history {
                    result.history.clear();
                }
                result
            });

        self.completed.fetch_add(1, Ordering::Relaxed);
        Some((i, outcome))
    }
}
