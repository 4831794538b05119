//! Run result and per-run statistics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::history::HistoryRecord;
use crate::level::LevelId;
use crate::patterns::PatternId;
use crate::spin::SpinOutcome;

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub spins: u64,
    pub levels_completed: u32,
    pub total_matches: u64,
    pub jackpots: u64,
    pub pattern_counts: BTreeMap<PatternId, u64>,
    pub winning_spins: u64,
    pub total_tokens_gained: u64,
    pub min_spin_gain: u64,
    pub max_spin_gain: u64,
}

impl RunStats {
    /// Fold one spin into the counters
    pub fn record_spin(&mut self, outcome: &SpinOutcome) {
        let gain = outcome.token_gain;
        self.min_spin_gain = if self.spins == 0 {
            gain
        } else {
            self.min_spin_gain.min(gain)
        };
        self.max_spin_gain = self.max_spin_gain.max(gain);
        self.spins += 1;
        self.total_tokens_gained += gain;
        self.total_matches += outcome.match_count() as u64;
        if outcome.is_win() {
            self.winning_spins += 1;
        }
        if outcome.jackpot {
            self.jackpots += 1;
        }
        for m in outcome.matches() {
            *self.pattern_counts.entry(m.pattern_id.clone()).or_insert(0) += 1;
        }
    }

    /// Mean tokens per spin
    pub fn avg_spin_gain(&self) -> f64 {
        if self.spins > 0 {
            self.total_tokens_gained as f64 / self.spins as f64
        } else {
            0.0
        }
    }

    /// Share of spins that gained tokens, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.spins > 0 {
            (self.winning_spins as f64 / self.spins as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Output of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// The end level was reached
    pub success: bool,
    /// Succeeded and the final tokens still cover the last played objective
    pub completed_fully: bool,
    pub final_tokens: u64,
    pub final_dollars: u64,
    pub final_player_level: u32,
    pub final_xp: u64,
    /// Level the run stopped on
    pub final_level: LevelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_level: Option<LevelId>,
    pub history: Vec<HistoryRecord>,
    pub stats: RunStats,
}

impl SimulationResult {
    /// Spin records only
    pub fn spins(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.history.iter().filter(|r| r.is_spin())
    }
}
