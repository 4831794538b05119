//! Aggregate statistics over many runs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rr_slot_core::{LevelId, SimulationResult};

/// Batch-wide summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Runs that produced a result
    pub runs: usize,
    pub success_rate: f64,
    pub full_completion_rate: f64,
    pub mean_final_tokens: f64,
    pub min_final_tokens: u64,
    pub max_final_tokens: u64,
    /// Population standard deviation
    pub std_dev_final_tokens: f64,
    pub mean_final_dollars: f64,
    pub mean_final_player_level: f64,
    pub mean_levels_completed: f64,
    /// Most frequent final level; ties go to the lowest level
    pub modal_final_level: Option<LevelId>,
    pub total_jackpots: u64,
}

impl AggregateStats {
    /// Reduce per-run results. An empty slice gives all-zero stats.
    pub fn from_results(results: &[SimulationResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let n = results.len() as f64;
        let tokens: Vec<f64> = results.iter().map(|r| r.final_tokens as f64).collect();
        let mean_tokens = tokens.iter().sum::<f64>() / n;
        let variance = tokens.iter().map(|t| (t - mean_tokens).powi(2)).sum::<f64>() / n;

        Self {
            runs: results.len(),
            success_rate: rate(results, |r| r.success),
            full_completion_rate: rate(results, |r| r.completed_fully),
            mean_final_tokens: mean_tokens,
            min_final_tokens: results.iter().map(|r| r.final_tokens).min().unwrap_or(0),
            max_final_tokens: results.iter().map(|r| r.final_tokens).max().unwrap_or(0),
            std_dev_final_tokens: variance.sqrt(),
            mean_final_dollars: results.iter().map(|r| r.final_dollars as f64).sum::<f64>() / n,
            mean_final_player_level: results.iter().map(|r| r.final_player_level as f64).sum::<f64>() / n,
            mean_levels_completed: results.iter().map(|r| r.stats.levels_completed as f64).sum::<f64>() / n,
            modal_final_level: modal_level(results),
            total_jackpots: results.iter().map(|r| r.stats.jackpots).sum(),
        }
    }
}

fn rate(results: &[SimulationResult], pred: impl Fn(&SimulationResult) -> bool) -> f64 {
    results.iter().filter(|r| pred(r)).count() as f64 / results.len() as f64
}

fn modal_level(results: &[SimulationResult]) -> Option<LevelId> {
    let mut counts: BTreeMap<LevelId, usize> = BTreeMap::new();
    for r in results {
        *counts.entry(r.final_level).or_insert(0) += 1;
    }

    let mut best: Option<(LevelId, usize)> = None;
    for (level, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((level, count));
        }
    }
    best.map(|(level, _)| level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rr_slot_core::RunStats;

    fn result(tokens: u64, success: bool, level: LevelId) -> SimulationResult {
        SimulationResult {
            success,
            completed_fully: success,
            final_tokens: tokens,
            final_dollars: 10,
            final_player_level: 2,
            final_xp: 0,
            final_level: level,
            failed_level: None,
            history: Vec::new(),
            stats: RunStats::default(),
        }
    }

    #[test]
    fn test_empty_batch() {
        let stats = AggregateStats::from_results(&[]);
        assert_eq!(stats.runs, 0);
        assert_eq!(stats.modal_final_level, None);
    }

    #[test]
    fn test_token_moments() {
        let results = vec![
            result(2, true, LevelId::new(1, 1)),
            result(4, true, LevelId::new(1, 1)),
            result(4, false, LevelId::new(1, 2)),
            result(4, false, LevelId::new(1, 2)),
            result(5, true, LevelId::new(1, 2)),
            result(5, true, LevelId::new(2, 1)),
            result(7, true, LevelId::new(2, 1)),
            result(9, true, LevelId::new(2, 1)),
        ];
        let stats = AggregateStats::from_results(&results);
        assert_relative_eq!(stats.mean_final_tokens, 5.0);
        assert_relative_eq!(stats.std_dev_final_tokens, 2.0);
        assert_eq!(stats.min_final_tokens, 2);
        assert_eq!(stats.max_final_tokens, 9);
        assert_relative_eq!(stats.success_rate, 0.75);
        assert_relative_eq!(stats.mean_final_dollars, 10.0);
    }

    #[test]
    fn test_modal_tie_goes_to_lowest() {
        let results = vec![
            result(1, true, LevelId::new(2, 1)),
            result(1, true, LevelId::new(1, 3)),
            result(1, true, LevelId::new(2, 1)),
            result(1, true, LevelId::new(1, 3)),
        ];
        assert_eq!(AggregateStats::from_results(&results).modal_final_level, Some(LevelId::new(1, 3)));
    }
}
