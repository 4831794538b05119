//! Spin outcome

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::patterns::MatchedPattern;

/// Everything one spin produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Spin index within its level
    pub index: u32,
    pub grid: Grid,
    pub combos: Vec<MatchedPattern>,
    pub connections: Vec<MatchedPattern>,
    /// Gain before detection-triggered multipliers
    pub base_gain: u64,
    pub detection_multiplier: f64,
    /// Tokens added to the state
    pub token_gain: u64,
    pub jackpot: bool,
    /// Chance after the modifier fold
    pub chance: f64,
    pub wild_symbols: u32,
}

impl SpinOutcome {
    /// Combos then connections, in discovery order
    pub fn matches(&self) -> impl Iterator<Item = &MatchedPattern> {
        self.combos.iter().chain(self.connections.iter())
    }

    pub fn match_count(&self) -> usize {
        self.combos.len() + self.connections.len()
    }

    pub fn is_win(&self) -> bool {
        self.token_gain > 0
    }
}
