//! Mutable per-run game state

use serde::{Deserialize, Deserializer, Serialize};

use crate::effects::{EquippedBonus, EquippedJoker};
use crate::level::LevelId;
use crate::patterns::PatternMultipliers;
use crate::symbols::SymbolMap;

/// Ceiling of the chance stat on every mutation path
pub const MAX_CHANCE: f64 = 90.0;

fn clamp_chance(chance: f64) -> f64 {
    if chance.is_nan() { 0.0 } else { chance.clamp(0.0, MAX_CHANCE) }
}

fn deserialize_chance<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_chance)
}

/// Everything one simulation run owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub tokens: u64,
    pub dollars: u64,
    pub player_level: u32,
    pub xp: u64,
    pub level: LevelId,
    pub ascension: u32,
    pub symbol_weights: SymbolMap,
    pub symbol_values: SymbolMap,
    pub symbol_multipliers: SymbolMap,
    pub pattern_multipliers: PatternMultipliers,
    #[serde(deserialize_with = "deserialize_chance")]
    chance: f64,
    pub wild_symbols: u32,
    /// Extra spins accrued for the current level
    pub extra_spins: u32,
    /// Added to 1.0 when converting match yields to tokens
    pub permanent_multiplier: f64,
    pub bonuses: Vec<EquippedBonus>,
    pub jokers: Vec<EquippedJoker>,
    /// Shop rerolls that cost nothing
    pub free_rerolls: u32,
}

impl GameState {
    /// Fresh state at `level` with empty tables
    pub fn new(level: LevelId) -> Self {
        Self {
            tokens: 0,
            dollars: 0,
            player_level: 1,
            xp: 0,
            level,
            ascension: 0,
            symbol_weights: SymbolMap::new(),
            symbol_values: SymbolMap::new(),
            symbol_multipliers: SymbolMap::new(),
            pattern_multipliers: PatternMultipliers::new(),
            chance: 0.0,
            wild_symbols: 0,
            extra_spins: 0,
            permanent_multiplier: 0.0,
            bonuses: Vec::new(),
            jokers: Vec::new(),
            free_rerolls: 0,
        }
    }

    pub fn chance(&self) -> f64 {
        self.chance
    }

    /// Set chance, clamped to `[0, MAX_CHANCE]`
    pub fn set_chance(&mut self, chance: f64) {
        self.chance = clamp_chance(chance);
    }

    /// Add to chance, clamped to `[0, MAX_CHANCE]`
    pub fn add_chance(&mut self, delta: f64) {
        self.set_chance(self.chance + delta);
    }

    /// Scalar view for history records
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::from(self)
    }
}

/// Scalar fields of [`GameState`] captured before/after a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub tokens: u64,
    pub dollars: u64,
    pub player_level: u32,
    pub xp: u64,
    pub level: LevelId,
    pub chance: f64,
    pub wild_symbols: u32,
    pub extra_spins: u32,
    pub permanent_multiplier: f64,
    pub bonus_count: usize,
    pub joker_count: usize,
}

impl From<&GameState> for StateSnapshot {
    fn from(state: &GameState) -> Self {
        Self {
            tokens: state.tokens,
            dollars: state.dollars,
            player_level: state.player_level,
            xp: state.xp,
            level: state.level,
            chance: state.chance,
            wild_symbols: state.wild_symbols,
            extra_spins: state.extra_spins,
            permanent_multiplier: state.permanent_multiplier,
            bonus_count: state.bonuses.len(),
            joker_count: state.jokers.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chance_clamped() {
        let mut state = GameState::new(LevelId::new(1, 1));
        state.add_chance(50.0);
        state.add_chance(50.0);
        assert_eq!(state.chance(), MAX_CHANCE);

        state.set_chance(-3.0);
        assert_eq!(state.chance(), 0.0);

        state.set_chance(f64::NAN);
        assert_eq!(state.chance(), 0.0);
    }

    #[test]
    fn test_loaded_chance_clamped() {
        let mut value = serde_json::to_value(GameState::new(LevelId::new(1, 1))).unwrap();
        value["chance"] = serde_json::json!(250.0);
        let state: GameState = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(state.chance(), MAX_CHANCE);

        value["chance"] = serde_json::json!(-4.0);
        let state: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(state.chance(), 0.0);
    }

    #[test]
    fn test_snapshot_copies_scalars() {
        let mut state = GameState::new(LevelId::new(2, 1));
        state.tokens = 12;
        state.dollars = 7;
        let snap = state.snapshot();
        assert_eq!(snap.tokens, 12);
        assert_eq!(snap.dollars, 7);
        assert_eq!(snap.level, LevelId::new(2, 1));
    }
}
