//! Modifier effects: bonus and joker definitions and their effect entries
//!
//! Effects come in two timings. Per-spin kinds are folded into a working copy
//! of the state before every spin ([`apply_modifiers`]). Trigger-timed kinds
//! are skipped by that fold and fire from the engine's detection, level-end
//! and shop phases ([`triggers`]).

mod applier;
pub mod triggers;

use serde::{Deserialize, Serialize};

use crate::patterns::{MatchedPattern, PatternId};
use crate::shop::Rarity;
use crate::symbols::Symbol;

pub use applier::{apply_effect, apply_modifier, apply_modifiers};

/// Every effect kind a modifier can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Target weights × (1 + v/100)
    WeightIncrease,
    /// Target weights × max(0, 1 − v/100)
    WeightDecrease,
    /// Target values + v
    ValueIncrease,
    /// Chance + v, clamped
    ChanceIncrease,
    /// Target (or every) symbol multiplier + v
    SymbolMultiplierIncrease,
    /// Target (or every) pattern multiplier + v
    PatternMultiplierIncrease,
    /// Wild count + v
    WildSymbolIncrease,
    /// Spins this level + v
    ExtraSpins,
    /// Dollars per zero-match spin at level end
    Insurance,
    /// Player levels at level end
    InstantLevelUp,
    /// Swap the owning bonus for another catalog bonus
    TransformBonus,
    /// Remove the owning bonus at level end
    DestroyBonus,
    /// Zero target weights at level end
    RemoveSymbol,
    /// Free shop rerolls
    FreeReroll,
    /// Spin gain × v when a condition holds
    ConditionalMultiplier,
    /// Spin gain × (1 + v/100) when anything matched
    PercentileMultiplier,
    /// Declared in data, never applied
    ComboRepeat,
}

/// When an effect kind fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTrigger {
    PerSpin,
    Detection,
    LevelEnd,
    Shop,
    Unresolved,
}

impl EffectKind {
    pub fn trigger(&self) -> EffectTrigger {
        match self {
            Self::WeightIncrease
            | Self::WeightDecrease
            | Self::ValueIncrease
            | Self::ChanceIncrease
            | Self::SymbolMultiplierIncrease
            | Self::PatternMultiplierIncrease
            | Self::WildSymbolIncrease
            | Self::ExtraSpins => EffectTrigger::PerSpin,
            Self::ConditionalMultiplier | Self::PercentileMultiplier => EffectTrigger::Detection,
            Self::Insurance
            | Self::InstantLevelUp
            | Self::TransformBonus
            | Self::DestroyBonus
            | Self::RemoveSymbol => EffectTrigger::LevelEnd,
            Self::FreeReroll => EffectTrigger::Shop,
            Self::ComboRepeat => EffectTrigger::Unresolved,
        }
    }

    /// Applied by the per-spin fold
    pub fn is_per_spin(&self) -> bool {
        self.trigger() == EffectTrigger::PerSpin
    }
}

/// Condition guarding a conditional multiplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboCondition {
    /// At least this many matches in the spin
    MinMatches(u32),
    /// A specific pattern matched
    PatternMatched(PatternId),
    /// Some match anchored on this symbol
    SymbolMatched(Symbol),
    /// The jackpot pattern matched
    Jackpot,
}

impl ComboCondition {
    /// Evaluate against one spin's matches
    pub fn holds(&self, matches: &[MatchedPattern]) -> bool {
        match self {
            Self::MinMatches(n) => matches.len() >= *n as usize,
            Self::PatternMatched(id) => matches.iter().any(|m| m.pattern_id == *id),
            Self::SymbolMatched(symbol) => matches.iter().any(|m| m.anchor == *symbol),
            Self::Jackpot => matches.iter().any(|m| m.pattern_id.is_jackpot()),
        }
    }
}

/// One effect of a modifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    pub kind: EffectKind,
    #[serde(default)]
    pub base_value: f64,
    /// Added per bonus level above 1
    #[serde(default)]
    pub scaling_per_level: f64,
    /// Level cap for scaling; 0 means uncapped
    #[serde(default)]
    pub max_level: u32,
    /// Symbol, pattern or catalog ids, depending on the kind
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ComboCondition>,
}

impl EffectEntry {
    pub fn new(kind: EffectKind, base_value: f64) -> Self {
        Self {
            kind,
            base_value,
            scaling_per_level: 0.0,
            max_level: 0,
            targets: Vec::new(),
            condition: None,
        }
    }

    /// Builder: per-level scaling with an optional cap
    pub fn with_scaling(mut self, scaling_per_level: f64, max_level: u32) -> Self {
        self.scaling_per_level = scaling_per_level;
        self.max_level = max_level;
        self
    }

    /// Builder: add a target id
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Builder: guard with a condition
    pub fn with_condition(mut self, condition: ComboCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Value at bonus level `level`: `base + scaling × (L − 1)`, with `L`
    /// capped at `max_level` when a cap is set
    pub fn value_at(&self, level: u32) -> f64 {
        let mut level = level.max(1);
        if self.max_level > 0 {
            level = level.min(self.max_level);
        }
        if level == 1 {
            self.base_value
        } else {
            self.base_value + self.scaling_per_level * (level - 1) as f64
        }
    }
}

/// Catalog entry for a bonus or joker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: Rarity,
    /// Shop price before ascension scaling
    #[serde(default)]
    pub base_price: f64,
    /// Applied in order
    #[serde(default)]
    pub effects: Vec<EffectEntry>,
}

impl ModifierDefinition {
    pub fn new(id: impl Into<String>, rarity: Rarity) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            rarity,
            base_price: 0.0,
            effects: Vec::new(),
        }
    }

    /// Builder: append an effect
    pub fn with_effect(mut self, effect: EffectEntry) -> Self {
        self.effects.push(effect);
        self
    }

    /// Builder: set base price
    pub fn with_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }
}

/// An equipped modifier instance
pub trait Modifier {
    fn definition(&self) -> &ModifierDefinition;

    /// Value of one of this modifier's effects
    fn effect_value(&self, entry: &EffectEntry) -> f64;

    /// Same instance carrying another definition
    fn transformed(&self, definition: ModifierDefinition) -> Self
    where
        Self: Sized;
}

/// A leveled bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquippedBonus {
    pub definition: ModifierDefinition,
    #[serde(default = "default_bonus_level")]
    pub level: u32,
}

fn default_bonus_level() -> u32 {
    1
}

impl EquippedBonus {
    pub fn new(definition: ModifierDefinition, level: u32) -> Self {
        Self {
            definition,
            level: level.max(1),
        }
    }
}

impl Modifier for EquippedBonus {
    fn definition(&self) -> &ModifierDefinition {
        &self.definition
    }

    fn effect_value(&self, entry: &EffectEntry) -> f64 {
        entry.value_at(self.level)
    }

    fn transformed(&self, definition: ModifierDefinition) -> Self {
        Self::new(definition, self.level)
    }
}

/// A joker; never leveled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquippedJoker {
    pub definition: ModifierDefinition,
}

impl EquippedJoker {
    pub fn new(definition: ModifierDefinition) -> Self {
        Self { definition }
    }
}

impl Modifier for EquippedJoker {
    fn definition(&self) -> &ModifierDefinition {
        &self.definition
    }

    fn effect_value(&self, entry: &EffectEntry) -> f64 {
        entry.base_value
    }

    fn transformed(&self, definition: ModifierDefinition) -> Self {
        Self::new(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;
    use crate::patterns::PatternFamily;

    fn matched(id: &str, anchor: &str) -> MatchedPattern {
        MatchedPattern {
            family: PatternFamily::Combo,
            pattern_id: id.into(),
            detection_order: 0,
            anchor: anchor.into(),
            positions: vec![Position::new(0, 0)],
            multiplier: 1.0,
            token_yield: 1,
        }
    }

    #[test]
    fn test_value_at_levels() {
        let entry = EffectEntry::new(EffectKind::ChanceIncrease, 5.0).with_scaling(2.0, 0);
        assert_eq!(entry.value_at(1), 5.0);
        assert_eq!(entry.value_at(3), 9.0);

        let capped = entry.clone().with_scaling(2.0, 2);
        assert_eq!(capped.value_at(10), 7.0);
    }

    #[test]
    fn test_joker_ignores_scaling() {
        let entry = EffectEntry::new(EffectKind::ValueIncrease, 3.0).with_scaling(10.0, 0);
        let joker = EquippedJoker::new(ModifierDefinition::new("j", Rarity::Common).with_effect(entry.clone()));
        let bonus = EquippedBonus::new(ModifierDefinition::new("b", Rarity::Common), 4);
        assert_eq!(joker.effect_value(&entry), 3.0);
        assert_eq!(bonus.effect_value(&entry), 33.0);
    }

    #[test]
    fn test_trigger_routing() {
        assert_eq!(EffectKind::ChanceIncrease.trigger(), EffectTrigger::PerSpin);
        assert_eq!(EffectKind::PercentileMultiplier.trigger(), EffectTrigger::Detection);
        assert_eq!(EffectKind::Insurance.trigger(), EffectTrigger::LevelEnd);
        assert_eq!(EffectKind::FreeReroll.trigger(), EffectTrigger::Shop);
        assert_eq!(EffectKind::ComboRepeat.trigger(), EffectTrigger::Unresolved);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let ok: Result<EffectEntry, _> = serde_json::from_str(r#"{"kind":"chance_increase","base_value":5}"#);
        assert!(ok.is_ok());
        let bad: Result<EffectEntry, _> = serde_json::from_str(r#"{"kind":"teleport","base_value":5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_combo_conditions() {
        let matches = vec![matched("eye", "BELL"), matched("horizontal_3", "LEMON")];
        assert!(ComboCondition::MinMatches(2).holds(&matches));
        assert!(!ComboCondition::MinMatches(3).holds(&matches));
        assert!(ComboCondition::PatternMatched("eye".into()).holds(&matches));
        assert!(ComboCondition::SymbolMatched("LEMON".into()).holds(&matches));
        assert!(!ComboCondition::Jackpot.holds(&matches));
        assert!(ComboCondition::Jackpot.holds(&[matched("JACKPOT", "BELL")]));
    }

    #[test]
    fn test_condition_serde_shape() {
        let entry: EffectEntry = serde_json::from_str(
            r#"{"kind":"conditional_multiplier","base_value":2,"condition":{"min_matches":3}}"#,
        )
        .unwrap();
        assert_eq!(entry.condition, Some(ComboCondition::MinMatches(3)));
    }
}
