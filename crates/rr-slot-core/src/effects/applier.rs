//! Per-spin modifier fold

use crate::patterns::PatternMultipliers;
use crate::state::GameState;
use crate::symbols::{Symbol, SymbolMap};

use super::{EffectEntry, EffectKind, Modifier};

/// Fold every equipped modifier into a copy of `state`.
///
/// Bonuses go first, then jokers, each in list order. A modifier applies all
/// of its entries before the next modifier starts.
pub fn apply_modifiers(state: &GameState) -> GameState {
    let mut working = state.clone();
    for bonus in &state.bonuses {
        apply_modifier(&mut working, bonus);
    }
    for joker in &state.jokers {
        apply_modifier(&mut working, joker);
    }
    working
}

/// Apply one modifier's entries in order
pub fn apply_modifier<M: Modifier + ?Sized>(state: &mut GameState, modifier: &M) {
    for entry in &modifier.definition().effects {
        apply_effect(state, entry, modifier.effect_value(entry));
    }
}

/// Apply a single per-spin effect with an already-resolved value.
/// Trigger-timed kinds leave the state untouched.
pub fn apply_effect(state: &mut GameState, entry: &EffectEntry, value: f64) {
    match entry.kind {
        EffectKind::WeightIncrease => {
            scale_symbols(&mut state.symbol_weights, &entry.targets, 1.0 + value / 100.0);
        }
        EffectKind::WeightDecrease => {
            scale_symbols(&mut state.symbol_weights, &entry.targets, (1.0 - value / 100.0).max(0.0));
        }
        EffectKind::ValueIncrease => {
            for target in &entry.targets {
                *state.symbol_values.entry(Symbol::from(target.as_str())).or_insert(0.0) += value;
            }
        }
        EffectKind::ChanceIncrease => state.add_chance(value),
        EffectKind::SymbolMultiplierIncrease => {
            add_or_broadcast_symbols(&mut state.symbol_multipliers, &entry.targets, value);
        }
        EffectKind::PatternMultiplierIncrease => {
            add_or_broadcast_patterns(&mut state.pattern_multipliers, &entry.targets, value);
        }
        EffectKind::WildSymbolIncrease => state.wild_symbols = add_count(state.wild_symbols, value),
        EffectKind::ExtraSpins => state.extra_spins = add_count(state.extra_spins, value),
        EffectKind::Insurance
        | EffectKind::InstantLevelUp
        | EffectKind::TransformBonus
        | EffectKind::DestroyBonus
        | EffectKind::RemoveSymbol
        | EffectKind::FreeReroll
        | EffectKind::ConditionalMultiplier
        | EffectKind::PercentileMultiplier
        | EffectKind::ComboRepeat => {}
    }
}

fn scale_symbols(map: &mut SymbolMap, targets: &[String], factor: f64) {
    for target in targets {
        if let Some(weight) = map.get_mut(&Symbol::from(target.as_str())) {
            *weight *= factor;
        }
    }
}

fn add_or_broadcast_symbols(map: &mut SymbolMap, targets: &[String], value: f64) {
    if targets.is_empty() {
        map.values_mut().for_each(|m| *m += value);
        return;
    }
    for target in targets {
        *map.entry(Symbol::from(target.as_str())).or_insert(1.0) += value;
    }
}

fn add_or_broadcast_patterns(map: &mut PatternMultipliers, targets: &[String], value: f64) {
    if targets.is_empty() {
        map.values_mut().for_each(|m| *m += value);
        return;
    }
    for target in targets {
        *map.entry(target.as_str().into()).or_insert(1.0) += value;
    }
}

fn add_count(count: u32, value: f64) -> u32 {
    (count as f64 + value).floor().max(0.0) as u32
}
