//! Trigger-timed effects, fired by the engine outside the per-spin fold

use serde::{Deserialize, Serialize};

use crate::patterns::MatchedPattern;
use crate::state::GameState;
use crate::symbols::Symbol;

use super::{EffectEntry, EffectKind, EffectTrigger, Modifier, ModifierDefinition};

/// Product of every detection-triggered multiplier that applies to a spin
pub fn detection_multiplier(state: &GameState, matches: &[MatchedPattern]) -> f64 {
    let mut factor = 1.0;
    for (entry, value) in entries_with_trigger(state, EffectTrigger::Detection) {
        match entry.kind {
            EffectKind::ConditionalMultiplier => {
                let holds = entry.condition.as_ref().is_none_or(|c| c.holds(matches));
                if holds {
                    factor *= value.max(0.0);
                }
            }
            EffectKind::PercentileMultiplier => {
                if !matches.is_empty() {
                    factor *= (1.0 + value / 100.0).max(0.0);
                }
            }
            EffectKind::WeightIncrease
            | EffectKind::WeightDecrease
            | EffectKind::ValueIncrease
            | EffectKind::ChanceIncrease
            | EffectKind::SymbolMultiplierIncrease
            | EffectKind::PatternMultiplierIncrease
            | EffectKind::WildSymbolIncrease
            | EffectKind::ExtraSpins
            | EffectKind::Insurance
            | EffectKind::InstantLevelUp
            | EffectKind::TransformBonus
            | EffectKind::DestroyBonus
            | EffectKind::RemoveSymbol
            | EffectKind::FreeReroll
            | EffectKind::ComboRepeat => {}
        }
    }
    factor
}

/// Grant free rerolls from shop-triggered effects; returns how many
pub fn grant_free_rerolls(state: &mut GameState) -> u32 {
    let granted: u32 = entries_with_trigger(state, EffectTrigger::Shop)
        .filter(|(entry, _)| entry.kind == EffectKind::FreeReroll)
        .map(|(_, value)| value.floor().max(0.0) as u32)
        .sum();
    state.free_rerolls += granted;
    granted
}

/// What the level-end phase changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelEndEffects {
    pub insurance_dollars: u64,
    pub levels_granted: u32,
    pub removed_symbols: Vec<Symbol>,
    /// `(from, to)` modifier ids
    pub transformed: Vec<(String, String)>,
    pub destroyed: Vec<String>,
}

impl LevelEndEffects {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fire level-end effects of every equipped modifier, bonuses first.
///
/// `transform_bonus` swaps the owner for the catalog entry named by its first
/// target and `destroy_bonus` drops the owner once its other effects fired.
pub fn apply_level_end(
    state: &mut GameState,
    zero_match_spins: u32,
    bonus_catalog: &[ModifierDefinition],
    joker_catalog: &[ModifierDefinition],
) -> LevelEndEffects {
    let mut effects = LevelEndEffects::default();

    let bonuses = std::mem::take(&mut state.bonuses);
    let bonuses = resolve_level_end(state, bonuses, zero_match_spins, bonus_catalog, &mut effects);
    state.bonuses = bonuses;

    let jokers = std::mem::take(&mut state.jokers);
    let jokers = resolve_level_end(state, jokers, zero_match_spins, joker_catalog, &mut effects);
    state.jokers = jokers;

    effects
}

fn resolve_level_end<M: Modifier>(
    state: &mut GameState,
    owned: Vec<M>,
    zero_match_spins: u32,
    catalog: &[ModifierDefinition],
    effects: &mut LevelEndEffects,
) -> Vec<M> {
    let mut kept = Vec::with_capacity(owned.len());

    for modifier in owned {
        let mut replacement: Option<M> = None;
        let mut destroyed = false;

        for entry in &modifier.definition().effects {
            let value = modifier.effect_value(entry);
            match entry.kind {
                EffectKind::Insurance => {
                    let paid = value.floor().max(0.0) as u64 * zero_match_spins as u64;
                    state.dollars += paid;
                    effects.insurance_dollars += paid;
                }
                EffectKind::InstantLevelUp => {
                    let levels = value.floor().max(0.0) as u32;
                    state.player_level += levels;
                    effects.levels_granted += levels;
                }
                EffectKind::RemoveSymbol => remove_symbols(state, &entry.targets, effects),
                EffectKind::TransformBonus => {
                    let from = &modifier.definition().id;
                    match entry.targets.first().and_then(|t| catalog.iter().find(|d| d.id == *t)) {
                        Some(target) => {
                            log::debug!("Transforming {from} into {}", target.id);
                            effects.transformed.push((from.clone(), target.id.clone()));
                            replacement = Some(modifier.transformed(target.clone()));
                        }
                        None => log::warn!("Transform target {:?} of {from} not in catalog", entry.targets),
                    }
                }
                EffectKind::DestroyBonus => destroyed = true,
                EffectKind::WeightIncrease
                | EffectKind::WeightDecrease
                | EffectKind::ValueIncrease
                | EffectKind::ChanceIncrease
                | EffectKind::SymbolMultiplierIncrease
                | EffectKind::PatternMultiplierIncrease
                | EffectKind::WildSymbolIncrease
                | EffectKind::ExtraSpins
                | EffectKind::FreeReroll
                | EffectKind::ConditionalMultiplier
                | EffectKind::PercentileMultiplier
                | EffectKind::ComboRepeat => {}
            }
        }

        if destroyed {
            log::debug!("Destroying {}", modifier.definition().id);
            effects.destroyed.push(modifier.definition().id.clone());
        } else {
            kept.push(replacement.unwrap_or(modifier));
        }
    }

    kept
}

fn remove_symbols(state: &mut GameState, targets: &[String], effects: &mut LevelEndEffects) {
    for target in targets {
        let symbol = Symbol::from(target.as_str());
        let remaining: f64 = state
            .symbol_weights
            .iter()
            .filter(|(s, w)| **s != symbol && **w > 0.0)
            .map(|(_, w)| *w)
            .sum();
        if remaining <= 0.0 {
            log::warn!("Not removing {symbol}: no other symbol could spawn");
            continue;
        }
        if let Some(weight) = state.symbol_weights.get_mut(&symbol) {
            *weight = 0.0;
            effects.removed_symbols.push(symbol);
        }
    }
}

/// Every (entry, resolved value) of the equipped modifiers with `trigger`
fn entries_with_trigger(state: &GameState, trigger: EffectTrigger) -> impl Iterator<Item = (&EffectEntry, f64)> {
    let bonuses = state.bonuses.iter().flat_map(move |b| {
        b.definition
            .effects
            .iter()
            .filter(move |e| e.kind.trigger() == trigger)
            .map(move |e| (e, b.effect_value(e)))
    });
    let jokers = state.jokers.iter().flat_map(move |j| {
        j.definition
            .effects
            .iter()
            .filter(move |e| e.kind.trigger() == trigger)
            .map(move |e| (e, j.effect_value(e)))
    });
    bonuses.chain(jokers)
}
