//! Simulation engine: per-spin and per-level state machine
//!
//! ```text
//! AwaitingLevel ──► Spinning ──► LevelComplete ──► AwaitingLevel
//!       │                  └───► LevelFailed (stop)
//!       └── end level reached ──► RunComplete
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::effects::apply_modifiers;
use crate::effects::triggers::{apply_level_end, detection_multiplier};
use crate::error::{SlotError, SlotResult};
use crate::gains::{add_xp, token_gain};
use crate::grid::GridGenerator;
use crate::history::{HistoryRecord, LevelEndRecord, SpinRecord};
use crate::level::{LevelId, LevelManager, tokens_after_level};
use crate::patterns::{DetectionContext, MatchedPattern, PatternDetector, PatternFamily};
use crate::result::{RunStats, SimulationResult};
use crate::shop::ShopManager;
use crate::spin::SpinOutcome;
use crate::state::GameState;
use crate::symbols::SymbolTables;

/// Shared cancellation flag, checked between spins
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    AwaitingLevel,
    Spinning,
    LevelComplete,
    LevelFailed,
    RunComplete,
}

/// Build the starting state of a run
pub fn initial_state(config: &SimulationConfig) -> GameState {
    let tables = SymbolTables::from_specs(&config.symbols);
    let mut state = GameState::new(config.start_level);

    state.ascension = config.ascension;
    state.symbol_weights = tables.weights;
    state.symbol_values = tables.values;
    state.symbol_multipliers = tables.multipliers;

    for def in config.rules.combos.iter().chain(config.rules.connections.iter()) {
        state.pattern_multipliers.insert(def.id.clone(), def.base_multiplier);
    }
    for (id, multiplier) in &config.pattern_multipliers {
        state.pattern_multipliers.insert(id.clone(), *multiplier);
    }

    let character = &config.character;
    state.set_chance(character.starting_chance);
    state.wild_symbols = character.starting_wilds;
    state.permanent_multiplier = character.permanent_multiplier;
    state.dollars = config.starting_dollars + character.bonus_dollars;
    state.bonuses.extend(config.starting_bonus.iter().cloned());

    state
}

/// One simulation run over a borrowed config
pub struct SimulationEngine<'a> {
    config: &'a SimulationConfig,
    levels: LevelManager,
    shop: ShopManager,
    generator: GridGenerator,
    combo_detector: PatternDetector,
    connection_detector: PatternDetector,
    rng: ChaCha8Rng,
    cancel: CancelToken,
    state: GameState,
    phase: EngineState,
    history: Vec<HistoryRecord>,
    stats: RunStats,
    /// Objective of the last level that reached its check
    last_objective: Option<u64>,
    failed_level: Option<LevelId>,
}

impl<'a> SimulationEngine<'a> {
    /// Engine seeded from `config.seed`, or OS entropy when unset
    pub fn new(config: &'a SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    /// Engine with an explicit generator
    pub fn with_rng(config: &'a SimulationConfig, rng: ChaCha8Rng) -> Self {
        let rules = &config.rules;
        Self {
            levels: LevelManager::new(
                rules.levels.clone(),
                rules.ascension_objective_multiplier,
                rules.stages_per_world,
            ),
            shop: ShopManager::new(rules.shop.clone()),
            generator: GridGenerator::new(rules.wild_symbol.clone()),
            combo_detector: PatternDetector::new(PatternFamily::Combo),
            connection_detector: PatternDetector::new(PatternFamily::Connection),
            rng,
            cancel: CancelToken::new(),
            state: initial_state(config),
            phase: EngineState::AwaitingLevel,
            history: Vec::new(),
            stats: RunStats::default(),
            last_objective: None,
            failed_level: None,
            config,
        }
    }

    /// Builder: observe an external cancellation flag
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn phase(&self) -> EngineState {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Play levels until the end level is reached or an objective is missed
    pub fn run(mut self) -> SlotResult<SimulationResult> {
        let end = self.config.end_level;
        log::debug!("Run {} → {} (ascension {})", self.state.level, end, self.state.ascension);

        while !self.state.level.has_reached(&end) {
            let level = self.state.level;
            let objective = self.levels.objective(level, self.state.ascension)?;

            self.phase = EngineState::Spinning;
            let zero_match_spins = self.play_level(level)?;
            self.last_objective = Some(objective);

            if self.state.tokens < objective {
                self.phase = EngineState::LevelFailed;
                self.fail_level(level, objective);
                break;
            }

            self.phase = EngineState::LevelComplete;
            self.complete_level(level, objective, zero_match_spins)?;
            self.phase = EngineState::AwaitingLevel;
        }

        if self.phase != EngineState::LevelFailed {
            self.phase = EngineState::RunComplete;
        }
        Ok(self.finish())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LEVEL
    // ═══════════════════════════════════════════════════════════════════════

    /// Spin through one level; returns how many spins matched nothing
    fn play_level(&mut self, level: LevelId) -> SlotResult<u32> {
        let extra = apply_modifiers(&self.state).extra_spins;
        let spins = self.config.rules.spins_per_level + extra;
        self.state.extra_spins = 0;
        log::trace!("Level {level}: {spins} spins ({extra} extra)");

        let mut zero_match_spins = 0;
        for index in 0..spins {
            if self.cancel.is_cancelled() {
                return Err(SlotError::Cancelled);
            }
            if self.spin(level, index)? == 0 {
                zero_match_spins += 1;
            }
        }
        Ok(zero_match_spins)
    }

    fn complete_level(&mut self, level: LevelId, objective: u64, zero_match_spins: u32) -> SlotResult<()> {
        let config = self.config;
        let rules = &config.rules;
        let before = self.state.snapshot();
        let tokens = self.state.tokens;
        let boss = self.levels.level(level)?.boss;

        self.state.tokens = tokens_after_level(tokens, objective, boss);

        let reward = self.levels.reward(level, self.state.dollars)?;
        self.state.dollars += reward.dollars + reward.interest;
        let xp = add_xp(self.state.xp, self.state.player_level, reward.xp);
        self.state.xp = xp.xp;
        self.state.player_level = xp.level;

        let effects = apply_level_end(
            &mut self.state,
            zero_match_spins,
            &rules.bonus_catalog,
            &rules.joker_catalog,
        );

        let chance = apply_modifiers(&self.state).chance();
        let shop = self
            .shop
            .run_phase(&mut self.state, chance, &rules.joker_catalog, &mut self.rng)?;

        let next = self.levels.next_level(level);
        self.state.level = next;
        self.stats.levels_completed += 1;
        log::debug!("Level {level} complete ({tokens}/{objective}), next {next}");

        self.history.push(HistoryRecord::LevelEnd(LevelEndRecord {
            level,
            objective,
            tokens,
            completed: true,
            boss,
            reward: Some(reward),
            xp: Some(xp),
            effects,
            shop: Some(shop),
            next_level: Some(next),
            before,
            after: self.state.snapshot(),
        }));
        Ok(())
    }

    fn fail_level(&mut self, level: LevelId, objective: u64) {
        log::debug!("Level {level} failed ({}/{objective})", self.state.tokens);
        self.failed_level = Some(level);
        let snapshot = self.state.snapshot();
        self.history.push(HistoryRecord::LevelEnd(LevelEndRecord {
            level,
            objective,
            tokens: self.state.tokens,
            completed: false,
            boss: self.levels.level(level).map(|l| l.boss).unwrap_or(false),
            reward: None,
            xp: None,
            effects: Default::default(),
            shop: None,
            next_level: None,
            before: snapshot.clone(),
            after: snapshot,
        }));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SPIN
    // ═══════════════════════════════════════════════════════════════════════

    /// One spin; returns the number of matches
    fn spin(&mut self, level: LevelId, index: u32) -> SlotResult<usize> {
        let config = self.config;
        let rules = &config.rules;
        let before = self.state.snapshot();
        let working = apply_modifiers(&self.state);

        let grid = self.generator.generate(
            &working.symbol_weights,
            working.chance(),
            working.wild_symbols,
            &mut self.rng,
        )?;

        let ctx = DetectionContext {
            symbol_values: &working.symbol_values,
            symbol_multipliers: &working.symbol_multipliers,
            pattern_multipliers: &working.pattern_multipliers,
            wild_symbol: self.generator.wild_symbol(),
        };
        let combos = self.combo_detector.detect(&grid, &rules.combos, &ctx);
        // A jackpot consumes the whole grid for this spin
        let connections = if combos.iter().any(|m| m.pattern_id.is_jackpot()) {
            Vec::new()
        } else {
            self.connection_detector.detect(&grid, &rules.connections, &ctx)
        };
        let jackpot = combos.iter().chain(connections.iter()).any(|m| m.pattern_id.is_jackpot());

        let matches: Vec<MatchedPattern> = combos.iter().chain(connections.iter()).cloned().collect();
        let base_gain = token_gain(&matches, working.permanent_multiplier);
        let multiplier = detection_multiplier(&working, &matches);
        let gain = (base_gain as f64 * multiplier).floor().max(0.0) as u64;

        self.state.tokens += gain;

        let outcome = SpinOutcome {
            index,
            jackpot,
            grid,
            combos,
            connections,
            base_gain,
            detection_multiplier: multiplier,
            token_gain: gain,
            chance: working.chance(),
            wild_symbols: working.wild_symbols,
        };
        self.stats.record_spin(&outcome);
        self.history.push(HistoryRecord::Spin(SpinRecord {
            level,
            before,
            outcome,
            after: self.state.snapshot(),
        }));

        Ok(matches.len())
    }

    fn finish(self) -> SimulationResult {
        let success = self.phase == EngineState::RunComplete;
        let completed_fully = success && self.last_objective.is_none_or(|o| self.state.tokens >= o);

        SimulationResult {
            success,
            completed_fully,
            final_tokens: self.state.tokens,
            final_dollars: self.state.dollars,
            final_player_level: self.state.player_level,
            final_xp: self.state.xp,
            final_level: self.state.level,
            failed_level: self.failed_level,
            history: self.history,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameRules;
    use crate::effects::{EffectEntry, EffectKind, EquippedBonus, ModifierDefinition};
    use crate::level::LevelConfig;
    use crate::patterns::{PatternDefinition, PatternId};
    use crate::shop::{Rarity, ShopConfig, ShopPolicy};
    use crate::symbols::SymbolSpec;

    /// One symbol, trivial objectives: every spin is a jackpot
    fn easy_config() -> SimulationConfig {
        let rules = GameRules {
            combos: vec![PatternDefinition::new("jackpot", 0, 5.0)],
            connections: Vec::new(),
            levels: vec![
                LevelConfig::new(LevelId::new(1, 1), 10.0, 3),
                LevelConfig::new(LevelId::new(1, 2), 10.0, 3).boss(),
            ],
            stages_per_world: 2,
            spins_per_level: 2,
            shop: ShopConfig {
                policy: ShopPolicy::Skip,
                ..ShopConfig::default()
            },
            ..GameRules::default()
        };
        SimulationConfig::default()
            .with_symbols(vec![SymbolSpec::new("P", 1.0, 10.0)])
            .with_levels(LevelId::new(1, 1), LevelId::new(2, 1))
            .with_rules(rules)
            .with_seed(11)
    }

    #[test]
    fn test_easy_run_succeeds() {
        let config = easy_config();
        let result = SimulationEngine::new(&config).run().unwrap();

        assert!(result.success);
        assert!(result.completed_fully);
        assert_eq!(result.final_level, LevelId::new(2, 1));
        assert_eq!(result.stats.levels_completed, 2);
        assert_eq!(result.stats.spins, 4);
        assert_eq!(result.stats.jackpots, 4);
        // 4 spins × 50, boss consumes 10
        assert_eq!(result.final_tokens, 190);
        assert_eq!(result.history.len(), 6);
    }

    #[test]
    fn test_history_snapshots_chain() {
        let config = easy_config();
        let result = SimulationEngine::new(&config).run().unwrap();

        let mut previous: Option<&crate::state::StateSnapshot> = None;
        for record in &result.history {
            let (before, after) = match record {
                HistoryRecord::Spin(r) => (&r.before, &r.after),
                HistoryRecord::LevelEnd(r) => (&r.before, &r.after),
            };
            if let Some(prev) = previous {
                assert_eq!(prev, before);
            }
            previous = Some(after);
        }
    }

    #[test]
    fn test_jackpot_skips_connections_under_default_rules() {
        let mut config = SimulationConfig::default()
            .with_symbols(vec![SymbolSpec::new("P", 1.0, 10.0)])
            .with_levels(LevelId::new(1, 1), LevelId::new(1, 2))
            .with_seed(4);
        config.rules.shop.policy = ShopPolicy::Skip;
        assert!(!config.rules.connections.is_empty());

        let result = SimulationEngine::new(&config).run().unwrap();
        assert!(result.stats.spins > 0);
        for record in &result.history {
            if let HistoryRecord::Spin(r) = record {
                assert!(r.outcome.jackpot);
                assert_eq!(r.outcome.combos.len(), 1);
                assert!(r.outcome.connections.is_empty());
                assert_eq!(r.outcome.base_gain, 50);
            }
        }
    }

    #[test]
    fn test_boss_consumption_leaves_run_incomplete() {
        let mut config = easy_config();
        config.rules.levels = vec![LevelConfig::new(LevelId::new(1, 1), 60.0, 3).boss()];
        let config = config.with_levels(LevelId::new(1, 1), LevelId::new(1, 2));
        let result = SimulationEngine::new(&config).run().unwrap();

        // 2 × 50 gained, boss takes 60
        assert!(result.success);
        assert!(!result.completed_fully);
        assert_eq!(result.final_tokens, 40);
        assert_eq!(result.final_level, LevelId::new(1, 2));
    }

    #[test]
    fn test_unreachable_objective_fails() {
        let mut config = easy_config();
        config.rules.levels[0].base_objective = 1_000_000.0;
        let result = SimulationEngine::new(&config).run().unwrap();

        assert!(!result.success);
        assert!(!result.completed_fully);
        assert_eq!(result.failed_level, Some(LevelId::new(1, 1)));
        match result.history.last() {
            Some(HistoryRecord::LevelEnd(r)) => assert!(!r.completed),
            other => panic!("expected level end, got {other:?}"),
        }
    }

    #[test]
    fn test_start_at_end_plays_nothing() {
        let config = easy_config().with_levels(LevelId::new(2, 1), LevelId::new(2, 1));
        let result = SimulationEngine::new(&config).run().unwrap();
        assert!(result.success);
        assert!(result.completed_fully);
        assert!(result.history.is_empty());
    }

    #[test]
    fn test_cancel_stops_run() {
        let config = easy_config();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = SimulationEngine::new(&config).with_cancel(cancel).run();
        assert!(matches!(result, Err(SlotError::Cancelled)));
    }

    #[test]
    fn test_seeded_runs_match() {
        let config = SimulationConfig::default().with_seed(99);
        let a = SimulationEngine::new(&config).run().unwrap();
        let b = SimulationEngine::new(&config).run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extra_spins_and_starting_bonus() {
        let bonus = EquippedBonus::new(
            ModifierDefinition::new("marathon", Rarity::Common)
                .with_effect(EffectEntry::new(EffectKind::ExtraSpins, 3.0)),
            1,
        );
        let config = easy_config().with_starting_bonus(bonus);
        let result = SimulationEngine::new(&config).run().unwrap();
        assert_eq!(result.stats.spins, 10);
    }

    #[test]
    fn test_initial_state_clamps_chance_and_seeds_multipliers() {
        let mut config = easy_config();
        config.character.starting_chance = 150.0;
        config.character.bonus_dollars = 6;
        let state = initial_state(&config);
        assert_eq!(state.chance(), crate::state::MAX_CHANCE);
        assert_eq!(state.dollars, 10);
        assert_eq!(state.pattern_multipliers[&PatternId::from("jackpot")], 5.0);
    }
}
