//! Simulation configuration
//!
//! Everything a run needs arrives here as already-resolved data. Configs can
//! be built in code (`Default` + `with_*` builders) or parsed from JSON/YAML
//! text; parsing always runs [`SimulationConfig::validate`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::effects::{EquippedBonus, ModifierDefinition};
use crate::error::{SlotError, SlotResult};
use crate::level::{LevelConfig, LevelId, standard_levels};
use crate::patterns::{PatternDefinition, PatternMultipliers, standard_combos, standard_connections};
use crate::shop::{ShopConfig, standard_jokers};
use crate::symbols::{DEFAULT_WILD_SYMBOL, Symbol, SymbolSpec, standard_symbols};

/// Sanity limits checked by `validate`
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    pub max_symbols: usize,
    pub max_patterns: usize,
    pub max_spins_per_level: u32,
    pub max_iterations: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_symbols: 64,
            max_patterns: 128,
            max_spins_per_level: 10_000,
            max_iterations: 10_000_000,
        }
    }
}

/// Starting stats of the played character
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub name: String,
    /// Clamped to the chance ceiling when the run starts
    pub starting_chance: f64,
    pub starting_wilds: u32,
    pub permanent_multiplier: f64,
    /// Added to the configured starting dollars
    pub bonus_dollars: u64,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            name: "Drifter".to_string(),
            starting_chance: 0.0,
            starting_wilds: 0,
            permanent_multiplier: 0.0,
            bonus_dollars: 0,
        }
    }
}

/// Game tables shared by every run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub combos: Vec<PatternDefinition>,
    pub connections: Vec<PatternDefinition>,
    pub levels: Vec<LevelConfig>,
    /// Used to derive the next level past the end of the table
    pub stages_per_world: u32,
    pub ascension_objective_multiplier: f64,
    pub spins_per_level: u32,
    pub wild_symbol: Symbol,
    pub shop: ShopConfig,
    /// Transform targets for bonuses
    pub bonus_catalog: Vec<ModifierDefinition>,
    /// Shop stock
    pub joker_catalog: Vec<ModifierDefinition>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            combos: standard_combos(),
            connections: standard_connections(),
            levels: standard_levels(),
            stages_per_world: 3,
            ascension_objective_multiplier: 0.25,
            spins_per_level: 7,
            wild_symbol: Symbol::from(DEFAULT_WILD_SYMBOL),
            shop: ShopConfig::default(),
            bonus_catalog: Vec::new(),
            joker_catalog: standard_jokers(),
        }
    }
}

/// Input of one simulation (or one batch)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub character: CharacterConfig,
    pub starting_bonus: Option<EquippedBonus>,
    pub symbols: Vec<SymbolSpec>,
    /// Overrides of pattern base multipliers
    pub pattern_multipliers: PatternMultipliers,
    pub ascension: u32,
    pub start_level: LevelId,
    /// Exclusive: the run ends once this level is reached
    pub end_level: LevelId,
    pub starting_dollars: u64,
    pub iterations: usize,
    /// Fixed seed; `None` draws from OS entropy
    pub seed: Option<u64>,
    pub rules: GameRules,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            character: CharacterConfig::default(),
            starting_bonus: None,
            symbols: standard_symbols(),
            pattern_multipliers: PatternMultipliers::new(),
            ascension: 0,
            start_level: LevelId::new(1, 1),
            end_level: LevelId::new(4, 1),
            starting_dollars: 4,
            iterations: 100,
            seed: None,
            rules: GameRules::default(),
        }
    }
}

/// On-disk config encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate JSON
    pub fn from_json_str(json: &str) -> SlotResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> SlotResult<Self> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse text in the given format
    pub fn parse(text: &str, format: ConfigFormat) -> SlotResult<Self> {
        match format {
            ConfigFormat::Json => Self::from_json_str(text),
            ConfigFormat::Yaml => Self::from_yaml_str(text),
        }
    }

    pub fn to_json(&self) -> SlotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder: fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder: ascension tier
    pub fn with_ascension(mut self, ascension: u32) -> Self {
        self.ascension = ascension;
        self
    }

    /// Builder: start and (exclusive) end level
    pub fn with_levels(mut self, start: LevelId, end: LevelId) -> Self {
        self.start_level = start;
        self.end_level = end;
        self
    }

    /// Builder: starting bonus
    pub fn with_starting_bonus(mut self, bonus: EquippedBonus) -> Self {
        self.starting_bonus = Some(bonus);
        self
    }

    /// Builder: character
    pub fn with_character(mut self, character: CharacterConfig) -> Self {
        self.character = character;
        self
    }

    /// Builder: symbol table
    pub fn with_symbols(mut self, symbols: Vec<SymbolSpec>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Builder: batch size
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder: game tables
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    /// Validate with default limits
    pub fn validate(&self) -> SlotResult<()> {
        self.validate_with(&ConfigLimits::default())
    }

    /// Reject configs the engine cannot run
    pub fn validate_with(&self, limits: &ConfigLimits) -> SlotResult<()> {
        if self.symbols.is_empty() {
            return Err(SlotError::Config("symbol table is empty".into()));
        }
        if self.symbols.len() > limits.max_symbols {
            return Err(SlotError::Config(format!(
                "too many symbols: {} > {}",
                self.symbols.len(),
                limits.max_symbols
            )));
        }
        for spec in &self.symbols {
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(SlotError::InvalidWeight {
                    key: spec.id.to_string(),
                    weight: spec.weight,
                });
            }
            if !spec.value.is_finite() || !spec.multiplier.is_finite() {
                return Err(SlotError::Config(format!("symbol {} has a non-finite value", spec.id)));
            }
        }
        if !self.symbols.iter().any(|s| s.weight > 0.0) {
            return Err(SlotError::EmptyWeightDistribution);
        }

        let rules = &self.rules;
        check_patterns("combos", &rules.combos, limits)?;
        check_patterns("connections", &rules.connections, limits)?;

        if rules.spins_per_level == 0 || rules.spins_per_level > limits.max_spins_per_level {
            return Err(SlotError::Config(format!(
                "spins_per_level must be in 1..={}, got {}",
                limits.max_spins_per_level, rules.spins_per_level
            )));
        }
        if self.iterations > limits.max_iterations {
            return Err(SlotError::Config(format!(
                "too many iterations: {} > {}",
                self.iterations, limits.max_iterations
            )));
        }
        if !rules.ascension_objective_multiplier.is_finite() || rules.ascension_objective_multiplier < 0.0 {
            return Err(SlotError::Config("ascension_objective_multiplier must be >= 0".into()));
        }

        if !self.start_level.has_reached(&self.end_level) {
            rules
                .levels
                .iter()
                .find(|l| l.id == self.start_level)
                .ok_or(SlotError::UnknownLevel(self.start_level))?;
        }

        Ok(())
    }
}

fn check_patterns(table: &str, definitions: &[PatternDefinition], limits: &ConfigLimits) -> SlotResult<()> {
    if definitions.len() > limits.max_patterns {
        return Err(SlotError::Config(format!(
            "too many {table}: {} > {}",
            definitions.len(),
            limits.max_patterns
        )));
    }
    let mut seen = HashSet::new();
    for def in definitions {
        if !seen.insert(def.id.as_str().to_ascii_lowercase()) {
            return Err(SlotError::Config(format!("duplicate pattern id '{}' in {table}", def.id)));
        }
        if !def.base_multiplier.is_finite() {
            return Err(SlotError::Config(format!("pattern {} has a non-finite multiplier", def.id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectKind, EquippedBonus};

    #[test]
    fn test_default_config_is_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let json = r#"{
            "ascension": 2,
            "start_level": "1-2",
            "end_level": "2-1",
            "seed": 7,
            "symbols": [
                {"id": "A", "weight": 3, "value": 2},
                {"id": "B", "weight": 1, "value": 5, "multiplier": 2}
            ]
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();
        assert_eq!(config.ascension, 2);
        assert_eq!(config.start_level, LevelId::new(1, 2));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.symbols[1].multiplier, 2.0);
        assert_eq!(config.symbols[0].multiplier, 1.0);
        assert_eq!(config.rules.spins_per_level, 7);
    }

    #[test]
    fn test_yaml_with_bonus() {
        let yaml = r#"
start_level: "1-1"
end_level: "1-3"
starting_bonus:
  level: 2
  definition:
    id: lucky
    rarity: rare
    effects:
      - kind: chance_increase
        base_value: 5
        scaling_per_level: 2
"#;
        let config = SimulationConfig::from_yaml_str(yaml).unwrap();
        let bonus = config.starting_bonus.unwrap();
        assert_eq!(bonus.level, 2);
        assert_eq!(bonus.definition.effects[0].kind, EffectKind::ChanceIncrease);
        assert_eq!(bonus.definition.effects[0].value_at(bonus.level), 7.0);
    }

    #[test]
    fn test_unknown_effect_kind_is_config_error() {
        let json = r#"{"starting_bonus": {"definition": {"id": "x", "effects": [{"kind": "warp"}]}}}"#;
        assert!(matches!(SimulationConfig::from_json_str(json), Err(SlotError::Config(_))));
    }

    #[test]
    fn test_validation_failures() {
        let zero = SimulationConfig::default().with_symbols(vec![SymbolSpec::new("A", 0.0, 1.0)]);
        assert!(matches!(zero.validate(), Err(SlotError::EmptyWeightDistribution)));

        let negative = SimulationConfig::default().with_symbols(vec![SymbolSpec::new("A", -1.0, 1.0)]);
        assert!(matches!(negative.validate(), Err(SlotError::InvalidWeight { .. })));

        let unknown = SimulationConfig::default().with_levels(LevelId::new(9, 1), LevelId::new(10, 1));
        assert!(matches!(unknown.validate(), Err(SlotError::UnknownLevel(_))));

        let mut dup = SimulationConfig::default();
        dup.rules.combos.push(PatternDefinition::new("EYE", 20, 1.0));
        assert!(matches!(dup.validate(), Err(SlotError::Config(_))));

        let mut no_spins = SimulationConfig::default();
        no_spins.rules.spins_per_level = 0;
        assert!(no_spins.validate().is_err());
    }

    #[test]
    fn test_empty_range_skips_level_lookup() {
        let config = SimulationConfig::default().with_levels(LevelId::new(9, 1), LevelId::new(2, 1));
        config.validate().unwrap();
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("run.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("run.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("run.toml")), None);
    }

    #[test]
    fn test_builders() {
        let bonus = EquippedBonus::new(ModifierDefinition::new("b", Default::default()), 1);
        let config = SimulationConfig::new()
            .with_seed(3)
            .with_ascension(4)
            .with_iterations(10)
            .with_starting_bonus(bonus);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.ascension, 4);
        assert_eq!(config.iterations, 10);
        assert!(config.starting_bonus.is_some());
    }
}
