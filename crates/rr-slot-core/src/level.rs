//! Level objectives, rewards and progression order

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::gains::calculate_interest;

/// Base XP granted for clearing a level in world 1
pub const BASE_LEVEL_XP: f64 = 50.0;
/// XP reward growth per world
pub const LEVEL_XP_GROWTH: f64 = 1.1;

/// Level address: world and stage, ordered lexicographically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LevelId {
    pub world: u32,
    pub stage: u32,
}

impl LevelId {
    pub const fn new(world: u32, stage: u32) -> Self {
        Self { world, stage }
    }

    /// `self` is at or beyond `target`: a later world, or the same world at
    /// an equal or later stage
    pub fn has_reached(&self, target: &LevelId) -> bool {
        self.world > target.world || (self.world == target.world && self.stage >= target.stage)
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.world, self.stage)
    }
}

impl FromStr for LevelId {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (world, stage) = s
            .split_once('-')
            .ok_or_else(|| SlotError::Config(format!("level id '{s}' is not 'world-stage'")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| SlotError::Config(format!("level id '{s}' is not 'world-stage'")))
        };
        Ok(Self::new(parse(world)?, parse(stage)?))
    }
}

impl TryFrom<String> for LevelId {
    type Error = SlotError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LevelId> for String {
    fn from(id: LevelId) -> Self {
        id.to_string()
    }
}

/// One row of the level table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: LevelId,
    /// Token objective before ascension scaling
    pub base_objective: f64,
    /// Flat dollars paid on completion
    #[serde(default)]
    pub dollar_reward: u64,
    /// Boss levels consume the objective from the token pool
    #[serde(default)]
    pub boss: bool,
}

impl LevelConfig {
    pub fn new(id: LevelId, base_objective: f64, dollar_reward: u64) -> Self {
        Self {
            id,
            base_objective,
            dollar_reward,
            boss: false,
        }
    }

    /// Builder: mark as boss level
    pub fn boss(mut self) -> Self {
        self.boss = true;
        self
    }
}

/// Rewards for a completed level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReward {
    pub dollars: u64,
    pub interest: u64,
    pub xp: u64,
}

/// Level table lookups and reward formulas
#[derive(Debug, Clone)]
pub struct LevelManager {
    levels: Vec<LevelConfig>,
    ascension_objective_multiplier: f64,
    stages_per_world: u32,
}

impl LevelManager {
    /// Build from a level table; rows are sorted by id
    pub fn new(mut levels: Vec<LevelConfig>, ascension_objective_multiplier: f64, stages_per_world: u32) -> Self {
        levels.sort_by_key(|l| l.id);
        Self {
            levels,
            ascension_objective_multiplier,
            stages_per_world: stages_per_world.max(1),
        }
    }

    /// Table row for a level. Missing rows are fatal.
    pub fn level(&self, id: LevelId) -> SlotResult<&LevelConfig> {
        self.levels
            .iter()
            .find(|l| l.id == id)
            .ok_or(SlotError::UnknownLevel(id))
    }

    /// `floor(base × (1 + ascension × multiplier))`
    pub fn objective(&self, id: LevelId, ascension: u32) -> SlotResult<u64> {
        let level = self.level(id)?;
        let scale = 1.0 + ascension as f64 * self.ascension_objective_multiplier;
        Ok((level.base_objective * scale).floor().max(0.0) as u64)
    }

    /// Next table row after `id`, or the arithmetic successor past the table end
    pub fn next_level(&self, id: LevelId) -> LevelId {
        if let Some(next) = self.levels.iter().find(|l| l.id > id) {
            return next.id;
        }
        if id.stage >= self.stages_per_world {
            LevelId::new(id.world + 1, 1)
        } else {
            LevelId::new(id.world, id.stage + 1)
        }
    }

    /// Dollar reward plus interest on current dollars, and world-scaled XP
    pub fn reward(&self, id: LevelId, dollars: u64) -> SlotResult<LevelReward> {
        let level = self.level(id)?;
        Ok(LevelReward {
            dollars: level.dollar_reward,
            interest: calculate_interest(dollars),
            xp: xp_reward(id.world),
        })
    }

    /// All rows in order
    pub fn levels(&self) -> &[LevelConfig] {
        &self.levels
    }
}

/// `floor(50 × 1.1^(world − 1))`
pub fn xp_reward(world: u32) -> u64 {
    let exponent = world.saturating_sub(1) as i32;
    (BASE_LEVEL_XP * LEVEL_XP_GROWTH.powi(exponent)).floor() as u64
}

/// Tokens carried past a level: bosses consume the objective, others keep all
pub fn tokens_after_level(tokens: u64, objective: u64, boss: bool) -> u64 {
    if boss {
        tokens.saturating_sub(objective)
    } else {
        tokens
    }
}

/// Default three-world table, a boss closing each world
pub fn standard_levels() -> Vec<LevelConfig> {
    let mut levels = Vec::new();
    for world in 1..=3u32 {
        let scale = world as f64;
        levels.push(LevelConfig::new(LevelId::new(world, 1), 40.0 * scale, 4));
        levels.push(LevelConfig::new(LevelId::new(world, 2), 70.0 * scale, 5));
        levels.push(LevelConfig::new(LevelId::new(world, 3), 100.0 * scale, 8).boss());
    }
    levels
}
