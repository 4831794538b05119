//! Append-only run history
//!
//! Records carry before/after snapshots so a consumer can replay a run step
//! by step. They serialize internally tagged: `{"type": "spin", ...}` and
//! `{"type": "level_end", ...}`.

use serde::{Deserialize, Serialize};

use crate::effects::triggers::LevelEndEffects;
use crate::gains::XpAward;
use crate::level::{LevelId, LevelReward};
use crate::shop::ShopVisit;
use crate::spin::SpinOutcome;
use crate::state::StateSnapshot;

/// One history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryRecord {
    Spin(SpinRecord),
    LevelEnd(LevelEndRecord),
}

impl HistoryRecord {
    pub fn level(&self) -> LevelId {
        match self {
            Self::Spin(r) => r.level,
            Self::LevelEnd(r) => r.level,
        }
    }

    pub fn is_spin(&self) -> bool {
        matches!(self, Self::Spin(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub level: LevelId,
    pub before: StateSnapshot,
    pub outcome: SpinOutcome,
    pub after: StateSnapshot,
}

/// Close of a level, completed or failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelEndRecord {
    pub level: LevelId,
    pub objective: u64,
    /// Tokens when the objective was checked
    pub tokens: u64,
    pub completed: bool,
    pub boss: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<LevelReward>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<XpAward>,
    #[serde(default)]
    pub effects: LevelEndEffects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<ShopVisit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_level: Option<LevelId>,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
}
