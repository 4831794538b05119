//! # rr-slot-core: ReelRun slot progression core
//!
//! Generates 3×5 symbol grids, detects non-overlapping winning shapes, folds
//! equipped bonuses and jokers into the game state, and drives the level
//! progression state machine. Pure computation: no I/O, RNG always injected.
//!
//! ## Architecture
//!
//! ```text
//! SimulationEngine
//!     │
//!     ├── apply_modifiers (bonuses, then jokers)
//!     ├── GridGenerator (weights, chance, wilds)
//!     ├── PatternDetector × 2 (combos, connections)
//!     │       └── ShapeRegistry + AvailabilityGrid
//!     ├── gains (tokens, interest, XP)
//!     ├── triggers (detection, level end, shop)
//!     └── LevelManager + ShopManager
//!           │
//!           v
//!     SimulationResult { history, stats }
//! ```
//!
//! ```rust,ignore
//! let config = SimulationConfig::default().with_seed(42);
//! let result = rr_slot_core::run(&config)?;
//! println!("{} tokens, success = {}", result.final_tokens, result.success);
//! ```

pub mod availability;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod gains;
pub mod grid;
pub mod history;
pub mod level;
pub mod patterns;
pub mod probability;
pub mod result;
pub mod shop;
pub mod spin;
pub mod state;
pub mod symbols;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use history::*;
pub use level::*;
pub use result::*;
pub use spin::*;
pub use state::*;
pub use symbols::*;

pub use availability::AvailabilityGrid;
pub use effects::{EffectEntry, EffectKind, EquippedBonus, EquippedJoker, ModifierDefinition};
pub use grid::{Grid, GridGenerator, Position};
pub use patterns::{MatchedPattern, PatternDefinition, PatternDetector, PatternFamily, PatternId};
pub use shop::{Rarity, ShopConfig, ShopManager, ShopPolicy};

/// Validate `config` and play one run
pub fn run(config: &SimulationConfig) -> SlotResult<SimulationResult> {
    config.validate()?;
    SimulationEngine::new(config).run()
}
