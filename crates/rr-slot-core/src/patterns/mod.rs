//! Winning patterns: definitions, the shape registry and the greedy detector
//!
//! The same detector serves both definition tables (combos and connections).

mod detector;
mod shapes;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::{Position, Shape};
use crate::symbols::Symbol;

pub use detector::{DetectionContext, PatternDetector};
pub use shapes::{JACKPOT_PATTERN_ID, ShapeGenerator, ShapeRegistry};

/// Unique pattern identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(pub String);

impl PatternId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the full-grid jackpot pattern (case-insensitive)
    pub fn is_jackpot(&self) -> bool {
        self.0.eq_ignore_ascii_case(JACKPOT_PATTERN_ID)
    }
}

impl From<&str> for PatternId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PatternId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pattern id → multiplier override
pub type PatternMultipliers = BTreeMap<PatternId, f64>;

/// Which definition table a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    Combo,
    Connection,
}

/// A winning-shape family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDefinition {
    /// Pattern ID; registered IDs generate their shapes from the registry
    pub id: PatternId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Lower values claim cells first
    #[serde(default)]
    pub detection_order: i32,
    /// Inactive definitions are skipped
    #[serde(default = "default_active")]
    pub active: bool,
    /// Multiplier used when no override exists
    #[serde(default = "default_base_multiplier")]
    pub base_multiplier: f64,
    /// Stored shapes for user-defined patterns
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

fn default_active() -> bool {
    true
}

fn default_base_multiplier() -> f64 {
    1.0
}

impl PatternDefinition {
    /// Create an active definition with no stored shapes
    pub fn new(id: impl Into<PatternId>, detection_order: i32, base_multiplier: f64) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            detection_order,
            active: true,
            base_multiplier,
            shapes: Vec::new(),
        }
    }

    /// Builder: attach stored shapes
    pub fn with_shapes(mut self, shapes: Vec<Shape>) -> Self {
        self.shapes = shapes;
        self
    }

    /// Builder: set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// A shape matched during one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPattern {
    pub family: PatternFamily,
    pub pattern_id: PatternId,
    pub detection_order: i32,
    pub anchor: Symbol,
    pub positions: Vec<Position>,
    pub multiplier: f64,
    pub token_yield: u64,
}

/// Default combo table: longer lines after shorter ones, jackpot first
pub fn standard_combos() -> Vec<PatternDefinition> {
    vec![
        PatternDefinition::new(JACKPOT_PATTERN_ID, 0, 5.0).with_name("Jackpot"),
        PatternDefinition::new("eye", 1, 8.0).with_name("Eye"),
        PatternDefinition::new("horizontal_5", 2, 3.0).with_name("Horizontal 5"),
        PatternDefinition::new("zig", 3, 4.0).with_name("Zig"),
        PatternDefinition::new("zag", 4, 4.0).with_name("Zag"),
        PatternDefinition::new("cross", 5, 3.0).with_name("Cross"),
        PatternDefinition::new("horizontal_4", 6, 2.0).with_name("Horizontal 4"),
        PatternDefinition::new("triangle", 7, 2.0).with_name("Triangle"),
        PatternDefinition::new("l_shape", 8, 2.0).with_name("L"),
        PatternDefinition::new("horizontal_3", 9, 1.0).with_name("Horizontal 3"),
        PatternDefinition::new("vertical_3", 10, 1.0).with_name("Vertical 3"),
        PatternDefinition::new("diagonal", 11, 1.0).with_name("Diagonal"),
    ]
}

/// Default connection table, built from stored shapes
pub fn standard_connections() -> Vec<PatternDefinition> {
    let p = Position::new;
    vec![
        PatternDefinition::new("corners", 0, 2.0)
            .with_name("Corners")
            .with_shapes(vec![vec![p(0, 0), p(0, 4), p(2, 0), p(2, 4)]]),
        PatternDefinition::new("diamond", 1, 1.5)
            .with_name("Diamond")
            .with_shapes(vec![
                vec![p(0, 1), p(1, 0), p(1, 2), p(2, 1)],
                vec![p(0, 3), p(1, 2), p(1, 4), p(2, 3)],
            ]),
    ]
}
