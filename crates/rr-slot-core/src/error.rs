//! Error types for the slot core

use thiserror::Error;

use crate::level::LevelId;

/// Slot core errors
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Weighted sampling over an empty or all-zero distribution")]
    EmptyWeightDistribution,

    #[error("Invalid weight {weight} for '{key}'")]
    InvalidWeight { key: String, weight: f64 },

    #[error("Invalid grid: expected {expected} cells, got {actual}")]
    InvalidGrid { expected: usize, actual: usize },

    #[error("Unknown level: {0}")]
    UnknownLevel(LevelId),

    #[error("No shop rarity weights configured for world {0} or below")]
    MissingShopWeights(u32),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Simulation cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for SlotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<serde_yml::Error> for SlotError {
    fn from(e: serde_yml::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type for slot core operations
pub type SlotResult<T> = Result<T, SlotError>;
