//! Symbol identifiers and per-symbol tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default identifier of the wild symbol
pub const DEFAULT_WILD_SYMBOL: &str = "WILD";

/// Symbol identifier (e.g. "CHERRY", "SEVEN", "WILD")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbol → number table (weights, values, multipliers)
pub type SymbolMap = BTreeMap<Symbol, f64>;

/// One row of the symbol configuration table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Symbol ID
    pub id: Symbol,
    /// Relative spawn weight
    pub weight: f64,
    /// Token value when anchoring a matched pattern
    pub value: f64,
    /// Value multiplier
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

impl SymbolSpec {
    /// Create a symbol row with multiplier 1.0
    pub fn new(id: impl Into<Symbol>, weight: f64, value: f64) -> Self {
        Self {
            id: id.into(),
            weight,
            value,
            multiplier: 1.0,
        }
    }
}

/// Weight, value and multiplier maps split out of a symbol table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTables {
    pub weights: SymbolMap,
    pub values: SymbolMap,
    pub multipliers: SymbolMap,
}

impl SymbolTables {
    /// Build the three maps from symbol rows. Later rows win on duplicate IDs.
    pub fn from_specs(specs: &[SymbolSpec]) -> Self {
        let mut tables = Self::default();
        for spec in specs {
            tables.weights.insert(spec.id.clone(), spec.weight);
            tables.values.insert(spec.id.clone(), spec.value);
            tables.multipliers.insert(spec.id.clone(), spec.multiplier);
        }
        tables
    }

    /// Anchor value of a symbol: base value × symbol multiplier
    pub fn effective_value(values: &SymbolMap, multipliers: &SymbolMap, symbol: &Symbol) -> f64 {
        let value = values.get(symbol).copied().unwrap_or(0.0);
        let multiplier = multipliers.get(symbol).copied().unwrap_or(1.0);
        value * multiplier
    }
}

/// A small default symbol set, highest paying first
pub fn standard_symbols() -> Vec<SymbolSpec> {
    vec![
        SymbolSpec::new("SEVEN", 3.0, 10.0),
        SymbolSpec::new("BELL", 5.0, 6.0),
        SymbolSpec::new("DIAMOND", 6.0, 5.0),
        SymbolSpec::new("CLOVER", 9.0, 3.0),
        SymbolSpec::new("LEMON", 12.0, 2.0),
        SymbolSpec::new("CHERRY", 14.0, 2.0),
        SymbolSpec::new(DEFAULT_WILD_SYMBOL, 0.0, 0.0),
    ]
}
