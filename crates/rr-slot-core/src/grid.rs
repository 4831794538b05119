//! Symbol grid and procedural grid generation

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::probability::{sample_distinct, weighted_pick};
use crate::symbols::{Symbol, SymbolMap};

/// Number of grid rows
pub const GRID_ROWS: usize = 3;
/// Number of grid columns
pub const GRID_COLS: usize = 5;
/// Total cells per grid
pub const GRID_CELLS: usize = GRID_ROWS * GRID_COLS;

/// Chance at or above which the generator produces a single-symbol grid
pub const JACKPOT_CHANCE_THRESHOLD: f64 = 90.0;

/// Per-occurrence correlation factor applied on top of chance
const CORRELATION_FACTOR: f64 = 0.5;

/// A grid cell address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Inside the 3×5 grid
    pub fn is_valid(&self) -> bool {
        self.row < GRID_ROWS && self.col < GRID_COLS
    }

    /// Row-major cell index
    pub fn index(&self) -> usize {
        self.row * GRID_COLS + self.col
    }

    /// All grid positions in row-major order
    pub fn all() -> Vec<Position> {
        (0..GRID_ROWS)
            .flat_map(|row| (0..GRID_COLS).map(move |col| Position::new(row, col)))
            .collect()
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

/// One concrete instantiation of a winning pattern
pub type Shape = Vec<Position>;

/// Fixed-size symbol grid, stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Vec<Symbol>,
}

impl Grid {
    /// Build a grid from rows. Anything other than exactly 3×5 is rejected.
    pub fn from_rows(rows: Vec<Vec<Symbol>>) -> SlotResult<Self> {
        let actual: usize = rows.iter().map(Vec::len).sum();
        if rows.len() != GRID_ROWS || rows.iter().any(|r| r.len() != GRID_COLS) {
            return Err(SlotError::InvalidGrid {
                expected: GRID_CELLS,
                actual,
            });
        }
        Ok(Self {
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Convenience constructor from string slices
    pub fn from_strs(rows: &[&[&str]]) -> SlotResult<Self> {
        Self::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|s| Symbol::from(*s)).collect())
                .collect(),
        )
    }

    /// Grid with every cell holding the same symbol
    pub fn filled(symbol: Symbol) -> Self {
        Self {
            cells: vec![symbol; GRID_CELLS],
        }
    }

    /// Symbol at a position (None when out of bounds)
    pub fn get(&self, pos: Position) -> Option<&Symbol> {
        if pos.is_valid() {
            self.cells.get(pos.index())
        } else {
            None
        }
    }

    /// Overwrite a cell. Out-of-bounds positions are ignored.
    pub fn set(&mut self, pos: Position, symbol: Symbol) {
        if pos.is_valid() {
            self.cells[pos.index()] = symbol;
        }
    }

    /// Every cell holds the same symbol
    pub fn is_jackpot(&self) -> bool {
        self.cells.windows(2).all(|w| w[0] == w[1])
    }

    /// Number of cells holding `symbol`
    pub fn count(&self, symbol: &Symbol) -> usize {
        self.cells.iter().filter(|s| *s == symbol).count()
    }

    /// Rows as nested vectors
    pub fn rows(&self) -> Vec<Vec<Symbol>> {
        self.cells.chunks(GRID_COLS).map(<[Symbol]>::to_vec).collect()
    }

    /// Cells in row-major order
    pub fn cells(&self) -> &[Symbol] {
        &self.cells
    }
}

/// Produces grids from symbol weights, chance and wild count
#[derive(Debug, Clone)]
pub struct GridGenerator {
    wild_symbol: Symbol,
}

impl GridGenerator {
    /// Create a generator that overlays `wild_symbol`
    pub fn new(wild_symbol: Symbol) -> Self {
        Self { wild_symbol }
    }

    /// Wild symbol used for the overlay
    pub fn wild_symbol(&self) -> &Symbol {
        &self.wild_symbol
    }

    /// Generate one grid.
    ///
    /// At or above the jackpot threshold the whole grid is one weighted pick.
    /// Below it, cells are filled row-major and symbols already present are
    /// boosted by `1 + chance/100 × occurrences × 0.5`, so draws are streaky
    /// rather than independent.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        weights: &SymbolMap,
        chance: f64,
        wild_count: u32,
        rng: &mut R,
    ) -> SlotResult<Grid> {
        let mut grid = if chance >= JACKPOT_CHANCE_THRESHOLD {
            let symbol = weighted_pick(weights, rng)?;
            log::trace!("Jackpot grid of {symbol} (chance {chance})");
            Grid::filled(symbol)
        } else {
            self.fill_correlated(weights, chance, rng)?
        };

        if wild_count > 0 {
            self.overlay_wilds(&mut grid, wild_count as usize, rng);
        }

        Ok(grid)
    }

    fn fill_correlated<R: Rng + ?Sized>(
        &self,
        weights: &SymbolMap,
        chance: f64,
        rng: &mut R,
    ) -> SlotResult<Grid> {
        let chance_factor = chance.max(0.0) / 100.0;
        let mut cells: Vec<Symbol> = Vec::with_capacity(GRID_CELLS);

        for _ in 0..GRID_CELLS {
            let boosted: SymbolMap = weights
                .iter()
                .map(|(symbol, &weight)| {
                    let occurrences = cells.iter().filter(|s| *s == symbol).count() as f64;
                    let boost = 1.0 + chance_factor * occurrences * CORRELATION_FACTOR;
                    (symbol.clone(), weight * boost)
                })
                .collect();
            cells.push(weighted_pick(&boosted, rng)?);
        }

        Ok(Grid { cells })
    }

    fn overlay_wilds<R: Rng + ?Sized>(&self, grid: &mut Grid, count: usize, rng: &mut R) {
        for pos in sample_distinct(&Position::all(), count, rng) {
            grid.set(pos, self.wild_symbol.clone());
        }
    }
}
