//! Per-pass cell occupancy tracking

use crate::grid::{GRID_CELLS, Position};

/// Boolean occupancy grid. Every cell starts available; a cell becomes
/// unavailable once it takes part in a matched shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityGrid {
    available: [bool; GRID_CELLS],
}

impl AvailabilityGrid {
    pub fn new() -> Self {
        Self {
            available: [true; GRID_CELLS],
        }
    }

    /// True when every position is inside the grid and still unclaimed
    pub fn are_positions_available(&self, positions: &[Position]) -> bool {
        positions
            .iter()
            .all(|p| p.is_valid() && self.available[p.index()])
    }

    /// Claim positions. Out-of-bounds positions are ignored.
    pub fn mark_positions_as_used(&mut self, positions: &[Position]) {
        for p in positions.iter().filter(|p| p.is_valid()) {
            self.available[p.index()] = false;
        }
    }

    /// Number of unclaimed cells
    pub fn available_count(&self) -> usize {
        self.available.iter().filter(|a| **a).count()
    }

    /// Make every cell available again
    pub fn reset(&mut self) {
        self.available = [true; GRID_CELLS];
    }
}

impl Default for AvailabilityGrid {
    fn default() -> Self {
        Self::new()
    }
}
