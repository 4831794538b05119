//! Shape registry: pattern id → candidate shape generator

use std::collections::HashMap;

use crate::grid::{GRID_COLS, GRID_ROWS, Position, Shape};

/// ID of the full-grid pattern that short-circuits detection
pub const JACKPOT_PATTERN_ID: &str = "jackpot";

/// Produces every candidate shape of a family, in enumeration order
pub type ShapeGenerator = fn() -> Vec<Shape>;

/// Central registry of built-in geometric families.
///
/// Definitions whose id is not registered fall back to their stored shapes.
///
/// ```rust,ignore
/// let registry = ShapeRegistry::with_builtins();
/// let windows = registry.shapes_for("horizontal_3").unwrap();
/// assert_eq!(windows.len(), 9);
/// ```
#[derive(Clone)]
pub struct ShapeRegistry {
    generators: HashMap<String, ShapeGenerator>,
}

impl ShapeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Registry with every built-in family
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("horizontal_3", || horizontal(3));
        registry.register("horizontal_4", || horizontal(4));
        registry.register("horizontal_5", || horizontal(5));
        registry.register("vertical_3", vertical_3);
        registry.register("diagonal", diagonal);
        registry.register("triangle", triangle);
        registry.register("l_shape", l_shape);
        registry.register("cross", cross);
        registry.register("eye", eye);
        registry.register("zig", zig);
        registry.register("zag", zag);
        registry.register(JACKPOT_PATTERN_ID, jackpot);
        registry
    }

    /// Register (or replace) a family. IDs are matched case-insensitively.
    pub fn register(&mut self, id: &str, generator: ShapeGenerator) {
        self.generators.insert(id.to_ascii_lowercase(), generator);
    }

    /// Check if a family is registered
    pub fn has(&self, id: &str) -> bool {
        self.generators.contains_key(&id.to_ascii_lowercase())
    }

    /// Generated shapes for a registered family
    pub fn shapes_for(&self, id: &str) -> Option<Vec<Shape>> {
        self.generators.get(&id.to_ascii_lowercase()).map(|g| g())
    }

    /// Number of registered families
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Registered IDs, sorted
    pub fn list_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("families", &self.list_ids())
            .finish()
    }
}

fn p(row: usize, col: usize) -> Position {
    Position::new(row, col)
}

/// Horizontal windows of `len`, row by row, left to right
fn horizontal(len: usize) -> Vec<Shape> {
    if len == 0 || len > GRID_COLS {
        return Vec::new();
    }
    (0..GRID_ROWS)
        .flat_map(|row| {
            (0..=GRID_COLS - len).map(move |start| (start..start + len).map(|col| p(row, col)).collect::<Shape>())
        })
        .collect()
}

/// Full columns
fn vertical_3() -> Vec<Shape> {
    (0..GRID_COLS)
        .map(|col| (0..GRID_ROWS).map(|row| p(row, col)).collect::<Shape>())
        .collect()
}

/// Three-long windows on both diagonal directions
fn diagonal() -> Vec<Shape> {
    let span = GRID_ROWS;
    let mut shapes: Vec<Shape> = Vec::new();
    for start in 0..=GRID_COLS - span {
        shapes.push((0..span).map(|i| p(i, start + i)).collect());
    }
    for start in 0..=GRID_COLS - span {
        shapes.push((0..span).map(|i| p(span - 1 - i, start + i)).collect());
    }
    shapes
}

/// Four-cell pyramids, pointing up then pointing down
fn triangle() -> Vec<Shape> {
    let mut shapes = Vec::new();
    for row in 0..GRID_ROWS - 1 {
        for col in 0..=GRID_COLS - 3 {
            shapes.push(vec![p(row, col + 1), p(row + 1, col), p(row + 1, col + 1), p(row + 1, col + 2)]);
        }
    }
    for row in 0..GRID_ROWS - 1 {
        for col in 0..=GRID_COLS - 3 {
            shapes.push(vec![p(row, col), p(row, col + 1), p(row, col + 2), p(row + 1, col + 1)]);
        }
    }
    shapes
}

/// Full column plus a foot on the bottom row, both mirrors
fn l_shape() -> Vec<Shape> {
    let bottom = GRID_ROWS - 1;
    let mut shapes = Vec::new();
    for col in 0..GRID_COLS - 1 {
        let mut right_foot: Shape = (0..GRID_ROWS).map(|row| p(row, col)).collect();
        right_foot.push(p(bottom, col + 1));
        shapes.push(right_foot);

        let mut left_foot: Shape = (0..GRID_ROWS).map(|row| p(row, col + 1)).collect();
        left_foot.push(p(bottom, col));
        shapes.push(left_foot);
    }
    shapes
}

/// Plus shapes centred on the middle row
fn cross() -> Vec<Shape> {
    (1..GRID_COLS - 1)
        .map(|col| vec![p(0, col), p(1, col - 1), p(1, col), p(1, col + 1), p(2, col)])
        .collect()
}

/// Eye outline with its pupil
fn eye() -> Vec<Shape> {
    vec![vec![
        p(0, 1),
        p(0, 2),
        p(0, 3),
        p(1, 0),
        p(1, 2),
        p(1, 4),
        p(2, 1),
        p(2, 2),
        p(2, 3),
    ]]
}

/// V across all five columns
fn zig() -> Vec<Shape> {
    vec![vec![p(0, 0), p(1, 1), p(2, 2), p(1, 3), p(0, 4)]]
}

/// Inverted V across all five columns
fn zag() -> Vec<Shape> {
    vec![vec![p(2, 0), p(1, 1), p(0, 2), p(1, 3), p(2, 4)]]
}

/// Every cell
fn jackpot() -> Vec<Shape> {
    vec![Position::all()]
}
