//! Greedy, order-dependent pattern detection
//!
//! Definitions claim cells in ascending detection order and each accepted
//! shape consumes its cells. The cover is deliberately not optimal: an early
//! small pattern can block a later, larger one.

use crate::availability::AvailabilityGrid;
use crate::grid::{Grid, Position, Shape};
use crate::symbols::{Symbol, SymbolMap, SymbolTables};

use super::{MatchedPattern, PatternDefinition, PatternFamily, PatternMultipliers, ShapeRegistry};

/// Tables the detector reads to price a match
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub symbol_values: &'a SymbolMap,
    pub symbol_multipliers: &'a SymbolMap,
    pub pattern_multipliers: &'a PatternMultipliers,
    pub wild_symbol: &'a Symbol,
}

/// Detects matches of one definition table
#[derive(Debug, Clone)]
pub struct PatternDetector {
    family: PatternFamily,
    registry: ShapeRegistry,
}

impl PatternDetector {
    /// Detector for a table, using the built-in shape registry
    pub fn new(family: PatternFamily) -> Self {
        Self::with_registry(family, ShapeRegistry::with_builtins())
    }

    /// Detector with a custom registry
    pub fn with_registry(family: PatternFamily, registry: ShapeRegistry) -> Self {
        Self { family, registry }
    }

    pub fn family(&self) -> PatternFamily {
        self.family
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Run one detection pass over `grid`.
    ///
    /// Matches come back in discovery order: definition priority first, then
    /// shape enumeration order. No cell appears in two matches.
    pub fn detect(
        &self,
        grid: &Grid,
        definitions: &[PatternDefinition],
        ctx: &DetectionContext<'_>,
    ) -> Vec<MatchedPattern> {
        let mut ordered: Vec<&PatternDefinition> = definitions.iter().filter(|d| d.active).collect();
        ordered.sort_by_key(|d| d.detection_order);

        if grid.is_jackpot() {
            if let Some(def) = ordered.iter().find(|d| d.id.is_jackpot()) {
                let anchor = grid.cells()[0].clone();
                log::debug!("{:?} jackpot short-circuit on {anchor}", self.family);
                return vec![self.build_match(def, anchor, Position::all(), ctx)];
            }
        }

        let mut availability = AvailabilityGrid::new();
        let mut matches = Vec::new();

        for def in ordered {
            for shape in self.candidate_shapes(def) {
                if !availability.are_positions_available(&shape) {
                    continue;
                }
                let Some(anchor) = resolve_anchor(grid, &shape, ctx.wild_symbol) else {
                    continue;
                };
                availability.mark_positions_as_used(&shape);
                matches.push(self.build_match(def, anchor, shape, ctx));
            }
        }

        log::trace!("{:?} pass found {} matches", self.family, matches.len());
        matches
    }

    /// Registered family shapes, else the definition's stored shapes
    fn candidate_shapes(&self, def: &PatternDefinition) -> Vec<Shape> {
        self.registry
            .shapes_for(def.id.as_str())
            .unwrap_or_else(|| def.shapes.clone())
    }

    fn build_match(
        &self,
        def: &PatternDefinition,
        anchor: Symbol,
        positions: Vec<Position>,
        ctx: &DetectionContext<'_>,
    ) -> MatchedPattern {
        let multiplier = ctx
            .pattern_multipliers
            .get(&def.id)
            .copied()
            .unwrap_or(def.base_multiplier);
        let value = SymbolTables::effective_value(ctx.symbol_values, ctx.symbol_multipliers, &anchor);
        let token_yield = (value * multiplier).floor().max(0.0) as u64;

        MatchedPattern {
            family: self.family,
            pattern_id: def.id.clone(),
            detection_order: def.detection_order,
            anchor,
            positions,
            multiplier,
            token_yield,
        }
    }
}

/// Anchor = first non-wild symbol; every other non-wild cell must equal it.
/// An all-wild shape anchors on the wild symbol. Empty or out-of-bounds
/// shapes never match.
fn resolve_anchor(grid: &Grid, shape: &[Position], wild: &Symbol) -> Option<Symbol> {
    if shape.is_empty() {
        return None;
    }

    let mut anchor: Option<&Symbol> = None;
    for &pos in shape {
        let symbol = grid.get(pos)?;
        if symbol == wild {
            continue;
        }
        match anchor {
            None => anchor = Some(symbol),
            Some(a) if a != symbol => return None,
            Some(_) => {}
        }
    }

    Some(anchor.unwrap_or(wild).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GRID_CELLS;
    use std::collections::HashSet;

    struct Tables {
        values: SymbolMap,
        multipliers: SymbolMap,
        patterns: PatternMultipliers,
        wild: Symbol,
    }

    impl Tables {
        fn new(values: &[(&str, f64)]) -> Self {
            Self {
                values: values.iter().map(|(s, v)| (Symbol::from(*s), *v)).collect(),
                multipliers: SymbolMap::new(),
                patterns: PatternMultipliers::new(),
                wild: Symbol::from("WILD"),
            }
        }

        fn ctx(&self) -> DetectionContext<'_> {
            DetectionContext {
                symbol_values: &self.values,
                symbol_multipliers: &self.multipliers,
                pattern_multipliers: &self.patterns,
                wild_symbol: &self.wild,
            }
        }
    }

    fn detector() -> PatternDetector {
        PatternDetector::new(PatternFamily::Combo)
    }

    #[test]
    fn test_single_horizontal_three() {
        let grid = Grid::from_strs(&[
            &["A", "A", "A", "B", "C"],
            &["D", "E", "F", "G", "H"],
            &["I", "J", "K", "L", "M"],
        ])
        .unwrap();
        let tables = Tables::new(&[("A", 2.0)]);
        let defs = vec![PatternDefinition::new("horizontal_3", 1, 1.0)];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].anchor, Symbol::from("A"));
        assert_eq!(
            matches[0].positions,
            vec![Position::new(0, 0), Position::new(0, 1), Position::new(0, 2)]
        );
        assert_eq!(matches[0].token_yield, 2);
    }

    #[test]
    fn test_jackpot_short_circuit() {
        let grid = Grid::filled("P".into());
        let tables = Tables::new(&[("P", 10.0)]);
        let defs = vec![
            PatternDefinition::new("horizontal_3", 0, 1.0),
            PatternDefinition::new("jackpot", 5, 5.0),
        ];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].positions.len(), GRID_CELLS);
        assert_eq!(matches[0].token_yield, 50);
    }

    #[test]
    fn test_inactive_jackpot_falls_through() {
        let grid = Grid::filled("P".into());
        let tables = Tables::new(&[("P", 1.0)]);
        let defs = vec![
            PatternDefinition::new("jackpot", 0, 5.0).with_active(false),
            PatternDefinition::new("horizontal_5", 1, 1.0),
        ];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| m.pattern_id.as_str() == "horizontal_5"));
    }

    #[test]
    fn test_cells_never_reused() {
        let grid = Grid::filled("A".into());
        let tables = Tables::new(&[("A", 1.0)]);
        let defs = vec![
            PatternDefinition::new("horizontal_3", 0, 1.0),
            PatternDefinition::new("vertical_3", 1, 1.0),
            PatternDefinition::new("diagonal", 2, 1.0),
        ];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        let mut seen = HashSet::new();
        for m in &matches {
            for p in &m.positions {
                assert!(seen.insert(*p), "cell {p:?} claimed twice");
            }
        }
        // Three per row fit only once each (columns 0-2), leaving columns 3-4
        assert_eq!(matches.iter().filter(|m| m.pattern_id.as_str() == "horizontal_3").count(), 3);
        assert_eq!(matches.iter().filter(|m| m.pattern_id.as_str() == "vertical_3").count(), 2);
    }

    #[test]
    fn test_detection_order_respected() {
        let grid = Grid::filled("A".into());
        let tables = Tables::new(&[("A", 1.0)]);
        let defs = vec![
            PatternDefinition::new("vertical_3", 2, 1.0),
            PatternDefinition::new("horizontal_5", 1, 1.0),
        ];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches.len(), 3);
        assert!(matches.windows(2).all(|w| w[0].detection_order <= w[1].detection_order));
        assert!(matches.iter().all(|m| m.pattern_id.as_str() == "horizontal_5"));
    }

    #[test]
    fn test_wild_substitutes() {
        let grid = Grid::from_strs(&[
            &["WILD", "B", "B", "C", "D"],
            &["E", "F", "G", "H", "I"],
            &["J", "K", "L", "M", "N"],
        ])
        .unwrap();
        let tables = Tables::new(&[("B", 3.0)]);
        let defs = vec![PatternDefinition::new("horizontal_3", 0, 2.0)];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].anchor, Symbol::from("B"));
        assert_eq!(matches[0].token_yield, 6);
    }

    #[test]
    fn test_all_wild_shape_anchors_on_wild() {
        let grid = Grid::from_strs(&[
            &["WILD", "WILD", "WILD", "C", "D"],
            &["E", "F", "G", "H", "I"],
            &["J", "K", "L", "M", "N"],
        ])
        .unwrap();
        let tables = Tables::new(&[("WILD", 4.0)]);
        let defs = vec![PatternDefinition::new("horizontal_3", 0, 1.0)];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].anchor, Symbol::from("WILD"));
        assert_eq!(matches[0].token_yield, 4);
    }

    #[test]
    fn test_pattern_multiplier_override_and_symbol_multiplier() {
        let grid = Grid::filled("A".into());
        let mut tables = Tables::new(&[("A", 3.0)]);
        tables.patterns.insert("horizontal_5".into(), 2.5);
        tables.multipliers.insert("A".into(), 2.0);
        let defs = vec![PatternDefinition::new("horizontal_5", 0, 1.0)];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches[0].multiplier, 2.5);
        assert_eq!(matches[0].token_yield, 15);
    }

    #[test]
    fn test_custom_and_malformed_shapes() {
        let grid = Grid::filled("A".into());
        let tables = Tables::new(&[("A", 1.0)]);
        let corners = vec![
            Position::new(0, 0),
            Position::new(0, 4),
            Position::new(2, 0),
            Position::new(2, 4),
        ];
        let defs = vec![
            PatternDefinition::new("corners", 0, 1.0).with_shapes(vec![corners.clone()]),
            PatternDefinition::new("broken", 1, 1.0).with_shapes(vec![vec![Position::new(7, 7)], vec![]]),
            PatternDefinition::new("empty", 2, 1.0),
        ];

        let matches = detector().detect(&grid, &defs, &tables.ctx());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].positions, corners);
    }
}
