//! Token, interest, XP and reroll formulas

use serde::{Deserialize, Serialize};

use crate::patterns::MatchedPattern;

/// Dollars per point of interest
pub const INTEREST_DIVISOR: u64 = 5;
/// Interest cap per level
pub const MAX_INTEREST: u64 = 10;
/// XP needed for level 1 → 2
pub const BASE_XP_REQUIREMENT: f64 = 100.0;
/// Growth of the XP requirement per level
pub const XP_GROWTH: f64 = 1.1;

/// Tokens earned by a set of matches before detection-triggered multipliers.
///
/// Each match contributes `floor(token_yield × (1 + permanent_bonus))`.
pub fn token_gain(matches: &[MatchedPattern], permanent_bonus: f64) -> u64 {
    let factor = 1.0 + permanent_bonus;
    matches
        .iter()
        .map(|m| (m.token_yield as f64 * factor).floor().max(0.0) as u64)
        .sum()
}

/// Interest on held dollars: one per five, capped at ten
pub fn calculate_interest(dollars: u64) -> u64 {
    (dollars / INTEREST_DIVISOR).min(MAX_INTEREST)
}

/// XP needed to go from `level` to `level + 1`
pub fn xp_required(level: u32) -> u64 {
    let exponent = level.saturating_sub(1) as i32;
    (BASE_XP_REQUIREMENT * XP_GROWTH.powi(exponent)).floor() as u64
}

/// Outcome of an XP award
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub xp: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub levels_gained: u32,
}

/// Add XP, rolling over as many levels as the total covers
pub fn add_xp(xp: u64, level: u32, amount: u64) -> XpAward {
    let mut xp = xp + amount;
    let mut level = level.max(1);
    let start = level;

    loop {
        let required = xp_required(level);
        if xp < required {
            break;
        }
        xp -= required;
        level += 1;
    }

    XpAward {
        xp,
        level,
        leveled_up: level > start,
        levels_gained: level - start,
    }
}

/// Shop reroll price after `rerolls` paid rerolls
pub fn reroll_cost(base_cost: f64, multiplier: f64, rerolls: u32) -> f64 {
    base_cost * multiplier.powi(rerolls as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;
    use crate::patterns::{PatternFamily, PatternId};
    use approx::assert_relative_eq;

    fn matched(token_yield: u64) -> MatchedPattern {
        MatchedPattern {
            family: PatternFamily::Combo,
            pattern_id: PatternId::from("horizontal_3"),
            detection_order: 0,
            anchor: "A".into(),
            positions: vec![Position::new(0, 0)],
            multiplier: 1.0,
            token_yield,
        }
    }

    #[test]
    fn test_token_gain_floors_each_match() {
        let matches = vec![matched(5), matched(3)];
        assert_eq!(token_gain(&matches, 0.0), 8);
        // 5 × 1.5 = 7.5 → 7, 3 × 1.5 = 4.5 → 4
        assert_eq!(token_gain(&matches, 0.5), 11);
        assert_eq!(token_gain(&[], 2.0), 0);
    }

    #[test]
    fn test_interest_monotonic_and_capped() {
        assert_eq!(calculate_interest(0), 0);
        assert_eq!(calculate_interest(4), 0);
        assert_eq!(calculate_interest(5), 1);
        assert_eq!(calculate_interest(49), 9);
        assert_eq!(calculate_interest(1_000_000), 10);

        let mut previous = 0;
        for d in 0..200 {
            let interest = calculate_interest(d);
            assert!(interest >= previous);
            assert!(interest <= MAX_INTEREST);
            previous = interest;
        }
    }

    #[test]
    fn test_xp_curve() {
        assert_eq!(xp_required(1), 100);
        assert_eq!(xp_required(2), 110);
        assert_eq!(xp_required(3), 121);
    }

    #[test]
    fn test_add_zero_xp_is_noop() {
        let award = add_xp(42, 3, 0);
        assert_eq!(award.xp, 42);
        assert_eq!(award.level, 3);
        assert!(!award.leveled_up);
        assert_eq!(award.levels_gained, 0);
    }

    #[test]
    fn test_multi_level_jump() {
        // 100 + 110 + 121 = 331
        let award = add_xp(0, 1, 335);
        assert_eq!(award.level, 4);
        assert_eq!(award.xp, 4);
        assert!(award.leveled_up);
        assert_eq!(award.levels_gained, 3);
    }

    #[test]
    fn test_reroll_cost_exponential() {
        assert_relative_eq!(reroll_cost(2.0, 1.5, 0), 2.0);
        assert_relative_eq!(reroll_cost(2.0, 1.5, 2), 4.5);
    }
}
