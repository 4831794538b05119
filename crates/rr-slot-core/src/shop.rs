//! Shop: rarity distribution, joker pricing, offer generation and the
//! purchase phase the engine runs between levels

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::effects::triggers::grant_free_rerolls;
use crate::effects::{EquippedJoker, ModifierDefinition};
use crate::error::{SlotError, SlotResult};
use crate::gains::reroll_cost;
use crate::probability::{normalize, weighted_pick};
use crate::state::GameState;

/// Lowest common weight ascension can push down to
pub const MIN_COMMON_WEIGHT: f64 = 5.0;
/// Common weight lost per ascension
pub const COMMON_ASCENSION_PENALTY: f64 = 3.0;
/// Joker prices step up every this many ascensions
pub const PRICE_TIER_SIZE: u32 = 5;
/// Price increase per tier
pub const PRICE_TIER_STEP: f64 = 0.1;

/// Modifier rarity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Weight gained per ascension
    pub fn ascension_increment(&self) -> f64 {
        match self {
            Self::Common => 0.0,
            Self::Uncommon => 1.5,
            Self::Rare => 1.0,
            Self::Epic => 0.35,
            Self::Legendary => 0.15,
        }
    }

    /// Boosted by the chance stat
    pub fn is_chance_boosted(&self) -> bool {
        matches!(self, Self::Rare | Self::Epic | Self::Legendary)
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        };
        f.write_str(name)
    }
}

/// Rarity → weight
pub type RarityWeights = BTreeMap<Rarity, f64>;

/// What the shop phase does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopPolicy {
    /// Never buy
    Skip,
    /// Buy the first offer the player can pay for
    #[default]
    BuyFirstAffordable,
}

/// Shop tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Base weights keyed by the first world they apply to
    pub world_weights: BTreeMap<u32, RarityWeights>,
    /// Offers per shop visit
    pub shop_slots: usize,
    pub reroll_base_cost: f64,
    pub reroll_multiplier: f64,
    /// Jokers a player can hold
    pub max_jokers: usize,
    pub policy: ShopPolicy,
}

impl Default for ShopConfig {
    fn default() -> Self {
        let early = RarityWeights::from([
            (Rarity::Common, 60.0),
            (Rarity::Uncommon, 25.0),
            (Rarity::Rare, 10.0),
            (Rarity::Epic, 4.0),
            (Rarity::Legendary, 1.0),
        ]);
        let late = RarityWeights::from([
            (Rarity::Common, 45.0),
            (Rarity::Uncommon, 30.0),
            (Rarity::Rare, 15.0),
            (Rarity::Epic, 7.0),
            (Rarity::Legendary, 3.0),
        ]);
        Self {
            world_weights: BTreeMap::from([(1, early), (3, late)]),
            shop_slots: 3,
            reroll_base_cost: 2.0,
            reroll_multiplier: 1.5,
            max_jokers: 5,
            policy: ShopPolicy::BuyFirstAffordable,
        }
    }
}

/// One joker on sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopOffer {
    pub joker: ModifierDefinition,
    pub price: u64,
}

/// Summary of one shop phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopVisit {
    pub offers_seen: usize,
    pub purchased: Option<String>,
    pub price_paid: u64,
    pub free_rerolls_granted: u32,
    pub free_rerolls_used: u32,
}

/// Shop manager
#[derive(Debug, Clone)]
pub struct ShopManager {
    config: ShopConfig,
}

impl ShopManager {
    pub fn new(config: ShopConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// Weights of the highest configured world not above `world`
    pub fn base_weights(&self, world: u32) -> SlotResult<&RarityWeights> {
        self.config
            .world_weights
            .range(..=world)
            .next_back()
            .map(|(_, w)| w)
            .ok_or(SlotError::MissingShopWeights(world))
    }

    /// Rarity distribution for a world, summing to 100.
    ///
    /// Ascension moves weight from common (floored at 5) to the higher tiers,
    /// then chance scales rare, epic and legendary by `1 + chance/100`.
    pub fn rarity_distribution(&self, world: u32, ascension: u32, chance: f64) -> SlotResult<RarityWeights> {
        let mut weights = self.base_weights(world)?.clone();
        let asc = ascension as f64;

        if let Some(common) = weights.get_mut(&Rarity::Common) {
            let floor = MIN_COMMON_WEIGHT.min(*common);
            *common = (*common - COMMON_ASCENSION_PENALTY * asc).max(floor);
        }
        for rarity in &Rarity::ALL[1..] {
            *weights.entry(*rarity).or_insert(0.0) += rarity.ascension_increment() * asc;
        }

        let boost = 1.0 + chance.max(0.0) / 100.0;
        for (rarity, weight) in weights.iter_mut() {
            if rarity.is_chance_boosted() {
                *weight *= boost;
            }
        }

        Ok(normalize(&weights, 100.0))
    }

    /// `ceil(base × (1 + 0.1 × floor(ascension / 5)))`
    pub fn joker_price(&self, base_price: f64, ascension: u32) -> u64 {
        let tiers = (ascension / PRICE_TIER_SIZE) as f64;
        ceil_dollars(base_price * (1.0 + PRICE_TIER_STEP * tiers))
    }

    /// Dollar cost of the next paid reroll
    pub fn reroll_price(&self, rerolls: u32) -> u64 {
        ceil_dollars(reroll_cost(
            self.config.reroll_base_cost,
            self.config.reroll_multiplier,
            rerolls,
        ))
    }

    /// Draw `shop_slots` offers: a rarity from the distribution restricted to
    /// rarities the catalog has, then a uniform joker of that rarity
    pub fn generate_offers<R: Rng + ?Sized>(
        &self,
        world: u32,
        ascension: u32,
        chance: f64,
        catalog: &[ModifierDefinition],
        rng: &mut R,
    ) -> SlotResult<Vec<ShopOffer>> {
        let distribution = self.rarity_distribution(world, ascension, chance)?;
        let available: RarityWeights = distribution
            .into_iter()
            .filter(|(rarity, weight)| *weight > 0.0 && catalog.iter().any(|j| j.rarity == *rarity))
            .collect();

        if available.is_empty() {
            log::debug!("No stocked rarity for world {world}; empty shop");
            return Ok(Vec::new());
        }

        let mut offers = Vec::with_capacity(self.config.shop_slots);
        for _ in 0..self.config.shop_slots {
            let rarity = weighted_pick(&available, rng)?;
            let pool: Vec<&ModifierDefinition> = catalog.iter().filter(|j| j.rarity == rarity).collect();
            let joker = pool[rng.random_range(0..pool.len())];
            offers.push(ShopOffer {
                price: self.joker_price(joker.base_price, ascension),
                joker: joker.clone(),
            });
        }
        Ok(offers)
    }

    /// Shop phase between levels.
    ///
    /// Free rerolls from equipped effects are granted first. Under
    /// [`ShopPolicy::BuyFirstAffordable`] the first affordable offer is bought;
    /// when nothing is affordable a free reroll draws a new set, and the
    /// phase ends once none are left.
    pub fn run_phase<R: Rng + ?Sized>(
        &self,
        state: &mut GameState,
        chance: f64,
        catalog: &[ModifierDefinition],
        rng: &mut R,
    ) -> SlotResult<ShopVisit> {
        let mut visit = ShopVisit {
            free_rerolls_granted: grant_free_rerolls(state),
            ..ShopVisit::default()
        };

        if self.config.policy == ShopPolicy::Skip || state.jokers.len() >= self.config.max_jokers {
            return Ok(visit);
        }

        loop {
            let offers = self.generate_offers(state.level.world, state.ascension, chance, catalog, rng)?;
            visit.offers_seen += offers.len();
            if offers.is_empty() {
                break;
            }

            if let Some(offer) = offers.into_iter().find(|o| o.price <= state.dollars) {
                log::debug!("Bought {} for ${}", offer.joker.id, offer.price);
                state.dollars -= offer.price;
                visit.price_paid = offer.price;
                visit.purchased = Some(offer.joker.id.clone());
                state.jokers.push(EquippedJoker::new(offer.joker));
                break;
            }

            if state.free_rerolls == 0 {
                break;
            }
            state.free_rerolls -= 1;
            visit.free_rerolls_used += 1;
        }

        Ok(visit)
    }
}

/// Round up to whole dollars, ignoring float noise below a micro-dollar
fn ceil_dollars(amount: f64) -> u64 {
    ((amount * 1e6).round() / 1e6).ceil().max(0.0) as u64
}

/// Small default joker catalog
pub fn standard_jokers() -> Vec<ModifierDefinition> {
    use crate::effects::{ComboCondition, EffectEntry, EffectKind};

    vec![
        ModifierDefinition::new("lucky_clover", Rarity::Common)
            .with_price(4.0)
            .with_effect(EffectEntry::new(EffectKind::WeightIncrease, 25.0).with_target("CLOVER")),
        ModifierDefinition::new("sharp_eye", Rarity::Uncommon)
            .with_price(6.0)
            .with_effect(EffectEntry::new(EffectKind::ChanceIncrease, 5.0)),
        ModifierDefinition::new("spare_change", Rarity::Uncommon)
            .with_price(5.0)
            .with_effect(EffectEntry::new(EffectKind::Insurance, 1.0)),
        ModifierDefinition::new("wild_card", Rarity::Rare)
            .with_price(8.0)
            .with_effect(EffectEntry::new(EffectKind::WildSymbolIncrease, 1.0)),
        ModifierDefinition::new("crowd_pleaser", Rarity::Epic)
            .with_price(12.0)
            .with_effect(
                EffectEntry::new(EffectKind::ConditionalMultiplier, 2.0).with_condition(ComboCondition::MinMatches(3)),
            ),
        ModifierDefinition::new("golden_touch", Rarity::Legendary)
            .with_price(20.0)
            .with_effect(EffectEntry::new(EffectKind::SymbolMultiplierIncrease, 0.5)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectEntry, EffectKind, EquippedBonus};
    use crate::level::LevelId;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn manager() -> ShopManager {
        ShopManager::new(ShopConfig::default())
    }

    #[test]
    fn test_distribution_sums_to_100() {
        let m = manager();
        for (world, asc, chance) in [(1, 0, 0.0), (2, 3, 40.0), (5, 20, 90.0)] {
            let dist = m.rarity_distribution(world, asc, chance).unwrap();
            assert_relative_eq!(dist.values().sum::<f64>(), 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_world_fallback_and_missing_weights() {
        let m = manager();
        assert_eq!(m.base_weights(2).unwrap()[&Rarity::Common], 60.0);
        assert_eq!(m.base_weights(7).unwrap()[&Rarity::Common], 45.0);

        let empty = ShopManager::new(ShopConfig {
            world_weights: BTreeMap::new(),
            ..ShopConfig::default()
        });
        assert!(matches!(empty.rarity_distribution(1, 0, 0.0), Err(SlotError::MissingShopWeights(1))));
    }

    #[test]
    fn test_ascension_shift() {
        let m = manager();
        let base = m.rarity_distribution(1, 0, 0.0).unwrap();
        let ascended = m.rarity_distribution(1, 30, 0.0).unwrap();
        assert!(ascended[&Rarity::Common] < base[&Rarity::Common]);
        assert!(ascended[&Rarity::Legendary] > base[&Rarity::Legendary]);
        // common floored at 5 before normalization: 60 − 90 → 5
        let raw_total = 5.0 + (25.0 + 45.0) + (10.0 + 30.0) + (4.0 + 10.5) + (1.0 + 4.5);
        assert_relative_eq!(ascended[&Rarity::Common], 5.0 / raw_total * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_chance_boosts_high_tiers() {
        let m = manager();
        let low = m.rarity_distribution(1, 0, 0.0).unwrap();
        let high = m.rarity_distribution(1, 0, 80.0).unwrap();
        assert!(high[&Rarity::Rare] > low[&Rarity::Rare]);
        assert!(high[&Rarity::Common] < low[&Rarity::Common]);
    }

    #[test]
    fn test_joker_price_tiers() {
        let m = manager();
        assert_eq!(m.joker_price(10.0, 0), 10);
        assert_eq!(m.joker_price(10.0, 4), 10);
        assert_eq!(m.joker_price(10.0, 5), 11);
        assert_eq!(m.joker_price(7.0, 10), 9); // 8.4 → 9
        assert_eq!(m.reroll_price(0), 2);
        assert_eq!(m.reroll_price(2), 5); // 4.5 → 5
    }

    #[test]
    fn test_offers_only_stocked_rarities() {
        let m = manager();
        let catalog = vec![ModifierDefinition::new("only", Rarity::Epic).with_price(3.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let offers = m.generate_offers(1, 0, 0.0, &catalog, &mut rng).unwrap();
        assert_eq!(offers.len(), 3);
        assert!(offers.iter().all(|o| o.joker.id == "only" && o.price == 3));

        assert!(m.generate_offers(1, 0, 0.0, &[], &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_phase_buys_first_affordable() {
        let m = manager();
        let mut state = GameState::new(LevelId::new(1, 1));
        state.dollars = 10;
        let catalog = vec![ModifierDefinition::new("cheap", Rarity::Common).with_price(4.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let visit = m.run_phase(&mut state, 0.0, &catalog, &mut rng).unwrap();
        assert_eq!(visit.purchased.as_deref(), Some("cheap"));
        assert_eq!(state.dollars, 6);
        assert_eq!(state.jokers.len(), 1);
    }

    #[test]
    fn test_phase_spends_free_rerolls_when_broke() {
        let m = manager();
        let mut state = GameState::new(LevelId::new(1, 1));
        state.bonuses.push(EquippedBonus::new(
            ModifierDefinition::new("dice", Rarity::Common).with_effect(EffectEntry::new(EffectKind::FreeReroll, 2.0)),
            1,
        ));
        let catalog = vec![ModifierDefinition::new("pricey", Rarity::Common).with_price(50.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let visit = m.run_phase(&mut state, 0.0, &catalog, &mut rng).unwrap();
        assert_eq!(visit.purchased, None);
        assert_eq!(visit.free_rerolls_granted, 2);
        assert_eq!(visit.free_rerolls_used, 2);
        assert_eq!(visit.offers_seen, 9);
        assert_eq!(state.free_rerolls, 0);
    }

    #[test]
    fn test_skip_policy_buys_nothing() {
        let m = ShopManager::new(ShopConfig {
            policy: ShopPolicy::Skip,
            ..ShopConfig::default()
        });
        let mut state = GameState::new(LevelId::new(1, 1));
        state.dollars = 100;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let visit = m.run_phase(&mut state, 0.0, &standard_jokers(), &mut rng).unwrap();
        assert_eq!(visit.purchased, None);
        assert_eq!(state.dollars, 100);
    }
}
