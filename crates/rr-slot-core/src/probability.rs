//! Probability utilities: weighted sampling, normalization, shuffling
//!
//! Every function takes the random source as a parameter; nothing in the core
//! reaches for an ambient generator.

use std::collections::BTreeMap;
use std::fmt::Display;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::SliceRandom;

use crate::error::{SlotError, SlotResult};

/// Pick one key with probability proportional to its weight.
///
/// Negative weights count as zero. A map whose total weight is zero (or an
/// empty map) is a precondition violation and fails with
/// [`SlotError::EmptyWeightDistribution`].
pub fn weighted_pick<K, R>(weights: &BTreeMap<K, f64>, rng: &mut R) -> SlotResult<K>
where
    K: Clone + Ord + Display,
    R: Rng + ?Sized,
{
    let mut keys = Vec::with_capacity(weights.len());
    let mut clamped = Vec::with_capacity(weights.len());

    for (key, &weight) in weights {
        if !weight.is_finite() {
            return Err(SlotError::InvalidWeight {
                key: key.to_string(),
                weight,
            });
        }
        keys.push(key);
        clamped.push(weight.max(0.0));
    }

    let total: f64 = clamped.iter().sum();
    if total <= 0.0 {
        return Err(SlotError::EmptyWeightDistribution);
    }

    let dist = WeightedIndex::new(&clamped)
        .map_err(|e| SlotError::Config(format!("weighted sampling failed: {e}")))?;

    Ok(keys[dist.sample(rng)].clone())
}

/// Total of all positive weights
pub fn total_weight<K>(weights: &BTreeMap<K, f64>) -> f64 {
    weights.values().filter(|w| **w > 0.0).sum()
}

/// Scale weights so they sum to `target`. An all-zero map is returned unchanged.
pub fn normalize<K: Clone + Ord>(weights: &BTreeMap<K, f64>, target: f64) -> BTreeMap<K, f64> {
    let total = total_weight(weights);
    if total <= 0.0 {
        return weights.clone();
    }

    weights
        .iter()
        .map(|(k, w)| (k.clone(), w.max(0.0) / total * target))
        .collect()
}

/// Fisher–Yates shuffle in place
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Take `n` distinct elements: the prefix of a shuffled copy.
/// `n` larger than the input yields every element once.
pub fn sample_distinct<T: Clone, R: Rng + ?Sized>(items: &[T], n: usize, rng: &mut R) -> Vec<T> {
    let mut pool = items.to_vec();
    shuffle(&mut pool, rng);
    pool.truncate(n.min(items.len()));
    pool
}
