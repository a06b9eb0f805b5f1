//! Variant selection among tile kinds sharing a (group, mask) pair

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tilegrid_core::TileKindId;

/// Default probability of drawing the canonical (first) variant
pub const DEFAULT_CANONICAL_WEIGHT: f64 = 0.8;

/// Strategy for picking one variant out of a candidate list.
///
/// Only called with two or more candidates.
pub trait VariantSelector {
    /// Index into `candidates`. Out-of-range results fall back to 0.
    fn choose(&mut self, candidates: &[TileKindId]) -> usize;
}

impl<S: VariantSelector + ?Sized> VariantSelector for Box<S> {
    fn choose(&mut self, candidates: &[TileKindId]) -> usize {
        (**self).choose(candidates)
    }
}

impl<S: VariantSelector + ?Sized> VariantSelector for &mut S {
    fn choose(&mut self, candidates: &[TileKindId]) -> usize {
        (**self).choose(candidates)
    }
}

/// Pick a variant, or `None` when there are no candidates
pub fn select_variant<'c>(
    selector: &mut dyn VariantSelector,
    candidates: &'c [TileKindId],
) -> Option<&'c TileKindId> {
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => {
            let idx = selector.choose(candidates);
            candidates.get(idx).or(candidates.first())
        }
    }
}

/// Configuration for the default weighted selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantSettings {
    /// Probability of the canonical variant, in `0.0..=1.0`
    pub canonical_weight: f64,
    /// Fixed RNG seed for reproducible variety
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self {
            canonical_weight: DEFAULT_CANONICAL_WEIGHT,
            seed: None,
        }
    }
}

/// Returns the canonical variant with probability `canonical_weight`,
/// otherwise a uniform pick among the rest.
#[derive(Debug, Clone)]
pub struct WeightedVariantSelector {
    rng: SmallRng,
    canonical_weight: f64,
}

impl WeightedVariantSelector {
    pub fn new(canonical_weight: f64) -> Self {
        Self::with_rng(SmallRng::from_entropy(), canonical_weight)
    }

    pub fn seeded(seed: u64, canonical_weight: f64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed), canonical_weight)
    }

    pub fn from_settings(settings: &VariantSettings) -> Self {
        match settings.seed {
            Some(seed) => Self::seeded(seed, settings.canonical_weight),
            None => Self::new(settings.canonical_weight),
        }
    }

    fn with_rng(rng: SmallRng, canonical_weight: f64) -> Self {
        // NaN and out-of-range weights would make gen_bool panic
        let canonical_weight = if (0.0..=1.0).contains(&canonical_weight) {
            canonical_weight
        } else {
            DEFAULT_CANONICAL_WEIGHT
        };
        Self {
            rng,
            canonical_weight,
        }
    }

    pub fn canonical_weight(&self) -> f64 {
        self.canonical_weight
    }
}

impl Default for WeightedVariantSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CANONICAL_WEIGHT)
    }
}

impl VariantSelector for WeightedVariantSelector {
    fn choose(&mut self, candidates: &[TileKindId]) -> usize {
        if candidates.len() < 2 || self.rng.gen_bool(self.canonical_weight) {
            0
        } else {
            self.rng.gen_range(1..candidates.len())
        }
    }
}

/// Always the canonical variant. Deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalVariantSelector;

impl VariantSelector for CanonicalVariantSelector {
    fn choose(&mut self, _candidates: &[TileKindId]) -> usize {
        0
    }
}

/// Adapts a closure into a [`VariantSelector`]
pub struct FnSelector<F>(pub F);

impl<F> VariantSelector for FnSelector<F>
where
    F: FnMut(&[TileKindId]) -> usize,
{
    fn choose(&mut self, candidates: &[TileKindId]) -> usize {
        (self.0)(candidates)
    }
}
