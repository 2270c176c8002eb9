//! Edge cost model.
//!
//! The cost of traversing an edge starts at its physical length and is
//! scaled by every registered [`EdgeCostModifier`]. Modifiers see the edge
//! and the caller's [`PreferenceWeights`] and return a multiplicative
//! factor. New tag-driven behaviour is added by registering another
//! modifier; callers of [`CostModel::cost`] are unaffected.

use std::fmt;

use crate::catalogue::{TagCatalogue, noise_factor};
use crate::graph::Edge;
use crate::weights::{MAX_WEIGHT, Preference, PreferenceWeights};

/// Largest green discount, reached at weight 10.
pub const GREEN_DISCOUNT: f64 = 0.5;
/// Largest social discount, reached at weight 10.
pub const SOCIAL_DISCOUNT: f64 = 0.5;
/// Largest quiet-tag discount, reached at weight 10.
pub const QUIET_DISCOUNT: f64 = 0.2;

/// A multiplicative adjustment to an edge's base length.
///
/// Implementations must be pure: the same edge and weights always yield the
/// same factor. Factors that are negative or non-finite are ignored.
pub trait EdgeCostModifier: fmt::Debug + Send + Sync {
    /// Factor applied to the edge length.
    fn factor(&self, edge: &Edge, weights: &PreferenceWeights) -> f64;
}

/// Scales cost by the highway noise factor, attenuated by the quiet weight.
///
/// At quiet weight 0 the factor is 1; at weight 10 it equals the noise
/// factor of the edge's primary highway class.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseModifier;

impl EdgeCostModifier for NoiseModifier {
    fn factor(&self, edge: &Edge, weights: &PreferenceWeights) -> f64 {
        let noise = noise_factor(edge.highway());
        1.0 + (noise - 1.0) * (weights.quiet / MAX_WEIGHT)
    }
}

/// Discounts edges carrying any tag listed in a catalogue.
#[derive(Debug, Clone)]
pub struct TagDiscount {
    preference: Preference,
    catalogue: TagCatalogue,
    max_discount: f64,
}

impl TagDiscount {
    /// Discount edges matching `catalogue` by up to `max_discount`
    /// (a fraction in `[0, 1]`), scaled by the weight of `preference`.
    #[must_use]
    pub fn new(preference: Preference, catalogue: TagCatalogue, max_discount: f64) -> Self {
        Self {
            preference,
            catalogue,
            max_discount: max_discount.clamp(0.0, 1.0),
        }
    }

    fn applies_to(&self, edge: &Edge) -> bool {
        edge.tags.iter().any(|(key, value)| {
            value
                .primary()
                .is_some_and(|primary| self.catalogue.matches(key, primary))
        })
    }
}

impl EdgeCostModifier for TagDiscount {
    fn factor(&self, edge: &Edge, weights: &PreferenceWeights) -> f64 {
        if !self.applies_to(edge) {
            return 1.0;
        }
        let weight = weights.get(self.preference).clamp(0.0, MAX_WEIGHT);
        1.0 - self.max_discount * (weight / MAX_WEIGHT)
    }
}

/// Pure mapping from an edge and preference weights to a non-negative cost.
///
/// # Examples
/// ```
/// use amble_core::{CostModel, Edge, PreferenceWeights};
///
/// let model = CostModel::default();
/// let road = Edge::new(1, 2, 100.0).with_tag("highway", "primary");
/// let quiet = PreferenceWeights::new(0.0, 0.0, 10.0).expect("valid weights");
/// assert_eq!(model.cost(&road, &PreferenceWeights::NEUTRAL), 100.0);
/// assert_eq!(model.cost(&road, &quiet), 150.0);
/// ```
#[derive(Debug)]
pub struct CostModel {
    modifiers: Vec<Box<dyn EdgeCostModifier>>,
}

impl CostModel {
    /// A model whose cost is the edge length.
    #[must_use]
    pub const fn length_only() -> Self {
        Self {
            modifiers: Vec::new(),
        }
    }

    /// Register another modifier.
    #[must_use]
    pub fn with_modifier<M>(mut self, modifier: M) -> Self
    where
        M: EdgeCostModifier + 'static,
    {
        self.modifiers.push(Box::new(modifier));
        self
    }

    /// Number of registered modifiers.
    #[must_use]
    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// Traversal cost of `edge` under `weights`. Always finite and `>= 0`.
    #[must_use]
    pub fn cost(&self, edge: &Edge, weights: &PreferenceWeights) -> f64 {
        let base = if edge.length_m.is_finite() {
            edge.length_m.max(0.0)
        } else {
            0.0
        };
        let factor: f64 = self
            .modifiers
            .iter()
            .map(|modifier| modifier.factor(edge, weights))
            .filter(|factor| factor.is_finite() && *factor >= 0.0)
            .product();
        let cost = base * factor;
        if cost.is_finite() { cost } else { base }
    }
}

impl Default for CostModel {
    /// Noise attenuation plus green, social and quiet tag discounts.
    fn default() -> Self {
        Self::length_only()
            .with_modifier(NoiseModifier)
            .with_modifier(TagDiscount::new(
                Preference::Green,
                TagCatalogue::green(),
                GREEN_DISCOUNT,
            ))
            .with_modifier(TagDiscount::new(
                Preference::Social,
                TagCatalogue::social(),
                SOCIAL_DISCOUNT,
            ))
            .with_modifier(TagDiscount::new(
                Preference::Quiet,
                TagCatalogue::quiet(),
                QUIET_DISCOUNT,
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn model() -> CostModel {
        CostModel::default()
    }

    fn weights(green: f64, social: f64, quiet: f64) -> PreferenceWeights {
        PreferenceWeights::new(green, social, quiet).expect("valid weights")
    }

    #[rstest]
    fn neutral_weights_cost_length(model: CostModel) {
        let edge = Edge::new(1, 2, 42.0)
            .with_tag("highway", "primary")
            .with_tag("leisure", "park");
        assert!((model.cost(&edge, &PreferenceWeights::NEUTRAL) - 42.0).abs() < 1e-9);
    }

    #[rstest]
    #[case("motorway", 200.0)]
    #[case("residential", 100.0)]
    #[case("unclassified", 100.0)]
    fn quiet_weight_applies_noise(model: CostModel, #[case] highway: &str, #[case] expected: f64) {
        let edge = Edge::new(1, 2, 100.0).with_tag("highway", highway);
        let cost = model.cost(&edge, &weights(0.0, 0.0, 10.0));
        assert!((cost - expected).abs() < 1e-9, "{highway}: {cost}");
    }

    #[rstest]
    fn quiet_tags_stack_with_noise(model: CostModel) {
        let edge = Edge::new(1, 2, 100.0).with_tag("highway", "footway");
        let cost = model.cost(&edge, &weights(0.0, 0.0, 10.0));
        // noise 0.5 then quiet discount 0.8
        assert!((cost - 40.0).abs() < 1e-9);
    }

    #[rstest]
    fn green_tags_are_discounted(model: CostModel) {
        let park = Edge::new(1, 2, 100.0).with_tag("leisure", "park");
        let plain = Edge::new(1, 2, 100.0);
        let w = weights(10.0, 0.0, 0.0);
        assert!((model.cost(&park, &w) - 50.0).abs() < 1e-9);
        assert!((model.cost(&plain, &w) - 100.0).abs() < 1e-9);
    }

    #[rstest]
    fn social_discount_scales_with_weight(model: CostModel) {
        let cafe = Edge::new(1, 2, 100.0).with_tag("amenity", "cafe");
        assert!((model.cost(&cafe, &weights(0.0, 5.0, 0.0)) - 75.0).abs() < 1e-9);
    }

    #[rstest]
    fn uses_primary_value_of_tag_lists(model: CostModel) {
        let edge = Edge::new(1, 2, 100.0).with_tag(
            "highway",
            vec!["motorway".to_owned(), "footway".to_owned()],
        );
        assert!((model.cost(&edge, &weights(0.0, 0.0, 10.0)) - 200.0).abs() < 1e-9);
    }

    #[derive(Debug)]
    struct Broken;

    impl EdgeCostModifier for Broken {
        fn factor(&self, _edge: &Edge, _weights: &PreferenceWeights) -> f64 {
            -3.0
        }
    }

    #[rstest]
    fn ignores_invalid_factors() {
        let model = CostModel::length_only().with_modifier(Broken);
        let edge = Edge::new(1, 2, 10.0);
        assert!((model.cost(&edge, &PreferenceWeights::NEUTRAL) - 10.0).abs() < 1e-9);
    }

    #[rstest]
    fn length_only_has_no_modifiers() {
        assert_eq!(CostModel::length_only().modifier_count(), 0);
        assert_eq!(CostModel::default().modifier_count(), 4);
    }
}
