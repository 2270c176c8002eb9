//! Caller preference weights.

use thiserror::Error;

/// Inclusive upper bound of every preference weight.
pub const MAX_WEIGHT: f64 = 10.0;

/// How strongly the caller favours green, social and quiet streets.
///
/// Each weight lies in `[0, 10]`. Zero disables the corresponding modifier.
///
/// # Examples
/// ```
/// use amble_core::PreferenceWeights;
///
/// let weights = PreferenceWeights::new(5.0, 0.0, 10.0).expect("in range");
/// assert_eq!(weights.quiet, 10.0);
/// assert!(PreferenceWeights::new(11.0, 0.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreferenceWeights {
    /// Preference for parks, woodland and other green land use.
    #[cfg_attr(feature = "serde", serde(default, alias = "greenness"))]
    pub green: f64,
    /// Preference for cafés, shops and other social amenities.
    #[cfg_attr(feature = "serde", serde(default, alias = "sociability"))]
    pub social: f64,
    /// Preference for low-traffic streets and paths.
    #[cfg_attr(feature = "serde", serde(default, alias = "quietness"))]
    pub quiet: f64,
}

/// A preference weight fell outside `[0, 10]`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{name} weight {value} is outside [0, 10]")]
pub struct WeightError {
    /// Which preference was rejected.
    pub name: &'static str,
    /// The rejected value.
    pub value: f64,
}

impl PreferenceWeights {
    /// Weights with every preference disabled.
    pub const NEUTRAL: Self = Self {
        green: 0.0,
        social: 0.0,
        quiet: 0.0,
    };

    /// Validate and construct weights.
    ///
    /// # Errors
    /// Returns [`WeightError`] for the first weight outside `[0, 10]`.
    pub fn new(green: f64, social: f64, quiet: f64) -> Result<Self, WeightError> {
        let weights = Self {
            green,
            social,
            quiet,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Check every weight lies in `[0, 10]`.
    ///
    /// # Errors
    /// Returns [`WeightError`] naming the first offending weight.
    pub fn validate(&self) -> Result<(), WeightError> {
        for (name, value) in [
            ("green", self.green),
            ("social", self.social),
            ("quiet", self.quiet),
        ] {
            if !(0.0..=MAX_WEIGHT).contains(&value) {
                return Err(WeightError { name, value });
            }
        }
        Ok(())
    }

    /// Weight for a single preference.
    #[must_use]
    pub const fn get(&self, preference: Preference) -> f64 {
        match preference {
            Preference::Green => self.green,
            Preference::Social => self.social,
            Preference::Quiet => self.quiet,
        }
    }
}

/// The three preference dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preference {
    /// Green land use.
    Green,
    /// Social amenities.
    Social,
    /// Quiet streets.
    Quiet,
}
