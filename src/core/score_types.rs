//! Type-safe normalized score scale.
//!
//! Every normalized parameter and the composite MNIS itself live on the
//! unit interval. Wrapping the value enforces the clamp at construction so
//! downstream code never sees an out-of-range score.
//!
//! # Examples
//!
//! ```rust
//! use mnis::core::score_types::Normalized;
//!
//! let score = Normalized::new(0.42);
//! assert_eq!(score.value(), 0.42);
//!
//! // Out-of-bounds values are clamped
//! assert_eq!(Normalized::new(1.7).value(), 1.0);
//! assert_eq!(Normalized::new(-0.3).value(), 0.0);
//! ```

use serde::{Deserialize, Serialize};

/// Score on the 0-1 scale.
///
/// Values are automatically clamped to the [0.0, 1.0] range. NaN is mapped
/// to 0.0 so the invariant holds for every input.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Normalized(f64);

impl Normalized {
    pub const MIN: Normalized = Normalized(0.0);
    pub const MAX: Normalized = Normalized(1.0);

    /// Create a new normalized score, clamping to [0.0, 1.0].
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw score value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Exactly at the lower saturation point
    pub fn is_floor(self) -> bool {
        self.0 == 0.0
    }

    /// Exactly at the upper saturation point
    pub fn is_ceiling(self) -> bool {
        self.0 == 1.0
    }
}

impl From<Normalized> for f64 {
    fn from(n: Normalized) -> f64 {
        n.0
    }
}

impl std::fmt::Display for Normalized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_upper_bound() {
        assert_eq!(Normalized::new(1.5).value(), 1.0);
    }

    #[test]
    fn clamps_lower_bound() {
        assert_eq!(Normalized::new(-0.5).value(), 0.0);
    }

    #[test]
    fn nan_maps_to_floor() {
        assert!(Normalized::new(f64::NAN).is_floor());
    }

    #[test]
    fn display_uses_three_decimals() {
        assert_eq!(format!("{}", Normalized::new(0.76184)), "0.762");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn always_in_bounds(value in -10.0..10.0f64) {
                let score = Normalized::new(value);
                prop_assert!(score.value() >= 0.0 && score.value() <= 1.0);
            }

            #[test]
            fn clamping_preserves_ordering(a in -1.0..2.0f64, b in -1.0..2.0f64) {
                if a <= b {
                    prop_assert!(Normalized::new(a) <= Normalized::new(b));
                }
            }
        }
    }
}
