#![allow(dead_code)]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Stable integer identity of a physical component in the graph.
pub type ComponentId = u64;

/// Categories the component graph exposes. Only the ones the power
/// distribution core cares about are enumerated with meaning here; the
/// topology source may carry others.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ComponentCategory {
    Grid,
    Meter,
    Battery,
    Inverter,
    EvCharger,
}

/// A node in the component graph, as returned by `ComponentGraph::components`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Component {
    pub id: ComponentId,
    pub category: ComponentCategory,
}

/// Aggregate or per-device operating envelope in watts.
///
/// Invariant: `inclusion_lower <= exclusion_lower <= 0 <= exclusion_upper
/// <= inclusion_upper`. Any field may be NaN, meaning "unknown"; callers
/// must check `is_finite` before comparing, never rely on NaN comparison
/// semantics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerBounds {
    pub inclusion_lower: f64,
    pub exclusion_lower: f64,
    pub exclusion_upper: f64,
    pub inclusion_upper: f64,
}

impl PowerBounds {
    pub const fn new(
        inclusion_lower: f64,
        exclusion_lower: f64,
        exclusion_upper: f64,
        inclusion_upper: f64,
    ) -> Self {
        Self {
            inclusion_lower,
            exclusion_lower,
            exclusion_upper,
            inclusion_upper,
        }
    }

    /// All four fields finite.
    pub fn is_fully_known(&self) -> bool {
        self.inclusion_lower.is_finite()
            && self.exclusion_lower.is_finite()
            && self.exclusion_upper.is_finite()
            && self.inclusion_upper.is_finite()
    }

    /// `power` lies inside `[inclusion_lower, inclusion_upper]`.
    pub fn within_inclusion(&self, power: f64) -> bool {
        power >= self.inclusion_lower && power <= self.inclusion_upper
    }

    /// `power` is non-zero and lies strictly inside `(exclusion_lower,
    /// exclusion_upper)`.
    pub fn within_exclusion(&self, power: f64) -> bool {
        power != 0.0 && power > self.exclusion_lower && power < self.exclusion_upper
    }

    pub fn clamp(&self, power: f64) -> f64 {
        power.clamp(self.inclusion_lower, self.inclusion_upper)
    }

    /// Fill any NaN field from the opposite-sign field of the same pair
    /// (inclusion_lower <-> inclusion_upper, exclusion_lower <->
    /// exclusion_upper), falling back to +/-infinity for the inclusion
    /// pair and 0 for the exclusion pair when both sides are unknown.
    /// Used under force-include when neither "latest" nor "latest valid"
    /// telemetry has a value for a field.
    pub fn with_neutral_substitution(&self) -> PowerBounds {
        let inclusion_lower = if self.inclusion_lower.is_finite() {
            self.inclusion_lower
        } else if self.inclusion_upper.is_finite() {
            -self.inclusion_upper
        } else {
            f64::NEG_INFINITY
        };
        let inclusion_upper = if self.inclusion_upper.is_finite() {
            self.inclusion_upper
        } else if self.inclusion_lower.is_finite() {
            -self.inclusion_lower
        } else {
            f64::INFINITY
        };
        let exclusion_lower = if self.exclusion_lower.is_finite() {
            self.exclusion_lower
        } else if self.exclusion_upper.is_finite() {
            -self.exclusion_upper
        } else {
            0.0
        };
        let exclusion_upper = if self.exclusion_upper.is_finite() {
            self.exclusion_upper
        } else if self.exclusion_lower.is_finite() {
            -self.exclusion_lower
        } else {
            0.0
        };
        PowerBounds {
            inclusion_lower,
            exclusion_lower,
            exclusion_upper,
            inclusion_upper,
        }
    }

    /// Intersect the inclusion envelopes and union the exclusion bands of
    /// two devices that must both accept the flow: `[max(lower), min(upper)]` for inclusion,
    /// `[min(lower), max(upper)]` for exclusion.
    pub fn intersect_pair(&self, other: &PowerBounds) -> PowerBounds {
        PowerBounds {
            inclusion_lower: self.inclusion_lower.max(other.inclusion_lower),
            inclusion_upper: self.inclusion_upper.min(other.inclusion_upper),
            exclusion_lower: self.exclusion_lower.min(other.exclusion_lower),
            exclusion_upper: self.exclusion_upper.max(other.exclusion_upper),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn component_category_display_and_iter() {
        assert_eq!(ComponentCategory::Battery.to_string(), "Battery");
        let all: Vec<ComponentCategory> = ComponentCategory::iter().collect();
        assert_eq!(all.len(), 5);
        assert!(all.contains(&ComponentCategory::EvCharger));
    }

    #[test]
    fn within_exclusion_excludes_zero() {
        let b = PowerBounds::new(-1000.0, -300.0, 300.0, 1000.0);
        assert!(!b.within_exclusion(0.0));
        assert!(b.within_exclusion(100.0));
        assert!(b.within_exclusion(-100.0));
        assert!(!b.within_exclusion(300.0));
        assert!(!b.within_exclusion(1200.0));
    }

    #[test]
    fn is_fully_known_detects_nan() {
        let b = PowerBounds::new(-1000.0, f64::NAN, 0.0, 1000.0);
        assert!(!b.is_fully_known());
        let b = PowerBounds::new(-1000.0, 0.0, 0.0, 1000.0);
        assert!(b.is_fully_known());
    }
}
