#![allow(dead_code)]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{ComponentId, PowerBounds};

/// A single telemetry sample from an inverter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InverterSample {
    pub id: ComponentId,
    pub power_bounds: PowerBounds,
    pub timestamp: DateTime<Utc>,
}

impl InverterSample {
    pub fn is_fully_valid(&self) -> bool {
        self.power_bounds.is_fully_known()
    }

    pub fn with_neutral_substitution(&self) -> InverterSample {
        InverterSample {
            id: self.id,
            power_bounds: self.power_bounds.with_neutral_substitution(),
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_valid_requires_all_bounds_finite() {
        let s = InverterSample {
            id: 8,
            power_bounds: PowerBounds::new(-500.0, 0.0, 0.0, f64::NAN),
            timestamp: Utc::now(),
        };
        assert!(!s.is_fully_valid());
    }
}
