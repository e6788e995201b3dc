#![allow(dead_code)]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{ComponentId, PowerBounds};

/// A bounded metric: a current value plus the lower/upper limits it must
/// stay within. Any of the three fields may be NaN ("unknown").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundedMetric {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl BoundedMetric {
    pub const fn new(value: f64, lower: f64, upper: f64) -> Self {
        Self {
            value,
            lower,
            upper,
        }
    }

    pub fn is_fully_known(&self) -> bool {
        self.value.is_finite() && self.lower.is_finite() && self.upper.is_finite()
    }

    /// Midpoint of the bound range, used as the neutral substitute for an
    /// unknown value under force-include.
    pub fn midpoint(&self) -> f64 {
        if self.lower.is_finite() && self.upper.is_finite() {
            (self.lower + self.upper) / 2.0
        } else {
            50.0
        }
    }

    /// Fill any NaN field with a neutral default: bounds default to
    /// 0..100 (percent), value defaults to their midpoint. Used under
    /// force-include when no cached value is available.
    pub fn with_neutral_substitution(&self) -> BoundedMetric {
        let lower = if self.lower.is_finite() { self.lower } else { 0.0 };
        let upper = if self.upper.is_finite() { self.upper } else { 100.0 };
        let value = if self.value.is_finite() {
            self.value
        } else {
            (lower + upper) / 2.0
        };
        BoundedMetric { value, lower, upper }
    }
}

/// Large but finite capacity sentinel substituted for a NaN capacity
/// under force-include, so the battery's headroom is never zeroed out by
/// an unknown capacity.
pub const NEUTRAL_CAPACITY_WH: f64 = 1e12;

/// A single telemetry sample from a battery.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BatterySample {
    pub id: ComponentId,
    /// State of charge, percent, with usable bounds (e.g. 20..80).
    pub soc: BoundedMetric,
    /// Usable energy capacity, watt-hours. May be NaN.
    pub capacity_wh: f64,
    pub power_bounds: PowerBounds,
    pub timestamp: DateTime<Utc>,
}

impl BatterySample {
    /// Every field the distribution algorithm reads is finite.
    pub fn is_fully_valid(&self) -> bool {
        self.soc.is_fully_known() && self.capacity_wh.is_finite() && self.power_bounds.is_fully_known()
    }

    /// Usable energy remaining for a charge (watt-hours), clamped
    /// non-negative.
    pub fn charge_headroom_wh(&self) -> f64 {
        if !self.soc.is_fully_known() || !self.capacity_wh.is_finite() {
            return 0.0;
        }
        (self.capacity_wh * (self.soc.upper - self.soc.value) / 100.0).max(0.0)
    }

    /// Usable energy remaining for a discharge (watt-hours), clamped
    /// non-negative.
    pub fn discharge_headroom_wh(&self) -> f64 {
        if !self.soc.is_fully_known() || !self.capacity_wh.is_finite() {
            return 0.0;
        }
        (self.capacity_wh * (self.soc.value - self.soc.lower) / 100.0).max(0.0)
    }

    /// Produce a fully-known sample by substituting neutral values for
    /// any NaN field (force-include path when no cached sample is
    /// available either).
    pub fn with_neutral_substitution(&self) -> BatterySample {
        BatterySample {
            id: self.id,
            soc: self.soc.with_neutral_substitution(),
            capacity_wh: if self.capacity_wh.is_finite() {
                self.capacity_wh
            } else {
                NEUTRAL_CAPACITY_WH
            },
            power_bounds: self.power_bounds.with_neutral_substitution(),
            timestamp: self.timestamp,
        }
    }
}
