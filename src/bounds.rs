//! Aggregate power envelope solver. Each battery/inverter
//! pair must individually agree on the power it carries, then the whole
//! request is bounded by the sum of what every pair can carry.
#![allow(dead_code)]
use crate::domain::battery::BatterySample;
use crate::domain::inverter::InverterSample;
use crate::domain::types::PowerBounds;

/// Per-pair intersection: the battery and the inverter behind it must
/// both accept the flow, so their inclusion envelopes intersect and
/// their exclusion bands union.
pub fn pair_bounds(battery: &BatterySample, inverter: &InverterSample) -> PowerBounds {
    battery.power_bounds.intersect_pair(&inverter.power_bounds)
}

/// Sum the per-pair bounds of every eligible pair into one aggregate
/// envelope for the whole request. An empty pair list
/// aggregates to an envelope of exactly zero.
pub fn aggregate_bounds(pairs: &[(BatterySample, InverterSample)]) -> PowerBounds {
    pairs.iter().fold(
        PowerBounds::new(0.0, 0.0, 0.0, 0.0),
        |acc, (battery, inverter)| {
            let pair = pair_bounds(battery, inverter);
            PowerBounds::new(
                acc.inclusion_lower + pair.inclusion_lower,
                acc.exclusion_lower + pair.exclusion_lower,
                acc.exclusion_upper + pair.exclusion_upper,
                acc.inclusion_upper + pair.inclusion_upper,
            )
        },
    )
}
