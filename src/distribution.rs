//! The distribution algorithm: clamp a target power to the
//! aggregate envelope, split it across eligible pairs proportionally to
//! headroom, clip/redistribute against each pair's own envelope, dispatch,
//! and assemble the result.
#![allow(dead_code)]
use std::collections::{HashMap, HashSet};

use crate::bounds::{aggregate_bounds, pair_bounds};
use crate::dispatch::InverterDispatch;
use crate::domain::battery::BatterySample;
use crate::domain::inverter::InverterSample;
use crate::domain::request::Request;
use crate::domain::result::Result as DistResult;
use crate::domain::types::{ComponentId, PowerBounds};

/// One battery/inverter pair eligible for this request, with its own
/// effective (intersected) power envelope precomputed.
#[derive(Debug, Clone)]
pub struct Pair {
    pub battery_id: ComponentId,
    pub inverter_id: ComponentId,
    pub battery: BatterySample,
    pub inverter: InverterSample,
    pub bounds: PowerBounds,
}

impl Pair {
    pub fn new(
        battery_id: ComponentId,
        inverter_id: ComponentId,
        battery: BatterySample,
        inverter: InverterSample,
    ) -> Self {
        let bounds = pair_bounds(&battery, &inverter);
        Self {
            battery_id,
            inverter_id,
            battery,
            inverter,
            bounds,
        }
    }
}

struct Allocation {
    shares: HashMap<ComponentId, f64>,
    excess: f64,
}

const MAX_SHARE_DRIFT_W: f64 = 1e-9;

fn clip_to_feasible(share: f64, bounds: &PowerBounds) -> f64 {
    let clamped = bounds.clamp(share);
    if !bounds.within_exclusion(clamped) {
        return clamped;
    }
    let candidates = [0.0, bounds.exclusion_lower, bounds.exclusion_upper];
    candidates
        .into_iter()
        .filter(|c| bounds.within_inclusion(*c) && !bounds.within_exclusion(*c))
        .min_by(|a, b| {
            (clamped - a)
                .abs()
                .partial_cmp(&(clamped - b).abs())
                .unwrap()
        })
        .unwrap_or(0.0)
}

/// Direction-dependent headroom: how much more a pair can carry toward
/// `target`'s sign, scaled by the battery's remaining usable energy on
/// that side. Zero if the pair has no remaining
/// capacity on that side.
fn weight(pair: &Pair, target_nonnegative: bool) -> f64 {
    let power_headroom = if target_nonnegative {
        pair.bounds.inclusion_upper.max(0.0)
    } else {
        (-pair.bounds.inclusion_lower).max(0.0)
    };
    let capacity_headroom = if target_nonnegative {
        pair.battery.charge_headroom_wh()
    } else {
        pair.battery.discharge_headroom_wh()
    };
    power_headroom * capacity_headroom
}

/// Split `target` across `pairs` proportionally to headroom, then clip
/// and redistribute against each pair's own envelope to a fixed point.
fn allocate(target: f64, pairs: &[Pair]) -> Allocation {
    if pairs.is_empty() || target == 0.0 {
        return Allocation {
            shares: pairs.iter().map(|p| (p.battery_id, 0.0)).collect(),
            excess: target,
        };
    }

    let target_nonnegative = target >= 0.0;
    let weights: HashMap<ComponentId, f64> = pairs
        .iter()
        .map(|p| (p.battery_id, weight(p, target_nonnegative)))
        .collect();
    let total_weight: f64 = weights.values().sum();

    if total_weight <= 0.0 {
        return Allocation {
            shares: pairs.iter().map(|p| (p.battery_id, 0.0)).collect(),
            excess: target,
        };
    }

    let mut shares: HashMap<ComponentId, f64> = pairs
        .iter()
        .map(|p| (p.battery_id, target * weights[&p.battery_id] / total_weight))
        .collect();

    let mut locked: HashSet<ComponentId> = HashSet::new();

    for _ in 0..pairs.len().max(1) {
        let mut residual = 0.0;
        for p in pairs {
            if locked.contains(&p.battery_id) {
                continue;
            }
            let share = shares[&p.battery_id];
            let clipped = clip_to_feasible(share, &p.bounds);
            if (clipped - share).abs() > MAX_SHARE_DRIFT_W {
                residual += share - clipped;
                shares.insert(p.battery_id, clipped);
                locked.insert(p.battery_id);
            }
        }
        if residual.abs() < MAX_SHARE_DRIFT_W {
            break;
        }
        let redistributable: Vec<&Pair> = pairs
            .iter()
            .filter(|p| !locked.contains(&p.battery_id))
            .collect();
        let redist_weight: f64 = redistributable
            .iter()
            .map(|p| weights[&p.battery_id])
            .sum();
        if redist_weight <= 0.0 {
            // Nothing left that can absorb the residual; it becomes excess.
            break;
        }
        for p in redistributable {
            *shares.get_mut(&p.battery_id).unwrap() +=
                residual * weights[&p.battery_id] / redist_weight;
        }
    }

    let placed: f64 = shares.values().sum();
    Allocation {
        shares,
        excess: target - placed,
    }
}

/// Run the full distribution algorithm for one request against one
/// snapshot of eligible pairs, dispatching the resulting setpoints and
/// assembling the final result.
pub async fn distribute(
    request: &Request,
    pairs: Vec<Pair>,
    dispatch: &dyn InverterDispatch,
) -> DistResult {
    let samples: Vec<(BatterySample, InverterSample)> = pairs
        .iter()
        .map(|p| (p.battery, p.inverter))
        .collect();
    let aggregate = aggregate_bounds(&samples);
    let power = request.power;

    // Step 1: zero power bypasses the exclusion check entirely.
    if power == 0.0 {
        return DistResult::Success {
            request: request.clone(),
            succeeded_power: 0.0,
            excess_power: 0.0,
            succeeded_batteries: pairs.iter().map(|p| p.battery_id).collect(),
            failed_batteries: HashSet::new(),
        };
    }

    if aggregate.within_exclusion(power) && aggregate.within_inclusion(power) {
        return DistResult::OutOfBounds {
            request: request.clone(),
            bounds: aggregate,
        };
    }

    // Step 2: inclusion check, clamp or reject.
    let (target, excess_from_clamp) = if !aggregate.within_inclusion(power) {
        if !request.adjust_power {
            return DistResult::OutOfBounds {
                request: request.clone(),
                bounds: aggregate,
            };
        }
        let clamped = aggregate.clamp(power);
        (clamped, power - clamped)
    } else {
        (power, 0.0)
    };

    // Steps 3-5: proportional allocation with clip/redistribute.
    let allocation = allocate(target, &pairs);

    // Step 6: dispatch every pair's setpoint and collect acknowledgments.
    let mut succeeded_power = 0.0;
    let mut failed_power = 0.0;
    let mut succeeded_batteries = HashSet::new();
    let mut failed_batteries = HashSet::new();

    for pair in &pairs {
        let setpoint = allocation.shares.get(&pair.battery_id).copied().unwrap_or(0.0);
        let ack = dispatch
            .dispatch(pair.inverter_id, setpoint, request.request_timeout)
            .await;
        if ack.accepted {
            succeeded_power += setpoint;
            succeeded_batteries.insert(pair.battery_id);
        } else {
            failed_power += setpoint;
            failed_batteries.insert(pair.battery_id);
        }
    }

    // Step 7: assemble, preserving conservation by construction.
    let excess_power = excess_from_clamp + allocation.excess;

    if failed_power == 0.0 {
        DistResult::Success {
            request: request.clone(),
            succeeded_power,
            excess_power,
            succeeded_batteries,
            failed_batteries,
        }
    } else {
        DistResult::PartialFailure {
            request: request.clone(),
            succeeded_power,
            failed_power,
            succeeded_batteries,
            failed_batteries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SimulatedDispatch;
    use crate::domain::battery::BoundedMetric;
    use chrono::Utc;
    use std::time::Duration;

    const BATTERY_BOUNDS: PowerBounds = PowerBounds::new(-1000.0, 0.0, 0.0, 1000.0);
    const INVERTER_BOUNDS: PowerBounds = PowerBounds::new(-500.0, 0.0, 0.0, 500.0);

    fn pair(battery_id: ComponentId, inverter_id: ComponentId, battery_bounds: PowerBounds) -> Pair {
        let battery = BatterySample {
            id: battery_id,
            soc: BoundedMetric::new(40.0, 20.0, 80.0),
            capacity_wh: 98000.0,
            power_bounds: battery_bounds,
            timestamp: Utc::now(),
        };
        let inverter = InverterSample {
            id: inverter_id,
            power_bounds: INVERTER_BOUNDS,
            timestamp: Utc::now(),
        };
        Pair::new(battery_id, inverter_id, battery, inverter)
    }

    fn request(power: f64, batteries: &[ComponentId]) -> Request {
        Request::new(
            "ns",
            power,
            batteries.iter().copied().collect(),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn scenario_1_proportional_split_with_clamp() {
        let pairs = vec![pair(9, 8, BATTERY_BOUNDS), pair(19, 18, BATTERY_BOUNDS)];
        let dispatch = SimulatedDispatch::new([8, 18], &[]);
        let req = request(1200.0, &[9, 19]);
        let result = distribute(&req, pairs, &dispatch).await;
        match result {
            DistResult::Success {
                succeeded_power,
                excess_power,
                ..
            } => {
                assert!((succeeded_power - 1000.0).abs() < 1e-6);
                assert!((excess_power - 200.0).abs() < 1e-6);
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scenario_2_single_surviving_pair_clamped_to_its_own_bound() {
        // Battery 9 already dropped by eligibility; only 19 remains.
        let pairs = vec![pair(19, 18, BATTERY_BOUNDS)];
        let dispatch = SimulatedDispatch::new([18], &[]);
        let req = request(1200.0, &[9, 19]);
        let result = distribute(&req, pairs, &dispatch).await;
        match result {
            DistResult::Success {
                succeeded_power,
                excess_power,
                succeeded_batteries,
                ..
            } => {
                assert!((succeeded_power - 500.0).abs() < 1e-6);
                assert!((excess_power - 700.0).abs() < 1e-6);
                assert_eq!(succeeded_batteries, HashSet::from([19]));
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scenario_3_exclusion_band_rejects_nonzero_but_passes_zero() {
        let excl_battery_bounds = PowerBounds::new(-1000.0, -300.0, 300.0, 1000.0);
        let pairs = vec![
            pair(9, 8, excl_battery_bounds),
            pair(19, 18, excl_battery_bounds),
        ];
        let dispatch = SimulatedDispatch::new([8, 18], &[]);

        let zero_req = request(0.0, &[9, 19]);
        let zero_result = distribute(&zero_req, pairs.clone(), &dispatch).await;
        match zero_result {
            DistResult::Success {
                succeeded_power,
                excess_power,
                ..
            } => {
                assert_eq!(succeeded_power, 0.0);
                assert_eq!(excess_power, 0.0);
            }
            other => panic!("expected Success for zero power, got {other:?}"),
        }

        let req = request(300.0, &[9, 19]);
        let result = distribute(&req, pairs, &dispatch).await;
        match result {
            DistResult::OutOfBounds { bounds, .. } => {
                assert_eq!(bounds, PowerBounds::new(-1000.0, -600.0, 600.0, 1000.0));
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scenario_5_no_adjust_rejects_out_of_bound_both_directions() {
        let pairs = vec![pair(9, 8, BATTERY_BOUNDS), pair(19, 18, BATTERY_BOUNDS)];
        let dispatch = SimulatedDispatch::new([8, 18], &[]);

        let mut over = request(1200.0, &[9, 19]);
        over.adjust_power = false;
        let result = distribute(&over, pairs.clone(), &dispatch).await;
        match result {
            DistResult::OutOfBounds { bounds, .. } => assert_eq!(bounds.inclusion_upper, 1000.0),
            other => panic!("expected OutOfBounds, got {other:?}"),
        }

        let mut under = request(-1200.0, &[9, 19]);
        under.adjust_power = false;
        let result = distribute(&under, pairs.clone(), &dispatch).await;
        match result {
            DistResult::OutOfBounds { bounds, .. } => assert_eq!(bounds.inclusion_lower, -1000.0),
            other => panic!("expected OutOfBounds, got {other:?}"),
        }

        let mut exact = request(1000.0, &[9, 19]);
        exact.adjust_power = false;
        let result = distribute(&exact, pairs, &dispatch).await;
        match result {
            DistResult::Success { excess_power, .. } => assert_eq!(excess_power, 0.0),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scenario_6_three_pairs_within_bounds() {
        let pairs = vec![
            pair(9, 8, BATTERY_BOUNDS),
            pair(19, 18, BATTERY_BOUNDS),
            pair(29, 28, BATTERY_BOUNDS),
        ];
        let dispatch = SimulatedDispatch::new([8, 18, 28], &[]);
        let req = request(1200.0, &[9, 19, 29]);
        let result = distribute(&req, pairs, &dispatch).await;
        match result {
            DistResult::Success {
                succeeded_power,
                excess_power,
                succeeded_batteries,
                ..
            } => {
                assert!((succeeded_power - 1200.0).abs() < 1e-6);
                assert!(excess_power.abs() < 1e-6);
                assert_eq!(succeeded_batteries, HashSet::from([9, 19, 29]));
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dispatch_failure_yields_partial_failure() {
        let pairs = vec![pair(9, 8, BATTERY_BOUNDS), pair(19, 18, BATTERY_BOUNDS)];
        // Inverter 18 is unreachable: its share becomes failed_power.
        let dispatch = SimulatedDispatch::new([8, 18], &[18]);
        let req = request(1000.0, &[9, 19]);
        let result = distribute(&req, pairs, &dispatch).await;
        match result {
            DistResult::PartialFailure {
                succeeded_power,
                failed_power,
                succeeded_batteries,
                failed_batteries,
                ..
            } => {
                assert!((succeeded_power - 500.0).abs() < 1e-6);
                assert!((failed_power - 500.0).abs() < 1e-6);
                assert_eq!(succeeded_batteries, HashSet::from([9]));
                assert_eq!(failed_batteries, HashSet::from([19]));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conservation_holds_across_clamp_and_allocation() {
        let pairs = vec![pair(9, 8, BATTERY_BOUNDS), pair(19, 18, BATTERY_BOUNDS)];
        let dispatch = SimulatedDispatch::new([8, 18], &[]);
        let req = request(1200.0, &[9, 19]);
        let result = distribute(&req, pairs, &dispatch).await;
        let (succeeded, excess, failed) = match result {
            DistResult::Success {
                succeeded_power,
                excess_power,
                ..
            } => (succeeded_power, excess_power, 0.0),
            DistResult::PartialFailure {
                succeeded_power,
                failed_power,
                ..
            } => (succeeded_power, 0.0, failed_power),
            other => panic!("unexpected {other:?}"),
        };
        assert!((succeeded + excess + failed - req.power).abs() < 1e-9);
    }
}
