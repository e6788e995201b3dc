//! Intersect requested battery IDs with
//! the "working" set, honor force-include, and drop anything the
//! telemetry cache can't usably serve.
#![allow(dead_code)]
use std::collections::HashMap;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use thiserror::Error;

use crate::cache::TelemetryCache;
use crate::distribution::Pair;
use crate::domain::request::Request;
use crate::domain::types::{ComponentCategory, ComponentId};
use crate::graph::ComponentGraph;
use crate::status::BatteryStatusProvider;

/// Rule-1 failure of the eligibility filter: a requested battery ID is
/// not in the component
/// graph at all. The `Display` impl produces the exact substring
/// (`"No battery <id>, available batteries:"`) downstream consumers
/// match on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("No battery {id}, available batteries: {available:?}")]
pub struct EligibilityError {
    pub id: ComponentId,
    pub available: Vec<ComponentId>,
}

/// Apply the eligibility rules in order and resolve each surviving
/// battery/inverter ID into its `Pair`, reading the telemetry cache
/// exactly once per ID so the whole request distributes against one
/// consistent snapshot. Returns an `EligibilityError` (rule 1, an
/// unknown battery ID), whose `Display`/`to_string()` is the literal
/// message surfaced on the `Result::Error` variant.
pub async fn filter(
    request: &Request,
    graph: &dyn ComponentGraph,
    status: &dyn BatteryStatusProvider,
    cache: &TelemetryCache,
    bat_inv_map: &HashMap<ComponentId, ComponentId>,
    now: DateTime<Utc>,
) -> std::result::Result<Vec<Pair>, EligibilityError> {
    let known: HashSet<ComponentId> = graph
        .components(ComponentCategory::Battery)
        .into_iter()
        .map(|c| c.id)
        .collect();

    // Rule 1: any requested ID absent from the graph is fatal.
    for id in &request.batteries {
        if !known.contains(id) {
            return Err(EligibilityError {
                id: *id,
                available: known.iter().copied().sorted().collect(),
            });
        }
    }

    // Rule 2: intersect with the working set.
    let working_set = status.get_working_batteries();
    let working: HashSet<ComponentId> = request
        .batteries
        .intersection(&working_set)
        .copied()
        .collect();

    // Rules 3-5.
    let eligible = if request.include_broken_batteries {
        request.batteries.clone()
    } else if working.is_empty() {
        // Soft fallback: disjoint
        // or empty working set does not error, it falls back to the
        // full requested set, which distribution/cache validity may then
        // filter further.
        request.batteries.clone()
    } else {
        working
    };

    // Rule 6: resolve each candidate against the telemetry cache, once,
    // dropping anything it can't usably serve.
    let mut pairs = Vec::new();
    for id in eligible {
        let Some(&inverter_id) = bat_inv_map.get(&id) else {
            continue;
        };
        let (battery, inverter) = cache
            .get_for_distribution(id, inverter_id, request.include_broken_batteries, now)
            .await;
        if let (Some(battery), Some(inverter)) = (battery, inverter) {
            pairs.push(Pair::new(id, inverter_id, battery, inverter));
        }
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::battery::BoundedMetric;
    use crate::domain::inverter::InverterSample;
    use crate::domain::request::Request;
    use crate::domain::types::PowerBounds;
    use crate::graph::StaticComponentGraph;
    use crate::status::StaticBatteryStatus;
    use std::time::Duration;

    fn graph() -> StaticComponentGraph {
        StaticComponentGraph::builder()
            .component(9, ComponentCategory::Battery)
            .component(8, ComponentCategory::Inverter)
            .battery_inverter_pair(9, 8)
            .component(19, ComponentCategory::Battery)
            .component(18, ComponentCategory::Inverter)
            .battery_inverter_pair(19, 18)
            .build()
    }

    fn bat_inv_map() -> HashMap<ComponentId, ComponentId> {
        HashMap::from([(9, 8), (19, 18)])
    }

    fn battery_ids(pairs: &[Pair]) -> HashSet<ComponentId> {
        pairs.iter().map(|p| p.battery_id).collect()
    }

    async fn primed_cache() -> TelemetryCache {
        let cache = TelemetryCache::new(None);
        let now = Utc::now();
        for (b, i) in [(9, 8), (19, 18)] {
            cache
                .put_battery(crate::domain::battery::BatterySample {
                    id: b,
                    soc: BoundedMetric::new(40.0, 20.0, 80.0),
                    capacity_wh: 98000.0,
                    power_bounds: PowerBounds::new(-1000.0, 0.0, 0.0, 1000.0),
                    timestamp: now,
                })
                .await;
            cache
                .put_inverter(InverterSample {
                    id: i,
                    power_bounds: PowerBounds::new(-500.0, 0.0, 0.0, 500.0),
                    timestamp: now,
                })
                .await;
        }
        cache
    }

    #[tokio::test]
    async fn unknown_battery_is_an_error() {
        let graph = graph();
        let status = StaticBatteryStatus(HashSet::from([9, 19]));
        let cache = primed_cache().await;
        let req = Request::new("ns", 1200.0, HashSet::from([9, 100]), Duration::from_secs(1));
        let result = filter(&req, &graph, &status, &cache, &bat_inv_map(), Utc::now()).await;
        let err = result.unwrap_err();
        assert_eq!(err.id, 100);
        assert!(err.to_string().contains("No battery 100, available batteries:"));
    }

    #[tokio::test]
    async fn disjoint_working_set_falls_back_to_requested() {
        let graph = graph();
        // Working set disjoint from the request.
        let status = StaticBatteryStatus(HashSet::from([29]));
        let cache = primed_cache().await;
        let req = Request::new("ns", 1200.0, HashSet::from([9, 19]), Duration::from_secs(1));
        let pairs = filter(&req, &graph, &status, &cache, &bat_inv_map(), Utc::now())
            .await
            .unwrap();
        assert_eq!(battery_ids(&pairs), HashSet::from([9, 19]));
    }

    #[tokio::test]
    async fn mocked_status_provider_empty_working_set_falls_back_to_requested() {
        use crate::status::MockBatteryStatusProvider;

        let graph = graph();
        let cache = primed_cache().await;
        let mut status = MockBatteryStatusProvider::new();
        status
            .expect_get_working_batteries()
            .returning(|| HashSet::new());
        let req = Request::new("ns", 1200.0, HashSet::from([9, 19]), Duration::from_secs(1));
        let pairs = filter(&req, &graph, &status, &cache, &bat_inv_map(), Utc::now())
            .await
            .unwrap();
        assert_eq!(battery_ids(&pairs), HashSet::from([9, 19]));
    }

    #[tokio::test]
    async fn unusable_telemetry_is_dropped() {
        let graph = graph();
        let status = StaticBatteryStatus(HashSet::from([9, 19]));
        let cache = TelemetryCache::new(None);
        // Only prime battery 19; battery 9 has no telemetry at all.
        cache
            .put_battery(crate::domain::battery::BatterySample {
                id: 19,
                soc: BoundedMetric::new(40.0, 20.0, 80.0),
                capacity_wh: 98000.0,
                power_bounds: PowerBounds::new(-1000.0, 0.0, 0.0, 1000.0),
                timestamp: Utc::now(),
            })
            .await;
        cache
            .put_inverter(InverterSample {
                id: 18,
                power_bounds: PowerBounds::new(-500.0, 0.0, 0.0, 500.0),
                timestamp: Utc::now(),
            })
            .await;
        let req = Request::new("ns", 1200.0, HashSet::from([9, 19]), Duration::from_secs(1));
        let pairs = filter(&req, &graph, &status, &cache, &bat_inv_map(), Utc::now())
            .await
            .unwrap();
        assert_eq!(battery_ids(&pairs), HashSet::from([19]));
    }
}
