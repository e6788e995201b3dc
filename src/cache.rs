//! Per-component rolling view of the latest battery/inverter telemetry
//! The cache is the only shared mutable resource the actor
//! touches; it is single-writer-per-ID, many-reader, matching the
//! `Arc<RwLock<...>>` state-guarding idiom used for each
//! simulated device.
#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::battery::BatterySample;
use crate::domain::inverter::InverterSample;
use crate::domain::types::ComponentId;

#[derive(Debug, Clone, Copy)]
struct CacheEntry<T> {
    latest: T,
    latest_valid: Option<T>,
}

/// Rolling telemetry cache, shared across the telemetry producer tasks
/// and the request serializer actor.
#[derive(Clone)]
pub struct TelemetryCache {
    batteries: Arc<RwLock<HashMap<ComponentId, CacheEntry<BatterySample>>>>,
    inverters: Arc<RwLock<HashMap<ComponentId, CacheEntry<InverterSample>>>>,
    /// Staleness threshold. `None` disables staleness checking
    /// entirely, which is the default; a production deployment opts in
    /// via `Config::max_telemetry_age`.
    max_age: Option<chrono::Duration>,
}

impl TelemetryCache {
    pub fn new(max_age: Option<chrono::Duration>) -> Self {
        Self {
            batteries: Arc::new(RwLock::new(HashMap::new())),
            inverters: Arc::new(RwLock::new(HashMap::new())),
            max_age,
        }
    }

    fn is_fresh(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.max_age {
            None => true,
            Some(max_age) => now.signed_duration_since(timestamp) <= max_age,
        }
    }

    /// Idempotent on identical payload; monotonic by arrival - the
    /// newest sample to arrive always replaces the previous one
    /// regardless of its own timestamp.
    pub async fn put_battery(&self, sample: BatterySample) {
        let mut map = self.batteries.write().await;
        let entry = map.entry(sample.id).or_insert(CacheEntry {
            latest: sample,
            latest_valid: None,
        });
        entry.latest = sample;
        if sample.is_fully_valid() {
            entry.latest_valid = Some(sample);
        }
    }

    pub async fn put_inverter(&self, sample: InverterSample) {
        let mut map = self.inverters.write().await;
        let entry = map.entry(sample.id).or_insert(CacheEntry {
            latest: sample,
            latest_valid: None,
        });
        entry.latest = sample;
        if sample.is_fully_valid() {
            entry.latest_valid = Some(sample);
        }
    }

    /// Resolve the sample to use for distribution for one battery/inverter
    /// pair, honoring the force-include fallback chain.
    pub async fn get_for_distribution(
        &self,
        battery_id: ComponentId,
        inverter_id: ComponentId,
        include_broken: bool,
        now: DateTime<Utc>,
    ) -> (Option<BatterySample>, Option<InverterSample>) {
        let battery = {
            let map = self.batteries.read().await;
            map.get(&battery_id)
                .and_then(|entry| self.resolve(entry, include_broken, now))
        };
        let inverter = {
            let map = self.inverters.read().await;
            map.get(&inverter_id)
                .and_then(|entry| self.resolve(entry, include_broken, now))
        };
        (battery, inverter)
    }

    fn resolve<T>(&self, entry: &CacheEntry<T>, include_broken: bool, now: DateTime<Utc>) -> Option<T>
    where
        T: Copy + Validatable + Timestamped + NeutralSubstitutable,
    {
        if self.is_fresh(entry.latest.timestamp(), now) && entry.latest.is_fully_valid() {
            return Some(entry.latest);
        }
        if !include_broken {
            return None;
        }
        if let Some(valid) = entry.latest_valid {
            if self.is_fresh(valid.timestamp(), now) {
                return Some(valid);
            }
        }
        Some(entry.latest.with_neutral_substitution())
    }
}

trait Validatable {
    fn is_fully_valid(&self) -> bool;
}

trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

trait NeutralSubstitutable {
    fn with_neutral_substitution(&self) -> Self;
}

impl Validatable for BatterySample {
    fn is_fully_valid(&self) -> bool {
        BatterySample::is_fully_valid(self)
    }
}
impl Timestamped for BatterySample {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
impl NeutralSubstitutable for BatterySample {
    fn with_neutral_substitution(&self) -> Self {
        BatterySample::with_neutral_substitution(self)
    }
}

impl Validatable for InverterSample {
    fn is_fully_valid(&self) -> bool {
        InverterSample::is_fully_valid(self)
    }
}
impl Timestamped for InverterSample {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
impl NeutralSubstitutable for InverterSample {
    fn with_neutral_substitution(&self) -> Self {
        InverterSample::with_neutral_substitution(self)
    }
}
