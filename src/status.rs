//! The battery-status collaborator. Real health evaluation
//! (degradation models, fault detection) is out of scope; this
//! module only defines the `get_working_batteries` interface the
//! eligibility filter depends on, plus a simple settable implementation.
#![allow(dead_code)]
use std::collections::HashSet;

use tokio::sync::watch;

use crate::domain::types::ComponentId;

/// Reports which batteries are currently considered healthy/reachable.
/// May return an empty set.
#[cfg_attr(test, mockall::automock)]
pub trait BatteryStatusProvider: Send + Sync {
    fn get_working_batteries(&self) -> HashSet<ComponentId>;
}

/// A `BatteryStatusProvider` backed by a `tokio::sync::watch` channel, so
/// a single external updater (the health-evaluation collaborator, out of
/// scope here) can publish the working set and the actor always reads
/// the latest value without blocking.
#[derive(Clone)]
pub struct WatchBatteryStatus {
    rx: watch::Receiver<HashSet<ComponentId>>,
}

impl WatchBatteryStatus {
    pub fn channel(
        initial: HashSet<ComponentId>,
    ) -> (watch::Sender<HashSet<ComponentId>>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self { rx })
    }
}

impl BatteryStatusProvider for WatchBatteryStatus {
    fn get_working_batteries(&self) -> HashSet<ComponentId> {
        self.rx.borrow().clone()
    }
}

/// A fixed status provider, useful in tests where the working set never
/// changes over the life of the test.
pub struct StaticBatteryStatus(pub HashSet<ComponentId>);

impl BatteryStatusProvider for StaticBatteryStatus {
    fn get_working_batteries(&self) -> HashSet<ComponentId> {
        self.0.clone()
    }
}
