use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use power_distribution_core::actor::PowerDistributingActor;
use power_distribution_core::cache::TelemetryCache;
use power_distribution_core::config::{self, AppConfig};
use power_distribution_core::dispatch::{InverterDispatch, SimulatedDispatch};
use power_distribution_core::domain::battery::{BatterySample, BoundedMetric};
use power_distribution_core::domain::inverter::InverterSample;
use power_distribution_core::domain::request::Request;
use power_distribution_core::domain::types::{ComponentCategory, PowerBounds};
use power_distribution_core::graph::{ComponentGraph, StaticComponentGraph};
use power_distribution_core::router::ResultRouter;
use power_distribution_core::status::{BatteryStatusProvider, StaticBatteryStatus};
use power_distribution_core::telemetry;

/// Demo wiring: a single house with three battery/inverter pairs,
/// driven by one request, so the whole pipeline (graph -> eligibility ->
/// bounds -> distribution -> dispatch -> router) can be exercised
/// end-to-end without any real hardware.
#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = AppConfig::load().unwrap_or_else(|err| {
        warn!(%err, "no config file found, using defaults");
        AppConfig {
            actor: config::ActorConfig::default(),
            telemetry: config::TelemetryConfig::default(),
        }
    });

    let graph: Arc<dyn ComponentGraph> = Arc::new(
        StaticComponentGraph::builder()
            .component(9, ComponentCategory::Battery)
            .component(8, ComponentCategory::Inverter)
            .battery_inverter_pair(9, 8)
            .component(19, ComponentCategory::Battery)
            .component(18, ComponentCategory::Inverter)
            .battery_inverter_pair(19, 18)
            .component(29, ComponentCategory::Battery)
            .component(28, ComponentCategory::Inverter)
            .battery_inverter_pair(29, 28)
            .build(),
    );

    let status: Arc<dyn BatteryStatusProvider> =
        Arc::new(StaticBatteryStatus(HashSet::from([9, 19, 29])));

    let cache = TelemetryCache::new(cfg.actor.max_telemetry_age());
    let now = chrono::Utc::now();
    for (battery_id, inverter_id) in [(9, 8), (19, 18), (29, 28)] {
        cache
            .put_battery(BatterySample {
                id: battery_id,
                soc: BoundedMetric::new(40.0, 20.0, 80.0),
                capacity_wh: 98_000.0,
                power_bounds: PowerBounds::new(-1000.0, 0.0, 0.0, 1000.0),
                timestamp: now,
            })
            .await;
        cache
            .put_inverter(InverterSample {
                id: inverter_id,
                power_bounds: PowerBounds::new(-500.0, 0.0, 0.0, 500.0),
                timestamp: now,
            })
            .await;
    }

    let dispatch: Arc<dyn InverterDispatch> = Arc::new(SimulatedDispatch::new([8, 18, 28], &[]));
    let router = ResultRouter::new(cfg.actor.result_channel_capacity);
    let (requests_tx, requests_rx) = mpsc::channel(cfg.actor.request_channel_capacity);

    let mut results = router.subscribe("house-1");
    let actor = PowerDistributingActor::new(graph, status, cache, dispatch, router, requests_rx);
    let actor_handle = tokio::spawn(actor.run());

    let request = Request::new(
        "house-1",
        1200.0,
        HashSet::from([9, 19, 29]),
        Duration::from_millis(cfg.actor.default_request_timeout_ms),
    );
    requests_tx.send(request).await?;
    drop(requests_tx);

    if let Ok(result) = results.recv().await {
        info!(?result, "power distribution result");
    }

    tokio::select! {
        _ = actor_handle => {}
        _ = telemetry::shutdown_signal() => {}
    }

    Ok(())
}
