//! The single task that owns the
//! request stream, turning each `Request` into exactly one `Result` via
//! resolve -> solve -> distribute -> publish, strictly sequentially.
#![allow(dead_code)]
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use itertools::Itertools;
use tokio::sync::mpsc;
use tracing::info;

use crate::cache::TelemetryCache;
use crate::dispatch::InverterDispatch;
use crate::distribution;
use crate::domain::request::Request;
use crate::domain::result::Result as DistResult;
use crate::domain::types::{ComponentCategory, ComponentId};
use crate::eligibility;
use crate::graph::ComponentGraph;
use crate::router::ResultRouter;
use crate::status::BatteryStatusProvider;

/// Owns the battery<->inverter adjacency (fixed for its lifetime) and
/// the collaborators it needs to turn requests into results.
pub struct PowerDistributingActor {
    graph: Arc<dyn ComponentGraph>,
    status: Arc<dyn BatteryStatusProvider>,
    cache: TelemetryCache,
    dispatch: Arc<dyn InverterDispatch>,
    router: ResultRouter,
    requests_rx: mpsc::Receiver<Request>,
    bat_inv_map: HashMap<ComponentId, ComponentId>,
    inv_bat_map: HashMap<ComponentId, ComponentId>,
}

impl PowerDistributingActor {
    /// Builds `bat_inv_map`/`inv_bat_map` once, from the graph's
    /// battery->inverter adjacency, at construction (the
    /// mapping is fixed for the actor's lifetime).
    pub fn new(
        graph: Arc<dyn ComponentGraph>,
        status: Arc<dyn BatteryStatusProvider>,
        cache: TelemetryCache,
        dispatch: Arc<dyn InverterDispatch>,
        router: ResultRouter,
        requests_rx: mpsc::Receiver<Request>,
    ) -> Self {
        let mut bat_inv_map = HashMap::new();
        let mut inv_bat_map = HashMap::new();
        for battery in graph.components(ComponentCategory::Battery) {
            if let Some(inverter) = graph
                .successors(battery.id)
                .into_iter()
                .find(|c| c.category == ComponentCategory::Inverter)
            {
                bat_inv_map.insert(battery.id, inverter.id);
                inv_bat_map.insert(inverter.id, battery.id);
            }
        }
        Self {
            graph,
            status,
            cache,
            dispatch,
            router,
            requests_rx,
            bat_inv_map,
            inv_bat_map,
        }
    }

    pub fn bat_inv_map(&self) -> &HashMap<ComponentId, ComponentId> {
        &self.bat_inv_map
    }

    pub fn inv_bat_map(&self) -> &HashMap<ComponentId, ComponentId> {
        &self.inv_bat_map
    }

    /// Drive the actor to completion: process requests strictly
    /// sequentially until the request stream closes, then return. The
    /// caller is expected to `tokio::spawn` this.
    pub async fn run(mut self) {
        info!("power distributing actor started");
        while let Some(request) = self.requests_rx.recv().await {
            self.handle_request(request).await;
        }
        info!("power distributing actor shutting down, request stream closed");
    }

    async fn handle_request(&self, request: Request) {
        let now = Utc::now();

        // `now` also bounds the telemetry snapshot `eligibility::filter`
        // resolves each pair against, so the whole request distributes
        // over one consistent read of the cache.
        let pairs = match eligibility::filter(
            &request,
            self.graph.as_ref(),
            self.status.as_ref(),
            &self.cache,
            &self.bat_inv_map,
            now,
        )
        .await
        {
            Ok(pairs) => pairs,
            Err(err) => {
                self.publish(DistResult::Error {
                    request,
                    msg: err.to_string(),
                });
                return;
            }
        };

        if pairs.is_empty() && !request.include_broken_batteries {
            let known: HashSet<ComponentId> = self
                .graph
                .components(ComponentCategory::Battery)
                .into_iter()
                .map(|c| c.id)
                .collect();
            let ids: Vec<ComponentId> = known.into_iter().sorted().collect();
            self.publish(DistResult::Error {
                request,
                msg: format!(
                    "no eligible battery/inverter pair survived filtering, known batteries: {ids:?}"
                ),
            });
            return;
        }

        let result = distribution::distribute(&request, pairs, self.dispatch.as_ref()).await;
        self.publish(result);
    }

    fn publish(&self, result: DistResult) {
        self.router.publish(result);
    }
}
