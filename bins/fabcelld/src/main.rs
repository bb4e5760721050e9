// SPDX-License-Identifier: Apache-2.0
//! fabcelld: the transport scheduler daemon.
//!
//! Wires a [`fabcell_dispatch::Dispatcher`] and a
//! [`fabcell_journey::JourneyOrchestrator`] to an in-process demo cell
//! and exposes a small `axum` status surface.

mod api;
mod handles;

use anyhow::{Context, Result};
use clap::Parser;
use fabcell_config::{ConfigService, FabcellConfig, FsConfigStore, PolicyKind, SETTINGS_KEY};
use fabcell_dispatch::policy::{
    EventDrivenPolicy, PheromoneWeightedPolicy, PollingPolicy, SelectiveBroadcastPolicy,
    SynchronizedBatchPolicy,
};
use fabcell_dispatch::{spawn, spawn_tick_driver, DispatcherHandle};
use fabcell_journey::JourneyOrchestrator;
use fabcell_model::{RobotId, StationName, StationState};
use fabcell_proto::StationHandle;
use handles::{DemoRobotHandle, DemoStationHandle};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Port for the HTTP status surface.
    #[clap(short, long, default_value_t = 3000)]
    api_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = load_config();
    info!(policy = ?config.policy, "starting fabcelld");

    let (dispatcher, _dispatch_join) = spawn_with_policy(&config);
    if matches!(config.policy, PolicyKind::Polling | PolicyKind::PheromoneWeighted) {
        spawn_tick_driver(dispatcher.clone(), config.poll_interval());
    }

    let orchestrator_cell: Arc<OnceLock<JourneyOrchestrator>> = Arc::new(OnceLock::new());
    let stations = register_demo_cell(&dispatcher, Arc::clone(&orchestrator_cell)).await?;
    let orchestrator = JourneyOrchestrator::new(dispatcher.clone(), stations).with_observer(Arc::new(
        |lot_id| info!(carrier = %lot_id, "carrier lot completed"),
    ));
    orchestrator.on_station_update(StationName::Polisher, StationState::Idle, None);
    let _ = orchestrator_cell.set(orchestrator.clone());

    let state = api::AppState { dispatcher, orchestrator };
    let app = api::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", args.api_port).parse::<std::net::SocketAddr>()?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP API listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

fn load_config() -> FabcellConfig {
    match FsConfigStore::new() {
        Ok(store) => ConfigService::new(store)
            .load(SETTINGS_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to load persisted config; using defaults");
                None
            })
            .unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "failed to resolve config directory; using defaults");
            FabcellConfig::default()
        }
    }
}

fn spawn_with_policy(config: &FabcellConfig) -> (DispatcherHandle, tokio::task::JoinHandle<()>) {
    match config.policy {
        PolicyKind::EventDriven => spawn(EventDrivenPolicy::new()),
        PolicyKind::Polling => spawn(PollingPolicy::new()),
        PolicyKind::SelectiveBroadcast => spawn(SelectiveBroadcastPolicy::new()),
        PolicyKind::PheromoneWeighted => spawn(PheromoneWeightedPolicy::new(config.pheromone.into())),
        PolicyKind::SynchronizedBatch => spawn(SynchronizedBatchPolicy::new()),
    }
}

/// Registers the three robots and four stations of the demo cell,
/// returning the station handle map the orchestrator needs to deliver
/// station commands directly (spec §4.6).
async fn register_demo_cell(
    dispatcher: &DispatcherHandle,
    orchestrator_cell: Arc<OnceLock<JourneyOrchestrator>>,
) -> Result<HashMap<StationName, Arc<dyn StationHandle>>> {
    for name in ["R1", "R2", "R3"] {
        let id = RobotId::new(name);
        dispatcher
            .register_robot(id.clone(), Arc::new(DemoRobotHandle::new(id, dispatcher.clone())))
            .await
            .context("registering demo robot")?;
    }

    let mut stations: HashMap<StationName, Arc<dyn StationHandle>> = HashMap::new();
    for name in StationName::ALL {
        let handle: Arc<dyn StationHandle> =
            Arc::new(DemoStationHandle::new(name, Arc::clone(&orchestrator_cell)));
        dispatcher
            .register_station(name, Arc::clone(&handle), StationState::Idle, None)
            .await
            .context("registering demo station")?;
        stations.insert(name, handle);
    }

    Ok(stations)
}
