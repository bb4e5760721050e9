// SPDX-License-Identifier: Apache-2.0
//! In-process stand-ins for the physical robots and stations, which
//! are out of scope for this repository. Each handle logs the command
//! it receives and, after a short simulated travel/process time,
//! reports the state transition a real robot or station would have
//! reported, so the pipeline is exercisable end to end without real
//! hardware (mirrors `bins/jitosd` wiring a real kernel to a minimal
//! HTTP surface instead of real hardware).

use fabcell_dispatch::DispatcherHandle;
use fabcell_journey::JourneyOrchestrator;
use fabcell_model::{RobotId, RobotState, StationName, StationState};
use fabcell_proto::{PickupMessage, RobotHandle, StationHandle, StationMessage};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::info;

/// Simulated time a robot spends carrying a wafer between stations.
const TRAVEL_TIME: Duration = Duration::from_millis(200);
/// Simulated time a process station spends on a wafer.
const PROCESS_TIME: Duration = Duration::from_millis(300);

/// Drives one robot's `Idle -> Busy -> Carrying -> Idle` cycle after a
/// `PICKUP` command, reporting each transition back to the dispatcher.
pub struct DemoRobotHandle {
    id: RobotId,
    dispatcher: DispatcherHandle,
}

impl DemoRobotHandle {
    /// Builds a handle that reports every transition to `dispatcher`.
    pub fn new(id: RobotId, dispatcher: DispatcherHandle) -> Self {
        Self { id, dispatcher }
    }
}

impl RobotHandle for DemoRobotHandle {
    fn send_pickup(&self, msg: PickupMessage) {
        info!(robot = %self.id, wafer = %msg.wafer_id, from = %msg.from, to = %msg.to, "PICKUP");
        let dispatcher = self.dispatcher.clone();
        let id = self.id.clone();
        tokio::spawn(async move {
            let _ = dispatcher
                .update_robot_state(id.clone(), RobotState::Busy, Some(msg.wafer_id), None)
                .await;
            tokio::time::sleep(TRAVEL_TIME).await;
            let _ = dispatcher
                .update_robot_state(id.clone(), RobotState::Carrying, Some(msg.wafer_id), None)
                .await;
            tokio::time::sleep(TRAVEL_TIME).await;
            let _ = dispatcher.update_robot_state(id, RobotState::Idle, None, None).await;
        });
    }
}

/// Drives a process station's `Processing -> Done` transition after a
/// `LOAD_WAFER` command, reporting it through
/// [`JourneyOrchestrator::on_station_update`] rather than straight to
/// the dispatcher: the `Polishing`/`Cleaning` advances in spec §4.6's
/// trigger table fire only from that call, so a plain
/// `DispatcherHandle::update_station_state` would kick a dispatch cycle
/// without ever enqueuing the next leg. `Buffer`'s arrival/departure
/// pair needs no simulated delay of its own: the orchestrator treats
/// "occupied" itself as the trigger for the return leg.
///
/// The orchestrator is filled in after construction (it is itself built
/// from this handle's station map), so every `DemoStationHandle` shares
/// an [`OnceLock`] that main fills in once the orchestrator exists.
pub struct DemoStationHandle {
    station: StationName,
    orchestrator: Arc<OnceLock<JourneyOrchestrator>>,
}

impl DemoStationHandle {
    /// Builds a handle that will report completions to whichever
    /// orchestrator is later stored in `orchestrator`.
    pub fn new(station: StationName, orchestrator: Arc<OnceLock<JourneyOrchestrator>>) -> Self {
        Self { station, orchestrator }
    }
}

impl StationHandle for DemoStationHandle {
    fn send(&self, msg: StationMessage) {
        info!(station = %self.station, message = ?msg, "station command");
        if let StationMessage::LoadWafer { wafer } = msg {
            let station = self.station;
            let orchestrator = Arc::clone(&self.orchestrator);
            tokio::spawn(async move {
                tokio::time::sleep(PROCESS_TIME).await;
                if let Some(orchestrator) = orchestrator.get() {
                    orchestrator.on_station_update(station, StationState::Done, Some(wafer));
                }
            });
        }
    }
}
