// SPDX-License-Identifier: Apache-2.0
//! The journey orchestrator itself (spec §4.6).

use crate::wafer::{CarrierLot, Wafer};
use fabcell_dispatch::DispatcherHandle;
use fabcell_model::{
    CarrierLotId, JourneyStage, OnCompleted, ProcessingState, RobotId, StationName, StationState,
    TransferRequest, WaferId, RETURN_PRIORITY,
};
use fabcell_proto::{StationHandle, StationMessage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Fired once per carrier lot, on the edge transition where its final
/// wafer becomes `IsCompleted` (spec §3 invariant 7).
pub type CarrierCompletedObserver = Arc<dyn Fn(CarrierLotId) + Send + Sync>;

struct JourneyState {
    wafers: HashMap<WaferId, Wafer>,
    lot: Option<CarrierLot>,
    next_index: usize,
    station_states: HashMap<StationName, StationState>,
}

impl JourneyState {
    fn new() -> Self {
        Self {
            wafers: HashMap::new(),
            lot: None,
            next_index: 0,
            station_states: HashMap::new(),
        }
    }
}

type StationHandles = HashMap<StationName, Arc<dyn StationHandle>>;

/// Drives every wafer in the current carrier lot through its journey,
/// emitting transfer requests on the station-state triggers in spec
/// §4.6's table.
///
/// Cheap to clone: the mutable state lives behind an `Arc<Mutex<_>>`
/// shared with every in-flight `OnCompleted` closure, so a clone and
/// the orchestrator that produced it observe the same wafers.
#[derive(Clone)]
pub struct JourneyOrchestrator {
    dispatcher: DispatcherHandle,
    stations: Arc<StationHandles>,
    state: Arc<Mutex<JourneyState>>,
    observer: Option<CarrierCompletedObserver>,
}

impl JourneyOrchestrator {
    /// Builds an orchestrator over the given dispatcher handle and
    /// station delivery handles. `stations` must carry the same
    /// handles registered with the dispatcher, so `LOAD_WAFER`/
    /// `UNLOAD_WAFER`/`STORE_WAFER`/`RETRIEVE_WAFER` commands reach the
    /// same recipients as `PICKUP`.
    #[must_use]
    pub fn new(dispatcher: DispatcherHandle, stations: HashMap<StationName, Arc<dyn StationHandle>>) -> Self {
        Self {
            dispatcher,
            stations: Arc::new(stations),
            state: Arc::new(Mutex::new(JourneyState::new())),
            observer: None,
        }
    }

    /// Registers the `OnCarrierCompleted` observer.
    #[must_use]
    pub fn with_observer(mut self, observer: CarrierCompletedObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, JourneyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a carrier lot's arrival: admits its wafers at `InCarrier`
    /// and resets the next-to-start pointer to its first wafer (spec
    /// §4.6 "Carrier-lot boundary"). Immediately tries to admit the
    /// first wafer in case Polisher is already idle.
    pub fn on_carrier_arrival(&self, carrier_id: CarrierLotId, wafer_ids: Vec<WaferId>) {
        {
            let mut state = self.lock_state();
            for &id in &wafer_ids {
                state.wafers.insert(id, Wafer::fresh(id));
            }
            state.lot = Some(CarrierLot {
                id: carrier_id,
                wafer_ids,
                completed_fired: false,
            });
            state.next_index = 0;
        }
        self.try_admit_next();
    }

    /// Forwards a station-state observation to the dispatcher and, if
    /// it matches one of spec §4.6's triggers, emits the next transfer
    /// request for the affected wafer.
    pub fn on_station_update(&self, station: StationName, state: StationState, wafer_id: Option<WaferId>) {
        if let Err(e) = self.dispatcher.update_station_state_sync(station, state, wafer_id) {
            warn!(%station, error = %e, "failed to forward station update to dispatcher");
        }
        self.lock_state().station_states.insert(station, state);

        match (station, state) {
            (StationName::Polisher, StationState::Idle) => self.try_admit_next(),
            (StationName::Polisher, StationState::Done) => {
                self.try_advance(JourneyStage::Polishing, StationName::Polisher, StationName::Cleaner, RobotId::new("R2"));
            }
            (StationName::Cleaner, StationState::Done) => {
                self.try_advance(JourneyStage::Cleaning, StationName::Cleaner, StationName::Buffer, RobotId::new("R3"));
            }
            _ => {}
        }
    }

    /// Whether every wafer of the current carrier lot is `IsCompleted`.
    /// `false` with no lot recorded.
    #[must_use]
    pub fn is_current_carrier_complete(&self) -> bool {
        let state = self.lock_state();
        let Some(lot) = &state.lot else {
            return false;
        };
        lot.wafer_ids.iter().all(|id| state.wafers.get(id).is_some_and(|w| w.is_completed))
    }

    /// A snapshot of one wafer's journey state, if tracked.
    #[must_use]
    pub fn wafer(&self, id: WaferId) -> Option<Wafer> {
        self.lock_state().wafers.get(&id).copied()
    }

    /// Clears all in-flight state: the wafer map, the carrier lot, the
    /// next-to-start pointer, and cached station states (spec §4.6
    /// "Reset").
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.wafers.clear();
        state.lot = None;
        state.next_index = 0;
        state.station_states.clear();
    }

    /// Admits the next-in-carrier wafer onto `Carrier→Polisher` if
    /// Polisher is known idle and a wafer is waiting at `InCarrier`.
    fn try_admit_next(&self) {
        let wafer_id = {
            let mut state = self.lock_state();
            let polisher_idle = state.station_states.get(&StationName::Polisher) == Some(&StationState::Idle);
            if !polisher_idle {
                return;
            }
            let Some(lot) = state.lot.clone() else {
                return;
            };
            let Some(&id) = lot.wafer_ids.get(state.next_index) else {
                return;
            };
            let is_in_carrier = state.wafers.get(&id).is_some_and(|w| w.stage == JourneyStage::InCarrier);
            if !is_in_carrier {
                return;
            }
            if let Some(w) = state.wafers.get_mut(&id) {
                w.stage = JourneyStage::ToPolisher;
            }
            state.next_index += 1;
            id
        };

        let request = TransferRequest::new(wafer_id, StationName::Carrier, StationName::Polisher, self.arrival_closure(StationName::Polisher))
            .with_preferred_robot(RobotId::new("R1"));
        self.submit(request);
    }

    /// Reacts to a source station reporting `done` with the wafer at
    /// `from_stage`: sends `UNLOAD_WAFER`, enqueues the next leg, and
    /// advances the wafer to its transit stage (spec §4.6 table, rows
    /// `Polishing` and `Cleaning`).
    fn try_advance(&self, from_stage: JourneyStage, from: StationName, to: StationName, preferred: RobotId) {
        let wafer_id = {
            let mut state = self.lock_state();
            let found = state
                .wafers
                .iter_mut()
                .find(|(_, w)| w.stage == from_stage && w.current_station == from)
                .map(|(id, w)| (*id, w));
            let Some((id, wafer)) = found else {
                return;
            };
            wafer.stage = match from {
                StationName::Polisher => JourneyStage::ToCleaner,
                _ => JourneyStage::ToBuffer,
            };
            wafer.processing_state = match from {
                StationName::Polisher => ProcessingState::Polished,
                _ => ProcessingState::Cleaned,
            };
            id
        };

        if let Some(handle) = self.stations.get(&from) {
            handle.send(StationMessage::UnloadWafer);
        }

        let request = TransferRequest::new(wafer_id, from, to, self.arrival_closure(to)).with_preferred_robot(preferred);
        self.submit(request);
    }

    fn submit(&self, request: TransferRequest) {
        if let Err(e) = self.dispatcher.request_transfer_sync(request) {
            warn!(error = %e, "failed to submit journey transfer request");
        }
    }

    /// Builds the `OnCompleted` closure for a leg arriving at `dest`
    /// (spec §4.6 "`OnCompleted` semantics"). Runs synchronously inside
    /// the dispatcher's actor task, so everything it touches —
    /// marking the destination busy, sending the station command,
    /// mutating this orchestrator's own state — must be synchronous
    /// too (see [`fabcell_dispatch::DispatcherHandle::request_transfer_sync`]).
    fn arrival_closure(&self, dest: StationName) -> OnCompleted {
        let this = self.clone();
        Box::new(move |wafer_id| this.on_arrival(dest, wafer_id))
    }

    fn on_arrival(&self, dest: StationName, wafer_id: WaferId) {
        match dest {
            StationName::Carrier => self.on_arrival_at_carrier(wafer_id),
            StationName::Buffer => self.on_arrival_at_buffer(wafer_id),
            StationName::Polisher | StationName::Cleaner => self.on_arrival_at_process_station(dest, wafer_id),
        }
    }

    /// Arrival at Polisher or Cleaner: immediately mark the station
    /// busy before anything else can see it as idle, then load the
    /// wafer.
    fn on_arrival_at_process_station(&self, dest: StationName, wafer_id: WaferId) {
        let stage = match dest {
            StationName::Polisher => JourneyStage::Polishing,
            _ => JourneyStage::Cleaning,
        };
        if let Err(e) = self.dispatcher.update_station_state_sync(dest, StationState::Processing, Some(wafer_id)) {
            warn!(%dest, error = %e, "failed to mark destination busy on arrival");
        }
        {
            let mut state = self.lock_state();
            state.station_states.insert(dest, StationState::Processing);
            if let Some(w) = state.wafers.get_mut(&wafer_id) {
                w.stage = stage;
                w.current_station = dest;
            }
        }
        if let Some(handle) = self.stations.get(&dest) {
            handle.send(StationMessage::LoadWafer { wafer: wafer_id });
        }
        info!(%wafer_id, %dest, "wafer arrived at process station");
    }

    /// Arrival at Buffer: mark it occupied, store the wafer, then —
    /// since "occupied" *is* the table's trigger for the return leg,
    /// with no external "done" signal for a buffer — immediately
    /// retrieve it and enqueue `Buffer→Carrier`.
    fn on_arrival_at_buffer(&self, wafer_id: WaferId) {
        if let Err(e) = self.dispatcher.update_station_state_sync(StationName::Buffer, StationState::Occupied, Some(wafer_id)) {
            warn!(error = %e, "failed to mark buffer occupied on arrival");
        }
        {
            let mut state = self.lock_state();
            state.station_states.insert(StationName::Buffer, StationState::Occupied);
            if let Some(w) = state.wafers.get_mut(&wafer_id) {
                w.stage = JourneyStage::ToCarrier;
                w.current_station = StationName::Buffer;
            }
        }
        if let Some(handle) = self.stations.get(&StationName::Buffer) {
            handle.send(StationMessage::StoreWafer { wafer: wafer_id });
            handle.send(StationMessage::RetrieveWafer);
        }
        info!(%wafer_id, "wafer arrived at buffer, retrieving for return trip");

        let request = TransferRequest::new(wafer_id, StationName::Buffer, StationName::Carrier, self.arrival_closure(StationName::Carrier))
            .with_preferred_robot(RobotId::new("R1"))
            .with_priority(RETURN_PRIORITY);
        self.submit(request);
    }

    fn on_arrival_at_carrier(&self, wafer_id: WaferId) {
        if let Err(e) = self.dispatcher.update_station_state_sync(StationName::Buffer, StationState::Idle, None) {
            warn!(error = %e, "failed to clear buffer to idle after final leg");
        }

        let completed_lot = {
            let mut state = self.lock_state();
            state.station_states.insert(StationName::Buffer, StationState::Idle);
            if let Some(w) = state.wafers.get_mut(&wafer_id) {
                w.is_completed = true;
                w.stage = JourneyStage::InCarrier;
                w.current_station = StationName::Carrier;
            }

            let Some(lot) = state.lot.clone() else {
                return;
            };
            let all_done = lot.wafer_ids.iter().all(|id| state.wafers.get(id).is_some_and(|w| w.is_completed));
            if all_done && !lot.completed_fired {
                if let Some(l) = state.lot.as_mut() {
                    l.completed_fired = true;
                }
                Some(lot.id)
            } else {
                None
            }
        };

        info!(%wafer_id, "wafer completed its journey");
        if let Some(lot_id) = completed_lot {
            if let Some(f) = &self.observer {
                f(lot_id);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabcell_dispatch::policy::EventDrivenPolicy;
    use fabcell_model::RobotState;
    use fabcell_proto::testing::{RecordingRobotHandle, RecordingStationHandle};
    use std::time::Duration;

    const SETTLE: Duration = Duration::from_millis(10);

    struct Cell {
        dispatcher: DispatcherHandle,
        orchestrator: JourneyOrchestrator,
        robots: HashMap<&'static str, RecordingRobotHandle>,
        stations: HashMap<StationName, RecordingStationHandle>,
        completed_lots: Arc<Mutex<Vec<CarrierLotId>>>,
    }

    async fn build_cell() -> Cell {
        let (dispatcher, _join) = fabcell_dispatch::spawn(EventDrivenPolicy::new());

        let mut robots = HashMap::new();
        for name in ["R1", "R2", "R3"] {
            let handle = RecordingRobotHandle::new();
            dispatcher.register_robot(RobotId::new(name), Arc::new(handle.clone())).await.unwrap();
            robots.insert(name, handle);
        }

        let mut stations = HashMap::new();
        let mut station_handles: StationHandles = HashMap::new();
        for name in StationName::ALL {
            let handle = RecordingStationHandle::new();
            dispatcher.register_station(name, Arc::new(handle.clone()), StationState::Idle, None).await.unwrap();
            station_handles.insert(name, Arc::new(handle.clone()) as Arc<dyn StationHandle>);
            stations.insert(name, handle);
        }

        let completed_lots = Arc::new(Mutex::new(Vec::new()));
        let observer_log = Arc::clone(&completed_lots);
        let orchestrator = JourneyOrchestrator::new(dispatcher.clone(), station_handles)
            .with_observer(Arc::new(move |lot_id| observer_log.lock().unwrap_or_else(PoisonError::into_inner).push(lot_id)));

        Cell {
            dispatcher,
            orchestrator,
            robots,
            stations,
            completed_lots,
        }
    }

    /// Drives a robot through `busy(wafer) → carrying(wafer) → idle`,
    /// the transition sequence the completion tracker waits for
    /// (fabcell-dispatch spec §4.5).
    async fn complete_leg(dispatcher: &DispatcherHandle, robot: &str, wafer_id: WaferId) {
        dispatcher.update_robot_state(RobotId::new(robot), RobotState::Busy, Some(wafer_id), None).await.unwrap();
        dispatcher.update_robot_state(RobotId::new(robot), RobotState::Carrying, Some(wafer_id), None).await.unwrap();
        dispatcher.update_robot_state(RobotId::new(robot), RobotState::Idle, None, None).await.unwrap();
        tokio::time::sleep(SETTLE).await;
    }

    /// Spec §8 scenario 1: a single wafer's round trip through all four
    /// legs, driven purely by station-state triggers and completions,
    /// ending with `IsCompleted = true` and one `OnCarrierCompleted`.
    #[tokio::test]
    async fn single_wafer_round_trip_matches_seed_scenario() {
        let cell = build_cell().await;
        let wafer1 = WaferId::new(1).unwrap();

        cell.orchestrator.on_station_update(StationName::Polisher, StationState::Idle, None);
        cell.orchestrator.on_carrier_arrival(CarrierLotId::new("C1"), vec![wafer1]);
        tokio::time::sleep(SETTLE).await;

        assert_eq!(cell.robots["R1"].sent()[0].from, StationName::Carrier);
        assert_eq!(cell.robots["R1"].sent()[0].to, StationName::Polisher);
        assert_eq!(cell.dispatcher.robot_state(RobotId::new("R1")).await, "busy");

        complete_leg(&cell.dispatcher, "R1", wafer1).await;
        assert_eq!(cell.stations[&StationName::Polisher].sent().last(), Some(&StationMessage::LoadWafer { wafer: wafer1 }));
        assert_eq!(cell.orchestrator.wafer(wafer1).unwrap().stage, JourneyStage::Polishing);

        cell.orchestrator.on_station_update(StationName::Polisher, StationState::Done, Some(wafer1));
        tokio::time::sleep(SETTLE).await;
        assert_eq!(cell.stations[&StationName::Polisher].sent().last(), Some(&StationMessage::UnloadWafer));
        assert_eq!(cell.robots["R2"].sent()[0].from, StationName::Polisher);
        assert_eq!(cell.robots["R2"].sent()[0].to, StationName::Cleaner);

        complete_leg(&cell.dispatcher, "R2", wafer1).await;
        assert_eq!(cell.stations[&StationName::Cleaner].sent().last(), Some(&StationMessage::LoadWafer { wafer: wafer1 }));

        cell.orchestrator.on_station_update(StationName::Cleaner, StationState::Done, Some(wafer1));
        tokio::time::sleep(SETTLE).await;
        assert_eq!(cell.robots["R3"].sent()[0].from, StationName::Cleaner);
        assert_eq!(cell.robots["R3"].sent()[0].to, StationName::Buffer);

        complete_leg(&cell.dispatcher, "R3", wafer1).await;
        let buffer_sent = cell.stations[&StationName::Buffer].sent();
        assert!(buffer_sent.contains(&StationMessage::StoreWafer { wafer: wafer1 }));
        assert!(buffer_sent.contains(&StationMessage::RetrieveWafer));
        let r1_sent = cell.robots["R1"].sent();
        assert_eq!(r1_sent.len(), 2);
        assert_eq!(r1_sent[1].from, StationName::Buffer);
        assert_eq!(r1_sent[1].to, StationName::Carrier);

        complete_leg(&cell.dispatcher, "R1", wafer1).await;

        let wafer = cell.orchestrator.wafer(wafer1).unwrap();
        assert!(wafer.is_completed);
        assert_eq!(wafer.current_station, StationName::Carrier);
        assert!(cell.orchestrator.is_current_carrier_complete());
        assert_eq!(cell.completed_lots.lock().unwrap().as_slice(), [CarrierLotId::new("C1")]);
    }

    #[tokio::test]
    async fn reset_clears_wafers_and_lot() {
        let (dispatcher, _join) = fabcell_dispatch::spawn(EventDrivenPolicy::new());
        let orchestrator = JourneyOrchestrator::new(dispatcher, HashMap::new());
        orchestrator.on_carrier_arrival(CarrierLotId::new("C1"), vec![WaferId::new(1).unwrap()]);
        assert!(orchestrator.wafer(WaferId::new(1).unwrap()).is_some());

        orchestrator.reset();
        assert!(orchestrator.wafer(WaferId::new(1).unwrap()).is_none());
        assert!(!orchestrator.is_current_carrier_complete());
    }
}
