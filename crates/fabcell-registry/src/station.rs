// SPDX-License-Identifier: Apache-2.0
//! Station registry (spec §3 `StationContext`, §4.2).

use crate::error::RegistryError;
use fabcell_model::{StationName, StationState, WaferId};
use fabcell_proto::StationHandle;
use std::collections::HashMap;
use std::sync::Arc;

/// A station's live state plus the handle used to deliver station
/// commands.
pub struct StationEntry {
    /// Delivery handle for this station.
    pub handle: Arc<dyn StationHandle>,
    /// Current process state.
    pub state: StationState,
    /// Wafer currently held, if any.
    pub current_wafer: Option<WaferId>,
}

/// What happened as a result of an `UpdateStationState` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationUpdateOutcome {
    /// The update moved the station into `done` or `occupied`, which
    /// kicks a dispatch cycle (spec §4.2).
    pub entered_done_or_occupied: bool,
}

/// Tracks, per station name, current state, held wafer, and handle.
#[derive(Default)]
pub struct StationRegistry {
    stations: HashMap<StationName, StationEntry>,
}

impl StationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a station with an initial state and optional wafer. A
    /// register with a wafer already present sets initial state
    /// accordingly and fires no callbacks (spec §4.4 edge case).
    /// Idempotent when the arguments exactly match an existing entry.
    pub fn register(
        &mut self,
        station: StationName,
        handle: Arc<dyn StationHandle>,
        initial_state: StationState,
        wafer: Option<WaferId>,
    ) {
        if let Some(existing) = self.stations.get(&station) {
            if existing.state == initial_state && existing.current_wafer == wafer {
                return;
            }
        }
        self.stations.insert(
            station,
            StationEntry {
                handle,
                state: initial_state,
                current_wafer: wafer,
            },
        );
    }

    /// Updates a station's state. Unregistered names are silently
    /// ignored (spec §7 `MissingEntity`). Rejects an arrival that would
    /// overwrite a different wafer already present (spec §7
    /// `StationBusy`) without mutating the entry.
    pub fn update_state(
        &mut self,
        station: StationName,
        state: StationState,
        wafer_id: Option<WaferId>,
    ) -> Result<StationUpdateOutcome, RegistryError> {
        let Some(entry) = self.stations.get_mut(&station) else {
            return Ok(StationUpdateOutcome {
                entered_done_or_occupied: false,
            });
        };

        if let (Some(current), Some(incoming)) = (entry.current_wafer, wafer_id) {
            if current != incoming && state.requires_wafer() {
                return Err(RegistryError::StationBusy(station));
            }
        }

        let was_done_or_occupied =
            matches!(entry.state, StationState::Done | StationState::Occupied);
        entry.state = state;
        entry.current_wafer = wafer_id;

        let entered_done_or_occupied =
            matches!(state, StationState::Done | StationState::Occupied) && !was_done_or_occupied;

        Ok(StationUpdateOutcome {
            entered_done_or_occupied,
        })
    }

    /// Returns the handle for a station, if registered.
    #[must_use]
    pub fn handle(&self, station: StationName) -> Option<Arc<dyn StationHandle>> {
        self.stations.get(&station).map(|e| Arc::clone(&e.handle))
    }

    /// Returns the current state of a station, or `None` if unregistered.
    #[must_use]
    pub fn state(&self, station: StationName) -> Option<StationState> {
        self.stations.get(&station).map(|e| e.state)
    }

    /// Returns the wafer currently held by a station, if any.
    #[must_use]
    pub fn current_wafer(&self, station: StationName) -> Option<WaferId> {
        self.stations.get(&station).and_then(|e| e.current_wafer)
    }

    /// Whether `from` is ready to act as a transfer source (spec §4.4
    /// step 4): `Carrier` is always ready; `Polisher`/`Cleaner` need
    /// `done` or `idle`; `Buffer` needs `occupied`.
    #[must_use]
    pub fn source_ready(&self, from: StationName) -> bool {
        match from {
            StationName::Carrier => true,
            StationName::Polisher | StationName::Cleaner => matches!(
                self.state(from),
                Some(StationState::Done | StationState::Idle)
            ),
            StationName::Buffer => self.state(from) == Some(StationState::Occupied),
        }
    }

    /// Whether `to` is ready to act as a transfer destination (spec
    /// §4.4 step 4): `Carrier` is always ready; anything else must be
    /// `idle`.
    #[must_use]
    pub fn destination_ready(&self, to: StationName) -> bool {
        match to {
            StationName::Carrier => true,
            _ => self.state(to) == Some(StationState::Idle),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabcell_proto::testing::RecordingStationHandle;

    fn handle() -> Arc<dyn StationHandle> {
        Arc::new(RecordingStationHandle::new())
    }

    #[test]
    fn register_is_idempotent_for_identical_args() {
        let mut reg = StationRegistry::new();
        reg.register(StationName::Polisher, handle(), StationState::Idle, None);
        reg.register(StationName::Polisher, handle(), StationState::Idle, None);
        assert_eq!(reg.state(StationName::Polisher), Some(StationState::Idle));
    }

    #[test]
    fn source_readiness_matches_spec() {
        let mut reg = StationRegistry::new();
        reg.register(StationName::Carrier, handle(), StationState::Idle, None);
        reg.register(
            StationName::Polisher,
            handle(),
            StationState::Processing,
            Some(WaferId::new(1).unwrap()),
        );
        reg.register(
            StationName::Buffer,
            handle(),
            StationState::Occupied,
            Some(WaferId::new(2).unwrap()),
        );

        assert!(reg.source_ready(StationName::Carrier));
        assert!(!reg.source_ready(StationName::Polisher));
        assert!(reg.source_ready(StationName::Buffer));

        reg.update_state(StationName::Polisher, StationState::Done, Some(WaferId::new(1).unwrap()))
            .unwrap();
        assert!(reg.source_ready(StationName::Polisher));
    }

    #[test]
    fn destination_readiness_matches_spec() {
        let mut reg = StationRegistry::new();
        reg.register(StationName::Polisher, handle(), StationState::Idle, None);
        assert!(reg.destination_ready(StationName::Polisher));
        assert!(reg.destination_ready(StationName::Carrier));
    }

    #[test]
    fn station_busy_rejects_overwrite_of_different_wafer() {
        let mut reg = StationRegistry::new();
        reg.register(
            StationName::Buffer,
            handle(),
            StationState::Occupied,
            Some(WaferId::new(1).unwrap()),
        );
        let err = reg
            .update_state(
                StationName::Buffer,
                StationState::Occupied,
                Some(WaferId::new(2).unwrap()),
            )
            .unwrap_err();
        assert_eq!(err, RegistryError::StationBusy(StationName::Buffer));
        // original wafer must be untouched
        assert_eq!(reg.current_wafer(StationName::Buffer), Some(WaferId::new(1).unwrap()));
    }

    #[test]
    fn entering_done_is_reported_once() {
        let mut reg = StationRegistry::new();
        reg.register(
            StationName::Polisher,
            handle(),
            StationState::Processing,
            Some(WaferId::new(1).unwrap()),
        );
        let outcome = reg
            .update_state(StationName::Polisher, StationState::Done, Some(WaferId::new(1).unwrap()))
            .unwrap();
        assert!(outcome.entered_done_or_occupied);

        let outcome2 = reg
            .update_state(StationName::Polisher, StationState::Done, Some(WaferId::new(1).unwrap()))
            .unwrap();
        assert!(!outcome2.entered_done_or_occupied);
    }

    #[test]
    fn missing_entity_update_is_ignored() {
        let mut reg = StationRegistry::new();
        let outcome = reg
            .update_state(StationName::Carrier, StationState::Idle, None)
            .unwrap();
        assert!(!outcome.entered_done_or_occupied);
    }
}
