// SPDX-License-Identifier: Apache-2.0
//! Robot registry (spec §3 `RobotContext`, §4.2).

use crate::error::RegistryError;
use fabcell_model::{RobotId, RobotState, WaferId};
use fabcell_proto::RobotHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// A robot's live state plus the handle used to deliver `PICKUP`.
pub struct RobotEntry {
    /// Delivery handle for this robot.
    pub handle: Arc<dyn RobotHandle>,
    /// Current lifecycle state.
    pub state: RobotState,
    /// Wafer currently held, if any.
    pub held_wafer_id: Option<WaferId>,
    /// Advisory-only hint about what the robot is waiting for.
    pub waiting_for: Option<String>,
}

/// What happened as a result of an `UpdateRobotState` call, so the
/// dispatcher can decide whether to consult the completion tracker or
/// kick a dispatch cycle (spec §4.2, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotUpdateOutcome {
    /// The robot transitioned from a non-idle state to idle.
    pub became_idle: bool,
    /// The update reported idle while holding a wafer; the held wafer
    /// was cleared and a warning logged (spec §7 `InvalidState`).
    pub invalid_state_repaired: bool,
}

/// Tracks, per robot id, current state, held wafer, and delivery handle.
#[derive(Default)]
pub struct RobotRegistry {
    robots: HashMap<RobotId, RobotEntry>,
}

impl RobotRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a robot. Idempotent when called again with the same
    /// handle (by pointer identity); returns
    /// [`RegistryError::RobotHandleConflict`] if called again with a
    /// different handle for the same id (spec §4.2).
    pub fn register(
        &mut self,
        robot_id: RobotId,
        handle: Arc<dyn RobotHandle>,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.robots.get(&robot_id) {
            if Arc::ptr_eq(&existing.handle, &handle) {
                return Ok(());
            }
            return Err(RegistryError::RobotHandleConflict(robot_id));
        }
        self.robots.insert(
            robot_id,
            RobotEntry {
                handle,
                state: RobotState::Idle,
                held_wafer_id: None,
                waiting_for: None,
            },
        );
        Ok(())
    }

    /// Updates a robot's state. Unregistered ids are silently ignored
    /// (spec §7 `MissingEntity`) and report no transition.
    pub fn update_state(
        &mut self,
        robot_id: &RobotId,
        state: RobotState,
        held_wafer_id: Option<WaferId>,
        waiting_for: Option<String>,
    ) -> RobotUpdateOutcome {
        let Some(entry) = self.robots.get_mut(robot_id) else {
            return RobotUpdateOutcome {
                became_idle: false,
                invalid_state_repaired: false,
            };
        };

        let was_idle = entry.state == RobotState::Idle;
        let mut invalid_state_repaired = false;
        let mut resolved_wafer = held_wafer_id;

        if state == RobotState::Idle && resolved_wafer.is_some() {
            warn!(
                robot = %robot_id,
                wafer = ?resolved_wafer,
                "robot reported idle while holding a wafer; clearing"
            );
            resolved_wafer = None;
            invalid_state_repaired = true;
        }

        entry.state = state;
        entry.held_wafer_id = resolved_wafer;
        entry.waiting_for = waiting_for;

        RobotUpdateOutcome {
            became_idle: state == RobotState::Idle && !was_idle,
            invalid_state_repaired,
        }
    }

    /// Marks a robot busy and carrying a wafer, as part of a dispatch
    /// commit (spec §4.4 step 8). The caller is responsible for having
    /// already verified the robot is idle and eligible.
    pub fn commit_dispatch(&mut self, robot_id: &RobotId, wafer_id: WaferId) {
        if let Some(entry) = self.robots.get_mut(robot_id) {
            entry.state = RobotState::Busy;
            entry.held_wafer_id = Some(wafer_id);
        }
    }

    /// Returns the handle for a robot, if registered.
    #[must_use]
    pub fn handle(&self, robot_id: &RobotId) -> Option<Arc<dyn RobotHandle>> {
        self.robots.get(robot_id).map(|e| Arc::clone(&e.handle))
    }

    /// Returns the current state of a robot, or `None` if unregistered.
    #[must_use]
    pub fn state(&self, robot_id: &RobotId) -> Option<RobotState> {
        self.robots.get(robot_id).map(|e| e.state)
    }

    /// Returns whether a robot is idle. Unregistered ids are never idle.
    #[must_use]
    pub fn is_idle(&self, robot_id: &RobotId) -> bool {
        self.state(robot_id) == Some(RobotState::Idle)
    }

    /// Iterates over all registered robot ids, in a fixed lexical order
    /// (spec §4.4 tie-break rule).
    pub fn ids_lexical(&self) -> Vec<RobotId> {
        let mut ids: Vec<RobotId> = self.robots.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether every registered robot is idle. `true` for an empty
    /// registry, matching the synchronized-batch precondition (spec
    /// §4.7 "Synchronized batch") — there is nothing to wait for.
    #[must_use]
    pub fn all_idle(&self) -> bool {
        self.robots.values().all(|e| e.state == RobotState::Idle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabcell_proto::testing::RecordingRobotHandle;

    fn handle() -> Arc<dyn RobotHandle> {
        Arc::new(RecordingRobotHandle::new())
    }

    #[test]
    fn register_is_idempotent_for_same_handle() {
        let mut reg = RobotRegistry::new();
        let h = handle();
        let r1 = RobotId::new("R1");
        reg.register(r1.clone(), Arc::clone(&h)).unwrap();
        reg.register(r1.clone(), Arc::clone(&h)).unwrap();
        assert!(reg.is_idle(&r1));
    }

    #[test]
    fn register_rejects_conflicting_handle() {
        let mut reg = RobotRegistry::new();
        let r1 = RobotId::new("R1");
        reg.register(r1.clone(), handle()).unwrap();
        let err = reg.register(r1.clone(), handle()).unwrap_err();
        assert_eq!(err, RegistryError::RobotHandleConflict(r1));
    }

    #[test]
    fn idle_with_wafer_is_repaired() {
        let mut reg = RobotRegistry::new();
        let r1 = RobotId::new("R1");
        reg.register(r1.clone(), handle()).unwrap();
        reg.commit_dispatch(&r1, WaferId::new(1).unwrap());

        let outcome = reg.update_state(&r1, RobotState::Idle, Some(WaferId::new(42).unwrap()), None);
        assert!(outcome.became_idle);
        assert!(outcome.invalid_state_repaired);
        assert_eq!(reg.state(&r1), Some(RobotState::Idle));
    }

    #[test]
    fn missing_entity_update_is_ignored() {
        let mut reg = RobotRegistry::new();
        let outcome = reg.update_state(&RobotId::new("ghost"), RobotState::Idle, None, None);
        assert!(!outcome.became_idle);
        assert!(reg.state(&RobotId::new("ghost")).is_none());
    }

    #[test]
    fn lexical_order_is_deterministic() {
        let mut reg = RobotRegistry::new();
        reg.register(RobotId::new("R3"), handle()).unwrap();
        reg.register(RobotId::new("R1"), handle()).unwrap();
        reg.register(RobotId::new("R2"), handle()).unwrap();
        let ids: Vec<String> = reg.ids_lexical().iter().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
    }

    #[test]
    fn all_idle_is_true_until_a_robot_is_busy() {
        let mut reg = RobotRegistry::new();
        let r1 = RobotId::new("R1");
        assert!(reg.all_idle());
        reg.register(r1.clone(), handle()).unwrap();
        assert!(reg.all_idle());
        reg.commit_dispatch(&r1, WaferId::new(1).unwrap());
        assert!(!reg.all_idle());
    }
}
