// SPDX-License-Identifier: Apache-2.0
//! Periodic-poll policy: same decisions as the event-driven reference,
//! but meant to be driven by [`crate::spawn_tick_driver`] on a fixed
//! cadence rather than purely by kicks (spec §4.7 "Periodic poll").
//!
//! The original fleet ran one fiber per robot tickling a pull-mode
//! loop; under this workspace's serial-processor design a single
//! external tick driver produces the same observable cadence without
//! the extra fibers, since only one cycle can ever be in flight at a
//! time regardless of how many robots exist.

use super::{DispatchPolicy, EventDrivenPolicy};
use fabcell_model::{RobotId, RouteId};

/// Reference poll interval (spec §4.7).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Delegates robot selection to [`EventDrivenPolicy`]; exists as a
/// distinct type so the daemon can select "poll-driven" at startup and
/// so tests can assert which policy is active without inspecting
/// internal state.
#[derive(Debug, Default, Clone, Copy)]
pub struct PollingPolicy {
    inner: EventDrivenPolicy,
}

impl PollingPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchPolicy for PollingPolicy {
    fn choose_robot(&mut self, eligible_idle: &[RobotId], route: RouteId) -> Option<RobotId> {
        self.inner.choose_robot(eligible_idle, route)
    }
}
