// SPDX-License-Identifier: Apache-2.0
//! Completion tracker: per-robot active-transfer record (spec §4.5).

use fabcell_model::{RobotId, RouteId, TransferRequest};
use std::collections::HashMap;
use std::time::Instant;

/// A transfer currently being served by a robot.
pub struct ActiveTransfer {
    /// The request being served; its `on_completed` fires on drain.
    pub request: TransferRequest,
    /// The route it was dispatched on (fed to the policy's
    /// `on_completed` hook).
    pub route: RouteId,
    /// When the robot was committed to this transfer, used to measure
    /// completion time for policies that care (pheromone weighting).
    pub dispatched_at: Instant,
}

/// Maps a currently-busy robot to the request it is serving.
///
/// Drained on the robot's next `idle` transition. If a robot reports
/// `idle` with no tracked entry, that is treated as spurious (spec
/// §4.4 edge case) — no callback fires.
#[derive(Default)]
pub struct CompletionTracker {
    active: HashMap<RobotId, ActiveTransfer>,
}

impl CompletionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `robot_id` has just been dispatched to serve
    /// `request` on `route`.
    pub fn record(&mut self, robot_id: RobotId, request: TransferRequest, route: RouteId) {
        self.active.insert(
            robot_id,
            ActiveTransfer {
                request,
                route,
                dispatched_at: Instant::now(),
            },
        );
    }

    /// Removes and returns the active transfer for a robot that just
    /// returned to idle, if one was tracked.
    pub fn drain(&mut self, robot_id: &RobotId) -> Option<ActiveTransfer> {
        self.active.remove(robot_id)
    }

    /// Number of transfers currently in flight.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
