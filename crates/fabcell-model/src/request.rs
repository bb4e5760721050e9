// SPDX-License-Identifier: Apache-2.0
//! The `TransferRequest` that flows from the journey orchestrator into
//! the dispatcher (spec §3).

use crate::{RobotId, StationName, WaferId};
use std::fmt;

/// Default priority for an ordinary forward-pipeline leg.
pub const DEFAULT_PRIORITY: i32 = 1;
/// Priority used for the final Buffer→Carrier leg (spec §4.6).
pub const RETURN_PRIORITY: i32 = 2;

/// Invoked exactly once, after the serving robot returns to idle
/// (spec §3, §4.5). Boxed so callers can close over orchestrator state.
pub type OnCompleted = Box<dyn FnOnce(WaferId) + Send + 'static>;

/// A request to move one wafer from one station to another.
///
/// Consumed at most once by the dispatcher: either it is rejected at
/// submission (`InvalidRoute`) or it is dispatched exactly once.
pub struct TransferRequest {
    /// The wafer to move.
    pub wafer_id: WaferId,
    /// Source station.
    pub from: StationName,
    /// Destination station.
    pub to: StationName,
    /// Higher values are served earlier within the bypass window.
    pub priority: i32,
    /// If set, only this robot may serve the request.
    pub preferred_robot_id: Option<RobotId>,
    /// Fired once the serving robot returns to idle.
    pub on_completed: OnCompleted,
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("wafer_id", &self.wafer_id)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("priority", &self.priority)
            .field("preferred_robot_id", &self.preferred_robot_id)
            .finish_non_exhaustive()
    }
}

impl TransferRequest {
    /// Builds a request with the default priority and no preferred robot.
    pub fn new(
        wafer_id: WaferId,
        from: StationName,
        to: StationName,
        on_completed: OnCompleted,
    ) -> Self {
        Self {
            wafer_id,
            from,
            to,
            priority: DEFAULT_PRIORITY,
            preferred_robot_id: None,
            on_completed,
        }
    }

    /// Sets a preferred robot; no other robot may serve this request.
    #[must_use]
    pub fn with_preferred_robot(mut self, robot_id: RobotId) -> Self {
        self.preferred_robot_id = Some(robot_id);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}
