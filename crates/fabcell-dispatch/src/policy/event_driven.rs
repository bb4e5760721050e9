// SPDX-License-Identifier: Apache-2.0
//! The reference policy: fires on kick, dispatches at most one request
//! per cycle, tie-breaks lexically (spec §4.7 "Event-driven immediate").

use super::DispatchPolicy;
use fabcell_model::{RobotId, RouteId};

/// Picks the first idle, eligible robot in lexical order. No state.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventDrivenPolicy;

impl EventDrivenPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DispatchPolicy for EventDrivenPolicy {
    fn choose_robot(&mut self, eligible_idle: &[RobotId], _route: RouteId) -> Option<RobotId> {
        eligible_idle.first().cloned()
    }
}
