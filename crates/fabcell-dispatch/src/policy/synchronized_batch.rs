// SPDX-License-Identifier: Apache-2.0
//! Synchronized-batch policy (spec §4.7 "Synchronized batch").
//!
//! Dispatch only runs once every robot in the cell is idle, and a
//! single cycle may commit more than one transfer (at most one per
//! robot) before yielding. The dispatcher is responsible for gating
//! entry into a batch cycle on the all-idle precondition; this policy
//! only needs to report [`DispatchPolicy::batch_mode`] as `true` and
//! otherwise selects exactly like the event-driven reference.

use super::{DispatchPolicy, EventDrivenPolicy};
use fabcell_model::{RobotId, RouteId};

/// Selects in lexical order like [`EventDrivenPolicy`], but signals
/// the dispatcher to keep scanning the queue within one cycle instead
/// of stopping after the first dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SynchronizedBatchPolicy {
    inner: EventDrivenPolicy,
}

impl SynchronizedBatchPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchPolicy for SynchronizedBatchPolicy {
    fn choose_robot(&mut self, eligible_idle: &[RobotId], route: RouteId) -> Option<RobotId> {
        self.inner.choose_robot(eligible_idle, route)
    }

    fn batch_mode(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_batch_mode() {
        assert!(SynchronizedBatchPolicy::new().batch_mode());
    }

    #[test]
    fn selection_matches_event_driven_order() {
        let mut policy = SynchronizedBatchPolicy::new();
        let robots = vec![RobotId::new("R1"), RobotId::new("R2")];
        assert_eq!(policy.choose_robot(&robots, RouteId(0)), Some(RobotId::new("R1")));
    }
}
