// SPDX-License-Identifier: Apache-2.0
//! Selective-broadcast ("ant-colony") policy (spec §4.7).
//!
//! In the original design, robots subscribe to a work pool and the
//! pool notifies exactly the robots whose eligibility set intersects a
//! queued request's route; the first notified idle robot to ask wins.
//! Under this workspace's serial dispatcher, the "pool" is already
//! collapsed into passing only eligible-and-idle robots to
//! `choose_robot` — the claim is atomic by construction, since nothing
//! else can mutate robot state concurrently (spec §5). What survives
//! as genuinely distinct behavior is the notification bookkeeping
//! itself: this policy counts, per robot, how many times it has been a
//! candidate for a route, which is what the original pool's
//! "notification" amounted to once you strip away the extra wire hop.

use super::DispatchPolicy;
use fabcell_model::{RobotId, RouteId};
use std::collections::HashMap;

/// Selection is identical to the event-driven reference (first in
/// lexical order); this policy additionally records a per-robot
/// notification count for observability.
#[derive(Debug, Default)]
pub struct SelectiveBroadcastPolicy {
    notifications: HashMap<RobotId, u64>,
}

impl SelectiveBroadcastPolicy {
    /// Creates the policy with an empty notification log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `robot_id` has been offered a candidate route.
    #[must_use]
    pub fn notifications_sent(&self, robot_id: &RobotId) -> u64 {
        self.notifications.get(robot_id).copied().unwrap_or(0)
    }
}

impl DispatchPolicy for SelectiveBroadcastPolicy {
    fn choose_robot(&mut self, eligible_idle: &[RobotId], _route: RouteId) -> Option<RobotId> {
        for robot_id in eligible_idle {
            *self.notifications.entry(robot_id.clone()).or_insert(0) += 1;
        }
        eligible_idle.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_every_eligible_idle_robot_and_picks_first() {
        let mut policy = SelectiveBroadcastPolicy::new();
        let robots = vec![RobotId::new("R1"), RobotId::new("R2")];
        let chosen = policy.choose_robot(&robots, RouteId(0));
        assert_eq!(chosen, Some(RobotId::new("R1")));
        assert_eq!(policy.notifications_sent(&RobotId::new("R1")), 1);
        assert_eq!(policy.notifications_sent(&RobotId::new("R2")), 1);
        assert_eq!(policy.notifications_sent(&RobotId::new("R3")), 0);
    }
}
