// SPDX-License-Identifier: Apache-2.0
//! Pluggable dispatch policies (spec §4.7, §9).
//!
//! Every scheduler variant in the original fleet (mailbox-driven,
//! pub/sub, pheromone-weighted, batch-synchronized, poll-driven) is
//! expressed here as one small capability set rather than a class
//! hierarchy: `choose_robot`, plus the optional `on_completed`,
//! `on_tick`, and `batch_mode` hooks.

mod broadcast;
mod event_driven;
mod pheromone;
mod polling;
mod synchronized_batch;

pub use broadcast::SelectiveBroadcastPolicy;
pub use event_driven::EventDrivenPolicy;
pub use pheromone::{PheromoneConfig, PheromoneWeightedPolicy};
pub use polling::{PollingPolicy, DEFAULT_POLL_INTERVAL_MS};
pub use synchronized_batch::SynchronizedBatchPolicy;

use fabcell_model::{RobotId, RouteId};
use std::time::Duration;

/// A pluggable strategy for choosing which idle, eligible robot serves
/// a route, plus optional hooks for policies that need to react to
/// completions or periodic ticks.
///
/// `choose_robot` receives `eligible_idle` already filtered to robots
/// that are both idle and eligible for `route`, and — for every policy
/// except [`PheromoneWeightedPolicy`] — sorted in the fixed lexical
/// order spec §4.4 mandates as the tie-break. A policy is free to
/// ignore that ordering (pheromone weighting does).
pub trait DispatchPolicy: Send {
    /// Chooses one robot from `eligible_idle` to serve `route`, or
    /// `None` if the policy declines to dispatch this cycle.
    fn choose_robot(&mut self, eligible_idle: &[RobotId], route: RouteId) -> Option<RobotId>;

    /// Called once a dispatched transfer completes (the serving robot
    /// returned to idle), with the wall-clock time the transfer took.
    /// Default no-op; only the pheromone policy uses this.
    fn on_completed(&mut self, _route: RouteId, _robot: &RobotId, _completion_time: Duration) {}

    /// Called on a periodic maintenance tick (driven externally, e.g.
    /// by [`crate::spawn_tick_driver`]). Default no-op; the pheromone
    /// policy evaporates here, the polling policy uses the tick as its
    /// cadence to re-kick the dispatcher.
    fn on_tick(&mut self) {}

    /// Whether this policy requires a synchronized-batch dispatch
    /// cycle: only run when every registered robot is idle, and allow
    /// more than one commit per cycle, at most one per robot (spec
    /// §4.7 "Synchronized batch").
    fn batch_mode(&self) -> bool {
        false
    }
}
