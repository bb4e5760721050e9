// SPDX-License-Identifier: Apache-2.0
//! Persisted daemon settings: which policy to start with, and the
//! advisory tunables spec §9 lists as defaults rather than contracts.

use fabcell_dispatch::policy::{PheromoneConfig, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The key [`crate::ConfigService`] stores [`FabcellConfig`] under.
pub const SETTINGS_KEY: &str = "fabcelld";

/// Which [`fabcell_dispatch::policy::DispatchPolicy`] the daemon
/// builds at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Mailbox-driven, first-eligible-idle-robot-wins (spec §4.7).
    EventDriven,
    /// Same selection, cadence-driven by a periodic tick.
    Polling,
    /// Broadcasts a route to every idle eligible robot, first ack wins.
    SelectiveBroadcast,
    /// Roulette-wheel selection weighted by pheromone strength.
    PheromoneWeighted,
    /// Only dispatches when every registered robot is idle.
    SynchronizedBatch,
}

impl Default for PolicyKind {
    fn default() -> Self {
        Self::EventDriven
    }
}

/// Persisted pheromone tunables, mirroring
/// [`fabcell_dispatch::policy::PheromoneConfig`] field for field so
/// the on-disk shape tracks the policy's own defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PheromoneSettings {
    /// Pheromone exponent in the weight formula.
    pub alpha: f64,
    /// Heuristic exponent in the weight formula.
    pub beta: f64,
    /// Fraction evaporated per `evaporation_period_ms` (e.g. 0.1 = 10%).
    pub rho: f64,
    /// Lower clamp for pheromone strength.
    pub tau_min: f64,
    /// Upper clamp for pheromone strength.
    pub tau_max: f64,
    /// Base deposit amount on a successful completion.
    pub delta0: f64,
    /// How often [`fabcell_dispatch::policy::DispatchPolicy::on_tick`] evaporates pheromone.
    pub evaporation_period_ms: u64,
}

impl Default for PheromoneSettings {
    fn default() -> Self {
        Self::from(PheromoneConfig::default())
    }
}

impl From<PheromoneConfig> for PheromoneSettings {
    fn from(c: PheromoneConfig) -> Self {
        Self {
            alpha: c.alpha,
            beta: c.beta,
            rho: c.rho,
            tau_min: c.tau_min,
            tau_max: c.tau_max,
            delta0: c.delta0,
            evaporation_period_ms: u64::try_from(c.evaporation_period.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<PheromoneSettings> for PheromoneConfig {
    fn from(s: PheromoneSettings) -> Self {
        Self {
            alpha: s.alpha,
            beta: s.beta,
            rho: s.rho,
            tau_min: s.tau_min,
            tau_max: s.tau_max,
            delta0: s.delta0,
            evaporation_period: Duration::from_millis(s.evaporation_period_ms),
        }
    }
}

/// The full persisted settings blob for the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FabcellConfig {
    /// Which [`fabcell_dispatch::policy::DispatchPolicy`] the daemon builds at startup.
    pub policy: PolicyKind,
    /// Persisted pheromone tunables.
    pub pheromone: PheromoneSettings,
    /// Cadence for [`PolicyKind::Polling`]'s tick driver.
    pub poll_interval_ms: u64,
}

impl Default for FabcellConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            pheromone: PheromoneSettings::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl FabcellConfig {
    /// The poll cadence as a [`Duration`], for use with
    /// [`fabcell_dispatch::spawn_tick_driver`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
