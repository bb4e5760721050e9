// SPDX-License-Identifier: Apache-2.0
//! Pheromone-weighted policy (spec §4.7, §9).
//!
//! For every `(route, robot)` pair that has ever been a candidate, we
//! maintain a pheromone strength `tau` and a running heuristic `eta`
//! derived from success count and mean completion time. Selection is a
//! roulette-wheel draw weighted by `tau^alpha * eta^beta`; ties and
//! empty-weight draws fall back to uniform random. All numeric
//! constants are the spec's advisory defaults — only the shape of the
//! update and the clamp are contractual.

use super::DispatchPolicy;
use fabcell_model::{RobotId, RouteId};
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};

// `rand::thread_rng()` is called fresh inside `choose_robot` rather than
// stored as a field: `ThreadRng` is `!Send`, and this policy lives
// inside a `Box<dyn DispatchPolicy>` that is moved into the
// dispatcher's spawned actor task, which must be `Send`.

/// Tunable constants for the pheromone update (spec §9).
#[derive(Debug, Clone, Copy)]
pub struct PheromoneConfig {
    /// Pheromone exponent in the weight formula.
    pub alpha: f64,
    /// Heuristic exponent in the weight formula.
    pub beta: f64,
    /// Fraction evaporated per `evaporation_period` (e.g. 0.1 = 10%).
    pub rho: f64,
    /// Lower clamp for pheromone strength.
    pub tau_min: f64,
    /// Upper clamp for pheromone strength.
    pub tau_max: f64,
    /// Base deposit amount on a successful completion.
    pub delta0: f64,
    /// How often [`DispatchPolicy::on_tick`] evaporates pheromone.
    pub evaporation_period: Duration,
}

impl Default for PheromoneConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 2.0,
            rho: 0.1,
            tau_min: 0.1,
            tau_max: 10.0,
            delta0: 1.0,
            evaporation_period: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RouteRobotStats {
    tau: f64,
    success_count: u64,
    mean_completion_secs: f64,
    last_success: Instant,
}

impl RouteRobotStats {
    fn new(tau_min: f64, now: Instant) -> Self {
        Self {
            tau: tau_min,
            success_count: 0,
            mean_completion_secs: 0.0,
            last_success: now,
        }
    }

    /// Heuristic desirability: rewards a track record of fast,
    /// frequent completions, and decays with staleness since the last
    /// success.
    fn eta(&self, now: Instant) -> f64 {
        let speed = 1.0 / (1.0 + self.mean_completion_secs);
        let experience = (self.success_count as f64 + 1.0).ln() + 1.0;
        let staleness_secs = now.duration_since(self.last_success).as_secs_f64();
        let recency = 1.0 / (1.0 + staleness_secs / 60.0);
        speed * experience * recency
    }
}

/// Maintains pheromone strength and a success/latency heuristic per
/// `(route, robot)` pair, and draws a weighted-random robot per
/// dispatch.
pub struct PheromoneWeightedPolicy {
    config: PheromoneConfig,
    stats: HashMap<(RouteId, RobotId), RouteRobotStats>,
}

impl PheromoneWeightedPolicy {
    /// Creates the policy with the given tunable constants.
    #[must_use]
    pub fn new(config: PheromoneConfig) -> Self {
        Self {
            config,
            stats: HashMap::new(),
        }
    }

    /// Current pheromone strength for `(route, robot)`, or `tau_min`
    /// if the pair has never been a candidate.
    #[must_use]
    pub fn tau(&self, route: RouteId, robot_id: &RobotId) -> f64 {
        self.stats
            .get(&(route, robot_id.clone()))
            .map_or(self.config.tau_min, |s| s.tau)
    }

    fn entry(&mut self, route: RouteId, robot_id: &RobotId) -> &mut RouteRobotStats {
        let tau_min = self.config.tau_min;
        self.stats
            .entry((route, robot_id.clone()))
            .or_insert_with(|| RouteRobotStats::new(tau_min, Instant::now()))
    }
}

impl Default for PheromoneWeightedPolicy {
    fn default() -> Self {
        Self::new(PheromoneConfig::default())
    }
}

impl DispatchPolicy for PheromoneWeightedPolicy {
    fn choose_robot(&mut self, eligible_idle: &[RobotId], route: RouteId) -> Option<RobotId> {
        if eligible_idle.is_empty() {
            return None;
        }
        if eligible_idle.len() == 1 {
            return eligible_idle.first().cloned();
        }

        let now = Instant::now();
        let weights: Vec<f64> = eligible_idle
            .iter()
            .map(|r| {
                let tau = self.tau(route, r);
                let eta = self
                    .stats
                    .get(&(route, r.clone()))
                    .map_or(1.0, |s| s.eta(now));
                tau.powf(self.config.alpha) * eta.powf(self.config.beta)
            })
            .collect();

        let total: f64 = weights.iter().sum();
        let mut rng = rand::thread_rng();
        if total <= 0.0 || !total.is_finite() {
            let idx = rng.gen_range(0..eligible_idle.len());
            return eligible_idle.get(idx).cloned();
        }

        let mut draw = rng.gen_range(0.0..total);
        for (robot_id, weight) in eligible_idle.iter().zip(weights.iter()) {
            if draw < *weight {
                return Some(robot_id.clone());
            }
            draw -= *weight;
        }
        eligible_idle.last().cloned()
    }

    fn on_completed(&mut self, route: RouteId, robot_id: &RobotId, completion_time: Duration) {
        let delta0 = self.config.delta0;
        let tau_max = self.config.tau_max;
        let tau_min = self.config.tau_min;
        let now = Instant::now();
        let entry = self.entry(route, robot_id);

        let completion_secs = completion_time.as_secs_f64();
        let deposit = delta0 / (1.0 + completion_secs);
        entry.tau = (entry.tau + deposit).clamp(tau_min, tau_max);

        let n = entry.success_count as f64;
        entry.mean_completion_secs = (entry.mean_completion_secs * n + completion_secs) / (n + 1.0);
        entry.success_count += 1;
        entry.last_success = now;
    }

    fn on_tick(&mut self) {
        let rho = self.config.rho;
        let tau_min = self.config.tau_min;
        for stats in self.stats.values_mut() {
            stats.tau = (stats.tau * (1.0 - rho)).max(tau_min);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_candidate_is_chosen_without_drawing() {
        let mut policy = PheromoneWeightedPolicy::default();
        let robots = vec![RobotId::new("R1")];
        assert_eq!(policy.choose_robot(&robots, RouteId(0)), Some(RobotId::new("R1")));
    }

    #[test]
    fn deposit_is_clamped_to_tau_max() {
        let mut policy = PheromoneWeightedPolicy::new(PheromoneConfig {
            tau_max: 2.0,
            ..PheromoneConfig::default()
        });
        let robot = RobotId::new("R1");
        for _ in 0..100 {
            policy.on_completed(RouteId(0), &robot, Duration::from_millis(1));
        }
        assert!(policy.tau(RouteId(0), &robot) <= 2.0);
    }

    #[test]
    fn evaporation_decays_toward_tau_min_but_not_below() {
        let mut policy = PheromoneWeightedPolicy::new(PheromoneConfig {
            tau_min: 0.1,
            rho: 0.5,
            ..PheromoneConfig::default()
        });
        let robot = RobotId::new("R1");
        policy.on_completed(RouteId(0), &robot, Duration::from_millis(1));
        let before = policy.tau(RouteId(0), &robot);
        for _ in 0..50 {
            policy.on_tick();
        }
        let after = policy.tau(RouteId(0), &robot);
        assert!(after < before);
        assert!(after >= 0.1);
    }

    #[test]
    fn empty_candidates_yield_none() {
        let mut policy = PheromoneWeightedPolicy::default();
        assert_eq!(policy.choose_robot(&[], RouteId(0)), None);
    }
}
