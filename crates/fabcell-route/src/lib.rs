// SPDX-License-Identifier: Apache-2.0
//! The closed, hard-coded route table for the CMP cell (spec §3, §6).
//!
//! Five legal `(from, to)` pairs, each with a route id and an eligible
//! robot set. Nothing here mutates after process start.

use fabcell_model::{RobotId, RouteId, StationName};

struct RouteEntry {
    from: StationName,
    to: StationName,
    route_id: RouteId,
    eligible: &'static [&'static str],
}

/// The five legal routes, in table order. Robot ids are plain `&str`
/// here and turned into [`RobotId`] on demand — the table itself never
/// allocates.
const ROUTES: &[RouteEntry] = &[
    RouteEntry {
        from: StationName::Carrier,
        to: StationName::Polisher,
        route_id: RouteId(0),
        eligible: &["R1"],
    },
    RouteEntry {
        from: StationName::Polisher,
        to: StationName::Cleaner,
        route_id: RouteId(1),
        eligible: &["R2"],
    },
    RouteEntry {
        from: StationName::Cleaner,
        to: StationName::Buffer,
        route_id: RouteId(2),
        eligible: &["R3"],
    },
    RouteEntry {
        from: StationName::Buffer,
        to: StationName::Carrier,
        route_id: RouteId(3),
        eligible: &["R1"],
    },
    RouteEntry {
        // Error-recovery leg: pulls a wafer straight back to the carrier
        // from the polisher without visiting the cleaner.
        from: StationName::Polisher,
        to: StationName::Carrier,
        route_id: RouteId(4),
        eligible: &["R1"],
    },
];

/// Looks up the route id for a `(from, to)` pair.
///
/// Returns `None` when the pair is not in the closed route set — callers
/// must treat that as `InvalidRoute` (spec §7) and reject the request
/// rather than guessing a nearest match.
#[must_use]
pub fn route_of(from: StationName, to: StationName) -> Option<RouteId> {
    ROUTES
        .iter()
        .find(|r| r.from == from && r.to == to)
        .map(|r| r.route_id)
}

/// Returns the eligible robot set for a route id, or an empty slice if
/// the id does not name a known route.
#[must_use]
pub fn eligible_robots(route_id: RouteId) -> Vec<RobotId> {
    ROUTES
        .iter()
        .find(|r| r.route_id == route_id)
        .map(|r| r.eligible.iter().map(|s| RobotId::new(*s)).collect())
        .unwrap_or_default()
}

/// Whether `robot_id` is eligible for `route_id`.
#[must_use]
pub fn is_eligible(route_id: RouteId, robot_id: &RobotId) -> bool {
    ROUTES
        .iter()
        .find(|r| r.route_id == route_id)
        .is_some_and(|r| r.eligible.iter().any(|s| *s == robot_id.as_str()))
}
