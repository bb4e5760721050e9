// SPDX-License-Identifier: Apache-2.0
//! Robot and station registries: associative stores keyed by id/name
//! (spec §4.2). Reads return a snapshot; writes are serialized by
//! whatever owns the registry (the dispatcher's serial processor,
//! spec §5) — these types do no locking of their own.

mod error;
mod robot;
mod station;

pub use error::RegistryError;
pub use robot::{RobotEntry, RobotRegistry, RobotUpdateOutcome};
pub use station::{StationEntry, StationRegistry, StationUpdateOutcome};
