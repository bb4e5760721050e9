// SPDX-License-Identifier: Apache-2.0
//! Error kinds for registry operations (spec §7).

use fabcell_model::{RobotId, StationName};
use thiserror::Error;

/// Failure modes surfaced by [`crate::RobotRegistry`] and
/// [`crate::StationRegistry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A register call named an id that is already registered with a
    /// different handle.
    #[error("robot {0} is already registered with a different handle")]
    RobotHandleConflict(RobotId),
    /// An arrival would place a wafer on a station already holding a
    /// different one (spec §7 `StationBusy`). The station's wafer is
    /// left untouched.
    #[error("station {0} is busy with a different wafer")]
    StationBusy(StationName),
}
