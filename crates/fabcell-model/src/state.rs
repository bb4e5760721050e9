// SPDX-License-Identifier: Apache-2.0
//! Robot and station state vocabularies (spec §3, §6 — exact tokens).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A robot's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotState {
    /// Not holding a wafer, free to be dispatched.
    Idle,
    /// Assigned a transfer, moving toward pickup.
    Busy,
    /// Physically holding the wafer in transit.
    Carrying,
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Busy => "busy",
            Self::Carrying => "carrying",
        };
        write!(f, "{s}")
    }
}

/// A station's process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationState {
    /// No wafer present, ready to receive one.
    Idle,
    /// Actively processing the held wafer.
    Processing,
    /// Finished processing; wafer awaiting pickup.
    Done,
    /// Holding a wafer with no active process (e.g. Buffer at rest).
    Occupied,
}

impl StationState {
    /// Whether this state implies a wafer must be present (spec §3 invariant).
    #[must_use]
    pub fn requires_wafer(self) -> bool {
        matches!(self, Self::Processing | Self::Done | Self::Occupied)
    }
}

impl fmt::Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Occupied => "occupied",
        };
        write!(f, "{s}")
    }
}
