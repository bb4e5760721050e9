// SPDX-License-Identifier: Apache-2.0
//! Identifier newtypes shared across the cell.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a single wafer, unique within its carrier lot.
///
/// Construction is checked: a wafer id must be a positive integer
/// (spec §3). Use [`WaferId::new`] rather than a bare `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WaferId(u64);

impl WaferId {
    /// Creates a wafer id, returning `None` for zero.
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Returns the raw integer value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WaferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a robot, e.g. `"R1"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RobotId(String);

impl RobotId {
    /// Creates a robot id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RobotId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifies a carrier lot (a batch of wafers that enter/exit together).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CarrierLotId(String);

impl CarrierLotId {
    /// Creates a carrier lot id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CarrierLotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn wafer_id_rejects_zero() {
        assert!(WaferId::new(0).is_none());
        assert_eq!(WaferId::new(1).unwrap().get(), 1);
    }

    #[test]
    fn robot_id_displays_raw_string() {
        let id = RobotId::new("R1");
        assert_eq!(id.as_str(), "R1");
        assert_eq!(format!("{id}"), "R1");
    }
}
