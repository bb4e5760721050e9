// SPDX-License-Identifier: Apache-2.0
//! Recording handle doubles, shared by tests across the workspace.
//!
//! The real robot/station state machines are out of scope (spec §1);
//! these doubles let dispatcher and orchestrator tests assert on what
//! would have been sent without depending on a concrete transport.

use crate::{PickupMessage, RobotHandle, StationHandle, StationMessage};
use std::sync::{Arc, Mutex};

/// A [`RobotHandle`] that appends every `PICKUP` it receives to a shared
/// log instead of delivering it anywhere.
#[derive(Clone, Default)]
pub struct RecordingRobotHandle {
    log: Arc<Mutex<Vec<PickupMessage>>>,
}

impl RecordingRobotHandle {
    /// Creates a new, empty recording handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every message recorded so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<PickupMessage> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl RobotHandle for RecordingRobotHandle {
    fn send_pickup(&self, msg: PickupMessage) {
        if let Ok(mut log) = self.log.lock() {
            log.push(msg);
        }
    }
}

/// A [`StationHandle`] that appends every message it receives to a
/// shared log.
#[derive(Clone, Default)]
pub struct RecordingStationHandle {
    log: Arc<Mutex<Vec<StationMessage>>>,
}

impl RecordingStationHandle {
    /// Creates a new, empty recording handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every message recorded so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<StationMessage> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl StationHandle for RecordingStationHandle {
    fn send(&self, msg: StationMessage) {
        if let Ok(mut log) = self.log.lock() {
            log.push(msg);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabcell_model::{StationName, WaferId};

    #[test]
    fn recording_robot_handle_keeps_order() {
        let handle = RecordingRobotHandle::new();
        let wafer = WaferId::new(1).unwrap();
        handle.send_pickup(PickupMessage::new(
            wafer,
            StationName::Carrier,
            StationName::Polisher,
        ));
        handle.send_pickup(PickupMessage::new(
            wafer,
            StationName::Polisher,
            StationName::Cleaner,
        ));
        let sent = handle.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, StationName::Polisher);
        assert_eq!(sent[1].to, StationName::Cleaner);
    }
}
