// SPDX-License-Identifier: Apache-2.0
//! Wire-independent message bodies (spec §6).

use fabcell_model::{StationName, WaferId};
use serde::{Deserialize, Serialize};

/// `PICKUP{waferId, wafer, from, to}`.
///
/// Both `wafer_id` and `wafer` carry the same id, for downstream
/// compatibility with consumers that expect either field name
/// (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupMessage {
    /// The wafer id (primary field name).
    pub wafer_id: WaferId,
    /// The same wafer id, duplicated for legacy consumers.
    pub wafer: WaferId,
    /// Source station.
    pub from: StationName,
    /// Destination station.
    pub to: StationName,
}

impl PickupMessage {
    /// Builds a pickup message, populating both wafer-id fields.
    #[must_use]
    pub fn new(wafer_id: WaferId, from: StationName, to: StationName) -> Self {
        Self {
            wafer_id,
            wafer: wafer_id,
            from,
            to,
        }
    }
}

/// A command sent to a station handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationMessage {
    /// Sent on arrival at Polisher/Cleaner.
    LoadWafer {
        /// The wafer that arrived.
        wafer: WaferId,
    },
    /// Sent on departure from Polisher/Cleaner.
    UnloadWafer,
    /// Sent on arrival at Buffer.
    StoreWafer {
        /// The wafer that arrived.
        wafer: WaferId,
    },
    /// Sent on departure from Buffer.
    RetrieveWafer,
}
