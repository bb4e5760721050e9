// SPDX-License-Identifier: Apache-2.0
//! The four process stations of the cell.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four fixed process stations.
///
/// This set is closed (spec §3): no station is ever added or removed at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StationName {
    /// Wafer carrier / cassette dock.
    Carrier,
    /// Chemical-mechanical polisher.
    Polisher,
    /// Post-polish cleaner.
    Cleaner,
    /// Intermediate buffer station.
    Buffer,
}

impl StationName {
    /// All four stations, in a fixed order used for deterministic iteration.
    pub const ALL: [Self; 4] = [Self::Carrier, Self::Polisher, Self::Cleaner, Self::Buffer];
}

impl fmt::Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Carrier => "Carrier",
            Self::Polisher => "Polisher",
            Self::Cleaner => "Cleaner",
            Self::Buffer => "Buffer",
        };
        write!(f, "{s}")
    }
}
