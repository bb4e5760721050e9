// SPDX-License-Identifier: Apache-2.0
//! The eight-step wafer lifecycle (spec §3).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a wafer sits in its fixed eight-step journey.
///
/// `To*` variants are transit stages: passive, waiting on
/// `OnCompleted` to advance them (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JourneyStage {
    /// Resting in the carrier, not yet dispatched.
    InCarrier,
    /// In transit toward the polisher.
    ToPolisher,
    /// Being polished.
    Polishing,
    /// In transit toward the cleaner.
    ToCleaner,
    /// Being cleaned.
    Cleaning,
    /// In transit toward the buffer.
    ToBuffer,
    /// Resting in the buffer.
    InBuffer,
    /// In transit back to the carrier (final leg).
    ToCarrier,
}

impl JourneyStage {
    /// Whether this stage is a passive transit stage awaiting completion.
    #[must_use]
    pub fn is_transit(self) -> bool {
        matches!(
            self,
            Self::ToPolisher | Self::ToCleaner | Self::ToBuffer | Self::ToCarrier
        )
    }
}

impl fmt::Display for JourneyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InCarrier => "InCarrier",
            Self::ToPolisher => "ToPolisher",
            Self::Polishing => "Polishing",
            Self::ToCleaner => "ToCleaner",
            Self::Cleaning => "Cleaning",
            Self::ToBuffer => "ToBuffer",
            Self::InBuffer => "InBuffer",
            Self::ToCarrier => "ToCarrier",
        };
        write!(f, "{s}")
    }
}

/// The wafer's material processing state, independent of its physical
/// location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingState {
    /// Not yet polished or cleaned.
    Raw,
    /// Polished, not yet cleaned.
    Polished,
    /// Polished and cleaned.
    Cleaned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transit_stages_are_passive() {
        assert!(JourneyStage::ToPolisher.is_transit());
        assert!(JourneyStage::ToCarrier.is_transit());
        assert!(!JourneyStage::InCarrier.is_transit());
        assert!(!JourneyStage::Polishing.is_transit());
    }
}
