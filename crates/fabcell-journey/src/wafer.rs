// SPDX-License-Identifier: Apache-2.0
//! Per-wafer journey state and the carrier lot that groups wafers
//! (spec §3, §4.6).

use fabcell_model::{CarrierLotId, JourneyStage, ProcessingState, StationName, WaferId};

/// One wafer's position in its eight-step journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wafer {
    /// The wafer's id.
    pub id: WaferId,
    /// Current step of the journey.
    pub stage: JourneyStage,
    /// Material processing state, independent of location.
    pub processing_state: ProcessingState,
    /// Station the wafer is currently at or last departed.
    pub current_station: StationName,
    /// Set once the wafer completes its final `ToCarrier` leg.
    pub is_completed: bool,
}

impl Wafer {
    /// A wafer freshly admitted into its carrier, resting at `Carrier`.
    pub(crate) fn fresh(id: WaferId) -> Self {
        Self {
            id,
            stage: JourneyStage::InCarrier,
            processing_state: ProcessingState::Raw,
            current_station: StationName::Carrier,
            is_completed: false,
        }
    }
}

/// A batch of wafers that entered the cell together and are tracked as
/// a unit for carrier-completion purposes (spec §4.6).
#[derive(Debug, Clone)]
pub(crate) struct CarrierLot {
    pub id: CarrierLotId,
    pub wafer_ids: Vec<WaferId>,
    pub completed_fired: bool,
}
