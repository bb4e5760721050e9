// SPDX-License-Identifier: Apache-2.0
//! The per-wafer journey orchestrator (spec §4.6): walks wafers through
//! their eight-step journey and tracks the carrier-lot boundary.

mod orchestrator;
mod wafer;

pub use orchestrator::{CarrierCompletedObserver, JourneyOrchestrator};
pub use wafer::Wafer;
