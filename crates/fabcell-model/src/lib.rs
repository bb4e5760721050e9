// SPDX-License-Identifier: Apache-2.0
//! Shared data model for the CMP cell transport scheduler.
//!
//! This crate holds only types: identifiers, state vocabularies, and the
//! `TransferRequest` envelope. It has no opinion on concurrency,
//! persistence, or dispatch policy — those live in `fabcell-registry`,
//! `fabcell-dispatch`, and `fabcell-journey` respectively.

mod ids;
mod journey;
mod request;
mod route;
mod state;
mod station;

pub use ids::{CarrierLotId, RobotId, WaferId};
pub use journey::{JourneyStage, ProcessingState};
pub use request::{OnCompleted, TransferRequest, DEFAULT_PRIORITY, RETURN_PRIORITY};
pub use route::RouteId;
pub use state::{RobotState, StationState};
pub use station::StationName;
