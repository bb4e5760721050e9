// SPDX-License-Identifier: Apache-2.0
//! The daemon's `axum` status surface (spec §B): a thin HTTP harness
//! over the dispatcher and journey orchestrator, not a public API
//! surface in its own right.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use fabcell_dispatch::DispatcherHandle;
use fabcell_journey::JourneyOrchestrator;
use fabcell_model::{CarrierLotId, RobotId, StationName, TransferRequest, WaferId};
use serde::{Deserialize, Serialize};

/// Shared state for every route: the dispatcher and the journey
/// orchestrator built over it.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the running dispatcher.
    pub dispatcher: DispatcherHandle,
    /// The journey orchestrator wired to the same dispatcher.
    pub orchestrator: JourneyOrchestrator,
}

/// Builds the daemon's status surface over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/queue_size", get(queue_size))
        .route("/robot/:id", get(robot_state))
        .route("/transfer", post(submit_transfer))
        .route("/carrier", post(submit_carrier))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Serialize)]
struct QueueSizeResponse {
    queue_size: usize,
}

async fn queue_size(State(state): State<AppState>) -> impl IntoResponse {
    let queue_size = state.dispatcher.queue_size().await;
    Json(QueueSizeResponse { queue_size })
}

#[derive(Serialize)]
struct RobotStateResponse {
    robot_id: String,
    state: String,
}

async fn robot_state(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let robot_id = RobotId::new(id);
    let current = state.dispatcher.robot_state(robot_id.clone()).await;
    Json(RobotStateResponse {
        robot_id: robot_id.as_str().to_string(),
        state: current,
    })
}

#[derive(Deserialize)]
struct TransferRequestBody {
    wafer_id: WaferId,
    from: StationName,
    to: StationName,
    #[serde(default)]
    preferred_robot_id: Option<String>,
}

async fn submit_transfer(State(state): State<AppState>, Json(body): Json<TransferRequestBody>) -> impl IntoResponse {
    let mut request = TransferRequest::new(body.wafer_id, body.from, body.to, Box::new(|_| {}));
    if let Some(robot_id) = body.preferred_robot_id {
        request = request.with_preferred_robot(RobotId::new(robot_id));
    }
    match state.dispatcher.request_transfer(request).await {
        Ok(()) => (StatusCode::ACCEPTED, "accepted").into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

#[derive(Deserialize)]
struct CarrierArrivalBody {
    carrier_id: String,
    wafer_ids: Vec<WaferId>,
}

async fn submit_carrier(State(state): State<AppState>, Json(body): Json<CarrierArrivalBody>) -> impl IntoResponse {
    state.orchestrator.on_carrier_arrival(CarrierLotId::new(body.carrier_id), body.wafer_ids);
    (StatusCode::ACCEPTED, "accepted")
}
