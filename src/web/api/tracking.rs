use axum::{extract::State, Json};
use chrono::Utc;

use crate::mission::{MissionSnapshot, MissionStatus};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[utoipa::path(
    post,
    path = "/api/tracking/start",
    responses(
        (status = 200, description = "Tracking running", body = MissionStatus)
    ),
    tag = "tracking"
)]
pub async fn start(State(state): State<AppState>) -> ApiResult<Json<MissionStatus>> {
    let mut mission = state.mission.lock().await;
    mission.start_tracking(Utc::now());
    Ok(Json(mission.status().clone()))
}

#[utoipa::path(
    post,
    path = "/api/tracking/stop",
    responses(
        (status = 200, description = "Tracking stopped", body = MissionStatus),
        (status = 409, description = "Not tracking", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn stop(State(state): State<AppState>) -> ApiResult<Json<MissionStatus>> {
    let mut mission = state.mission.lock().await;
    if !mission.is_tracking() {
        return Err(ApiError::Conflict("not_tracking"));
    }
    mission.stop_tracking();
    Ok(Json(mission.status().clone()))
}

#[utoipa::path(
    get,
    path = "/api/tracking/state",
    responses(
        (status = 200, description = "Mission state", body = MissionSnapshot)
    ),
    tag = "tracking"
)]
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<MissionSnapshot>> {
    let mission = state.mission.lock().await;
    Ok(Json(mission.snapshot()))
}
