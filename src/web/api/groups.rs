use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::swath::{SwathGeometry, SwathGroup, SwathInstance, SwathMode, SyncReport};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub mode: SwathMode,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSwathRequest {
    pub mode: SwathMode,
    pub geometry: SwathGeometry,
    #[serde(default)]
    pub group_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "Groups, active first", body = Vec<SwathGroup>)
    ),
    tag = "groups"
)]
pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Json<Vec<SwathGroup>>> {
    let mission = state.mission.lock().await;
    Ok(Json(mission.list_groups()))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = CreatedResponse),
        (status = 400, description = "Realtime groups are opened by tracking", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    if request.mode == SwathMode::RealtimeTracking {
        return Err(ApiError::Validation(
            "realtime groups are created by starting tracking".into(),
        ));
    }
    let mut mission = state.mission.lock().await;
    let id = mission.create_group(request.mode, request.name);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group", body = SwathGroup),
        (status = 404, description = "Unknown group", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SwathGroup>> {
    let mission = state.mission.lock().await;
    mission
        .get_group(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("group_not_found"))
}

#[utoipa::path(
    post,
    path = "/api/groups/{id}/end",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group ended", body = SwathGroup),
        (status = 404, description = "Unknown group", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn end_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SwathGroup>> {
    let mut mission = state.mission.lock().await;
    if !mission.end_group(&id) {
        return Err(ApiError::NotFound("group_not_found"));
    }
    mission
        .get_group(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("group_not_found"))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{id}",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 204, description = "Group and its swaths removed"),
        (status = 404, description = "Unknown group", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut mission = state.mission.lock().await;
    if mission.remove_group(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("group_not_found"))
    }
}

#[utoipa::path(
    post,
    path = "/api/groups/sync",
    responses(
        (status = 200, description = "Membership repaired", body = SyncReport)
    ),
    tag = "groups"
)]
pub async fn sync_groups(State(state): State<AppState>) -> ApiResult<Json<SyncReport>> {
    let mut mission = state.mission.lock().await;
    Ok(Json(mission.sync_groups()))
}

#[utoipa::path(
    get,
    path = "/api/swaths",
    responses(
        (status = 200, description = "Swath instances", body = Vec<SwathInstance>)
    ),
    tag = "swaths"
)]
pub async fn list_swaths(State(state): State<AppState>) -> ApiResult<Json<Vec<SwathInstance>>> {
    let mission = state.mission.lock().await;
    Ok(Json(mission.list_swaths()))
}

#[utoipa::path(
    post,
    path = "/api/swaths",
    request_body = CreateSwathRequest,
    responses(
        (status = 201, description = "Swath created", body = CreatedResponse),
        (status = 404, description = "Unknown group", body = ErrorResponse)
    ),
    tag = "swaths"
)]
pub async fn create_swath(
    State(state): State<AppState>,
    Json(request): Json<CreateSwathRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let mut mission = state.mission.lock().await;
    let id = mission
        .add_swath(request.mode, request.geometry, request.group_id.as_deref())
        .ok_or(ApiError::NotFound("group_not_found"))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    delete,
    path = "/api/swaths/{id}",
    params(("id" = String, Path, description = "Swath id")),
    responses(
        (status = 204, description = "Swath removed"),
        (status = 404, description = "Unknown swath", body = ErrorResponse)
    ),
    tag = "swaths"
)]
pub async fn delete_swath(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut mission = state.mission.lock().await;
    if mission.remove_swath(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("swath_not_found"))
    }
}
