//! Device registry endpoint handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::device::{CreateDeviceRequest, LocationHistoryQuery, UpdateDeviceRequest};
use domain::models::{Device, Location};

use super::DataResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// POST /api/v1/devices
pub async fn create_device(
    State(state): State<AppState>,
    auth: UserAuth,
    payload: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Device>>), ApiError> {
    let Json(request) = payload?;
    let device = state.devices.register(auth.owner_id, request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(device))))
}

/// GET /api/v1/devices
pub async fn list_devices(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<DataResponse<Vec<Device>>>, ApiError> {
    let devices = state.devices.list(auth.owner_id).await?;
    Ok(Json(DataResponse::new(devices)))
}

/// GET /api/v1/devices/:id/status
pub async fn device_status(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(device_id): Path<i64>,
) -> Result<Json<DataResponse<Device>>, ApiError> {
    let device = state.devices.status(auth.owner_id, device_id).await?;
    Ok(Json(DataResponse::new(device)))
}

/// PATCH /api/v1/devices/:id
pub async fn update_device(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(device_id): Path<i64>,
    payload: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Device>>, ApiError> {
    let Json(request) = payload?;
    let device = state
        .devices
        .update(auth.owner_id, device_id, request)
        .await?;
    Ok(Json(DataResponse::new(device)))
}

/// DELETE /api/v1/devices/:id
pub async fn delete_device(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(device_id): Path<i64>,
) -> Result<Json<DataResponse<bool>>, ApiError> {
    state.devices.delete(auth.owner_id, device_id).await?;
    Ok(Json(DataResponse::new(true)))
}

/// Most recent locations first.
///
/// GET /api/v1/devices/:id/locations?limit=N
pub async fn device_locations(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(device_id): Path<i64>,
    Query(query): Query<LocationHistoryQuery>,
) -> Result<Json<DataResponse<Vec<Location>>>, ApiError> {
    let locations = state
        .devices
        .locations(auth.owner_id, device_id, query.limit)
        .await?;
    Ok(Json(DataResponse::new(locations)))
}
