//! Geofence endpoint handlers. Each owner has at most one geofence.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use domain::models::geofence::{CreateGeofenceRequest, GeofenceResponse, UpdateGeofenceRequest};

use super::DataResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Create the owner's geofence.
///
/// POST /api/v1/geofence
pub async fn create_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
    payload: Result<Json<CreateGeofenceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<GeofenceResponse>>), ApiError> {
    let Json(request) = payload?;
    let geofence = state.geofences.create(auth.owner_id, request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(geofence))))
}

/// GET /api/v1/geofence
pub async fn get_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<DataResponse<GeofenceResponse>>, ApiError> {
    let geofence = state.geofences.get(auth.owner_id).await?;
    Ok(Json(DataResponse::new(geofence)))
}

/// Partially update the owner's geofence. Empty or zero fields are left unchanged.
///
/// PATCH /api/v1/geofence
pub async fn update_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
    payload: Result<Json<UpdateGeofenceRequest>, JsonRejection>,
) -> Result<Json<DataResponse<GeofenceResponse>>, ApiError> {
    let Json(request) = payload?;
    let geofence = state.geofences.update(auth.owner_id, request).await?;
    Ok(Json(DataResponse::new(geofence)))
}

/// DELETE /api/v1/geofence
pub async fn delete_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<DataResponse<bool>>, ApiError> {
    state.geofences.delete(auth.owner_id).await?;
    Ok(Json(DataResponse::new(true)))
}
