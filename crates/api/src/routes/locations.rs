//! Location ingest endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use domain::models::{Location, LocationReport};
use tracing::debug;

use super::DataResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_geofence_exit_alert, record_location_ingested};

/// Accept a location report from a tracker.
///
/// POST /api/v1/locations
///
/// Unauthenticated: trackers do not hold owner credentials. A storage
/// failure answers 500 naming the failed stage; a location stored before
/// that failure is kept.
pub async fn submit_location(
    State(state): State<AppState>,
    payload: Result<Json<LocationReport>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Location>>), ApiError> {
    let Json(report) = payload?;

    let ingested = state.ingest.submit_location(report).await?;
    record_location_ingested();
    if ingested.alert().is_some() {
        record_geofence_exit_alert();
    }

    debug!(
        location_id = ingested.location.id,
        device_id = ingested.location.device_id,
        evaluation = ?ingested.evaluation,
        "Location ingested"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(ingested.location)),
    ))
}
