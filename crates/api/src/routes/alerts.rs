//! Alert feed endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::alert::{AlertPage, ListAlertsQuery};
use domain::models::Alert;
use serde::Serialize;

use super::DataResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadAllResponse {
    pub message: String,
    pub updated: u64,
}

/// Owner's alerts, newest first, keyset paginated.
///
/// GET /api/v1/alerts?cursor=&limit=
pub async fn list_alerts(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<AlertPage>, ApiError> {
    let page = state
        .alerts
        .list(auth.owner_id, query.cursor.as_deref(), query.limit)
        .await?;
    Ok(Json(page))
}

/// GET /api/v1/alerts/count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let count = state.alerts.unread_count(auth.owner_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// PATCH /api/v1/alerts/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(alert_id): Path<i64>,
) -> Result<Json<DataResponse<Alert>>, ApiError> {
    let alert = state.alerts.acknowledge(auth.owner_id, alert_id).await?;
    Ok(Json(DataResponse::new(alert)))
}

/// PATCH /api/v1/alerts/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ReadAllResponse>, ApiError> {
    let updated = state.alerts.acknowledge_all(auth.owner_id).await?;
    let message = if updated == 0 {
        "No unread alerts"
    } else {
        "All alerts marked as read"
    };

    Ok(Json(ReadAllResponse {
        message: message.to_string(),
        updated,
    }))
}
