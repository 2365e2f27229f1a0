//! Owner account endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use domain::models::RegisterPushTokenRequest;
use domain::DomainError;
use tracing::info;
use validator::Validate;

use super::MessageResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Store the owner's FCM registration token, replacing any previous one.
///
/// POST /api/v1/me/fcm-token
pub async fn register_fcm_token(
    State(state): State<AppState>,
    auth: UserAuth,
    payload: Result<Json<RegisterPushTokenRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    state
        .store
        .upsert_push_token(auth.owner_id, request.fcm_token.trim())
        .await
        .map_err(DomainError::storage("upsert_push_token"))?;

    info!(owner_id = auth.owner_id, "Push token registered");

    Ok(Json(MessageResponse {
        message: "FCM token registered".to_string(),
    }))
}
