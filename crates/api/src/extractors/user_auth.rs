//! User JWT authentication extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth as UserAuthData;

/// Authenticated owner for a handler.
///
/// Uses what [`require_user_auth`](crate::middleware::user_auth::require_user_auth)
/// stored in request extensions, and validates the token itself otherwise.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub owner_id: i64,
}

impl From<UserAuthData> for UserAuth {
    fn from(data: UserAuthData) -> Self {
        Self {
            owner_id: data.owner_id,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuthData>() {
            return Ok(auth.clone().into());
        }

        UserAuthData::from_headers(&state.jwt, &parts.headers).map(Into::into)
    }
}
