//! User JWT authentication middleware.
//!
//! Validates the Bearer token on owner-facing routes and stores the
//! authenticated owner in request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::jwt::{extract_owner_id, JwtConfig};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated owner extracted from a JWT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    /// Owner ID from the JWT subject claim.
    pub owner_id: i64,
    /// JWT ID (jti), for log correlation.
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token and returns the owner it was issued for.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt_config.validate_access_token(token).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let owner_id = extract_owner_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid subject in token".to_string()))?;

        Ok(UserAuth {
            owner_id,
            jti: claims.jti,
        })
    }

    /// Reads the Bearer token from the `Authorization` header and validates it.
    pub fn from_headers(jwt_config: &JwtConfig, headers: &HeaderMap) -> Result<Self, ApiError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        Self::validate(jwt_config, token)
    }
}

/// Middleware that requires JWT user authentication.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match UserAuth::from_headers(&state.jwt, req.headers()) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::signing_jwt as jwt;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token_yields_owner() {
        let jwt = jwt();
        let (token, jti) = jwt.generate_access_token(42).unwrap();

        let auth = UserAuth::from_headers(&jwt, &headers_with(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(auth.owner_id, 42);
        assert_eq!(auth.jti, jti);
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let result = UserAuth::from_headers(&jwt(), &HeaderMap::new());
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_non_bearer_scheme_is_unauthorized() {
        let result = UserAuth::from_headers(&jwt(), &headers_with("Basic abc"));
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let result = UserAuth::from_headers(&jwt(), &headers_with("Bearer not-a-jwt"));
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
