//! Rate limiting middleware.
//!
//! Per-owner limits on authenticated routes, backed by a keyed `governor`
//! limiter.

use std::num::NonZeroU32;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

type OwnerRateLimiter = RateLimiter<i64, DefaultKeyedStateStore<i64>, DefaultClock>;

/// Rate limiter state shared across all requests, keyed by owner ID.
pub struct RateLimiterState {
    limiter: OwnerRateLimiter,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Returns `None` when `rate_limit_per_minute` is zero, which disables limiting.
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
        })
    }

    /// Returns the retry-after delay in whole seconds (at least 1) when the
    /// owner is over quota.
    pub fn check(&self, owner_id: i64) -> Result<(), u64> {
        self.limiter.check_key(&owner_id).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_owners", &self.limiter.len())
            .finish()
    }
}

/// Middleware that applies rate limiting per owner.
///
/// Must run after [`require_user_auth`](super::user_auth::require_user_auth)
/// so that the owner is available in request extensions.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (Some(limiter), Some(auth)) = (
        state.rate_limiter.as_ref(),
        req.extensions().get::<UserAuth>(),
    ) else {
        return next.run(req).await;
    };

    if let Err(retry_after) = limiter.check(auth.owner_id) {
        tracing::debug!(owner_id = auth.owner_id, retry_after, "Rate limit exceeded");
        return rate_limited_response(retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(retry_after: u64) -> Response {
    let mut response = ApiError::RateLimited.into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
