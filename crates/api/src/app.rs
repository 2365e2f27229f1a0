use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{
    AlertFeed, AlertRecorder, DeviceService, GeofenceService, IngestService, NotificationService,
};
use domain::TrackingStore;
use shared::jwt::{JwtConfig, JwtError};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{alerts, devices, geofences, health, locations, users};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrackingStore>,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub ingest: IngestService,
    pub geofences: GeofenceService,
    pub devices: DeviceService,
    pub alerts: AlertFeed,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// Wires the services around one store and one notifier.
    pub fn new(
        config: Config,
        store: Arc<dyn TrackingStore>,
        notifier: Arc<dyn NotificationService>,
    ) -> Result<Self, JwtError> {
        let jwt = Arc::new(JwtConfig::verifier(
            &config.jwt.public_key,
            config.jwt.leeway_secs,
        )?);
        let limits = &config.limits;

        let recorder = AlertRecorder::new(store.clone(), notifier);
        let ingest = IngestService::new(store.clone(), recorder);
        let geofences = GeofenceService::new(store.clone());
        let devices = DeviceService::new(
            store.clone(),
            limits.default_location_history,
            limits.max_location_history,
        );
        let alerts = AlertFeed::new(
            store.clone(),
            limits.default_alert_page_size,
            limits.max_alert_page_size,
        );
        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            store,
            config: Arc::new(config),
            jwt,
            ingest,
            geofences,
            devices,
            alerts,
            rate_limiter,
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        // Development default
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn create_app(
    config: Config,
    store: Arc<dyn TrackingStore>,
    notifier: Arc<dyn NotificationService>,
) -> Result<Router, JwtError> {
    let state = AppState::new(config, store, notifier)?;
    let config = state.config.clone();

    // Owner routes. Auth runs first (outermost route layer), then rate limiting
    // keyed by the authenticated owner.
    let owner_routes = Router::new()
        .route(
            "/api/v1/geofence",
            post(geofences::create_geofence)
                .get(geofences::get_geofence)
                .patch(geofences::update_geofence)
                .delete(geofences::delete_geofence),
        )
        .route(
            "/api/v1/devices",
            post(devices::create_device).get(devices::list_devices),
        )
        .route(
            "/api/v1/devices/:id",
            patch(devices::update_device).delete(devices::delete_device),
        )
        .route("/api/v1/devices/:id/status", get(devices::device_status))
        .route(
            "/api/v1/devices/:id/locations",
            get(devices::device_locations),
        )
        .route("/api/v1/alerts", get(alerts::list_alerts))
        .route("/api/v1/alerts/count", get(alerts::unread_count))
        .route("/api/v1/alerts/read-all", patch(alerts::mark_all_read))
        .route("/api/v1/alerts/:id/read", patch(alerts::mark_read))
        .route("/api/v1/me/fcm-token", post(users::register_fcm_token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Tracker ingest: no owner credentials.
    let device_routes =
        Router::new().route("/api/v1/locations", post(locations::submit_location));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let router = Router::new()
        .merge(public_routes)
        .merge(device_routes)
        .merge(owner_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state);

    Ok(router)
}
