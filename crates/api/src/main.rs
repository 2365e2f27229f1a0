use std::sync::Arc;

use anyhow::{Context, Result};
use domain::services::{LoggingNotificationService, NotificationService};
use persistence::PgTrackingStore;
use petsafe_api::{app, config, middleware, services::FcmNotificationService};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting PetSafe API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let notifier: Arc<dyn NotificationService> = if config.fcm.enabled {
        Arc::new(FcmNotificationService::new(config.fcm.clone())?)
    } else {
        warn!("FCM disabled, push notifications will only be logged");
        Arc::new(LoggingNotificationService)
    };

    let store = Arc::new(PgTrackingStore::new(pool));
    let addr = config.socket_addr().context("Invalid server address")?;
    let app = app::create_app(config, store, notifier)?;

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
