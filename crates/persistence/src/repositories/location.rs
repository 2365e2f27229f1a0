//! Location repository for database operations.

use sqlx::PgPool;

use domain::models::NewLocation;

use crate::entities::LocationEntity;
use crate::metrics::QueryTimer;

/// Repository for location-related database operations.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a location sample.
    pub async fn insert(&self, location: &NewLocation) -> Result<LocationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_location");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            INSERT INTO locations (device_id, latitude, longitude, accuracy, speed, heading,
                                   client_timestamp, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, device_id, latitude, longitude, accuracy, speed, heading,
                      client_timestamp, received_at
            "#,
        )
        .bind(location.device_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.accuracy)
        .bind(location.speed)
        .bind(location.heading)
        .bind(location.client_timestamp)
        .bind(location.received_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent samples for a device.
    pub async fn find_recent(
        &self,
        device_id: i64,
        limit: i64,
    ) -> Result<Vec<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_recent_locations");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT id, device_id, latitude, longitude, accuracy, speed, heading,
                   client_timestamp, received_at
            FROM locations
            WHERE device_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
