//! Geofence repository for database operations.

use sqlx::PgPool;

use domain::models::{GeofenceChanges, NewGeofence};

use crate::entities::GeofenceEntity;
use crate::metrics::QueryTimer;

/// Repository for geofence-related database operations.
#[derive(Clone)]
pub struct GeofenceRepository {
    pool: PgPool,
}

impl GeofenceRepository {
    /// Creates a new GeofenceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a geofence and associate the owner's active devices.
    ///
    /// Both steps run in one transaction. The unique index on `owner_id`
    /// rejects a second geofence with a unique violation.
    pub async fn create_with_devices(
        &self,
        geofence: &NewGeofence,
    ) -> Result<(GeofenceEntity, Vec<i64>), sqlx::Error> {
        let timer = QueryTimer::new("create_geofence");
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            INSERT INTO geofences (owner_id, name, latitude, longitude, radius_m)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, name, latitude, longitude, radius_m, active, created_at
            "#,
        )
        .bind(geofence.owner_id)
        .bind(&geofence.name)
        .bind(geofence.latitude)
        .bind(geofence.longitude)
        .bind(geofence.radius_m)
        .fetch_one(&mut *tx)
        .await?;

        let mut device_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO geofence_devices (geofence_id, device_id)
            SELECT $1, id FROM devices
            WHERE owner_id = $2 AND active = true
            RETURNING device_id
            "#,
        )
        .bind(entity.id)
        .bind(geofence.owner_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        device_ids.sort_unstable();
        Ok((entity, device_ids))
    }

    /// Find the owner's geofence, optionally only if active.
    pub async fn find_by_owner(
        &self,
        owner_id: i64,
        active_only: bool,
    ) -> Result<Option<GeofenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_geofence_by_owner");
        let result = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            SELECT id, owner_id, name, latitude, longitude, radius_m, active, created_at
            FROM geofences
            WHERE owner_id = $1 AND (active = true OR NOT $2)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .bind(active_only)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update. `None` values are preserved.
    pub async fn update(
        &self,
        id: i64,
        changes: &GeofenceChanges,
    ) -> Result<Option<GeofenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_geofence");
        let result = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            UPDATE geofences SET
                name = COALESCE($2, name),
                latitude = COALESCE($3, latitude),
                longitude = COALESCE($4, longitude),
                radius_m = COALESCE($5, radius_m),
                active = COALESCE($6, active)
            WHERE id = $1
            RETURNING id, owner_id, name, latitude, longitude, radius_m, active, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(changes.radius_m)
        .bind(changes.active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete associations, then the geofence, in one transaction.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_geofence");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM geofence_devices WHERE geofence_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM geofences WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        timer.record();
        Ok(deleted > 0)
    }

    /// IDs of the devices associated with a geofence.
    pub async fn device_ids(&self, id: i64) -> Result<Vec<i64>, sqlx::Error> {
        let timer = QueryTimer::new("find_geofence_devices");
        let result = sqlx::query_scalar(
            r#"
            SELECT device_id FROM geofence_devices
            WHERE geofence_id = $1
            ORDER BY device_id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
