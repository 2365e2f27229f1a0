//! Alert repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::models::NewAlert;
use shared::pagination::AlertCursor;

use crate::entities::{AlertEntity, AlertWithPetEntity};
use crate::metrics::QueryTimer;

/// Repository for alert-related database operations.
#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Creates a new AlertRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an alert. Fails with a foreign key violation for unknown devices.
    pub async fn insert(&self, alert: &NewAlert) -> Result<AlertEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_alert");
        let result = sqlx::query_as::<_, AlertEntity>(
            r#"
            INSERT INTO alerts (device_id, geofence_id, alert_type, alert_timestamp)
            VALUES ($1, $2, $3, $4)
            RETURNING id, device_id, geofence_id, alert_type, alert_timestamp,
                      acknowledged_by, acknowledged_at
            "#,
        )
        .bind(alert.device_id)
        .bind(alert.geofence_id)
        .bind(&alert.alert_type)
        .bind(alert.alert_timestamp)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Alerts of the owner's devices, newest first, after the cursor.
    pub async fn find_by_owner(
        &self,
        owner_id: i64,
        cursor: Option<AlertCursor>,
        limit: i64,
    ) -> Result<Vec<AlertWithPetEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_alerts_by_owner");
        let result = sqlx::query_as::<_, AlertWithPetEntity>(
            r#"
            SELECT a.id, a.device_id, a.geofence_id, a.alert_type, a.alert_timestamp,
                   a.acknowledged_by, a.acknowledged_at,
                   COALESCE(NULLIF(BTRIM(d.pet_name), ''), d.serial_number) AS pet_name
            FROM alerts a
            JOIN devices d ON d.id = a.device_id
            WHERE d.owner_id = $1
              AND ($2::timestamptz IS NULL OR (a.alert_timestamp, a.id) < ($2, $3))
            ORDER BY a.alert_timestamp DESC, a.id DESC
            LIMIT $4
            "#,
        )
        .bind(owner_id)
        .bind(cursor.map(|c| c.alert_timestamp))
        .bind(cursor.map(|c| c.id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count unacknowledged alerts of the owner's devices.
    pub async fn count_unread(&self, owner_id: i64) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_unread_alerts");
        let result = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM alerts a
            JOIN devices d ON d.id = a.device_id
            WHERE d.owner_id = $1 AND a.acknowledged_at IS NULL
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Acknowledge one alert. The first acknowledgement is kept.
    pub async fn acknowledge(
        &self,
        id: i64,
        owner_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<AlertEntity>, sqlx::Error> {
        let timer = QueryTimer::new("acknowledge_alert");
        let result = sqlx::query_as::<_, AlertEntity>(
            r#"
            UPDATE alerts a SET
                acknowledged_by = COALESCE(a.acknowledged_by, $2),
                acknowledged_at = COALESCE(a.acknowledged_at, $3)
            FROM devices d
            WHERE a.id = $1 AND d.id = a.device_id AND d.owner_id = $2
            RETURNING a.id, a.device_id, a.geofence_id, a.alert_type, a.alert_timestamp,
                      a.acknowledged_by, a.acknowledged_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Acknowledge every unread alert of the owner's devices.
    pub async fn acknowledge_all(
        &self,
        owner_id: i64,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("acknowledge_all_alerts");
        let result = sqlx::query(
            r#"
            UPDATE alerts a SET
                acknowledged_by = $1,
                acknowledged_at = $2
            FROM devices d
            WHERE d.id = a.device_id AND d.owner_id = $1 AND a.acknowledged_at IS NULL
            "#,
        )
        .bind(owner_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
