//! Push token repository for database operations.

use sqlx::PgPool;

use crate::entities::NotificationTargetEntity;
use crate::metrics::QueryTimer;

/// Repository for owners' FCM registration tokens.
#[derive(Clone)]
pub struct PushTokenRepository {
    pool: PgPool,
}

impl PushTokenRepository {
    /// Creates a new PushTokenRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store or replace the owner's token.
    pub async fn upsert(&self, owner_id: i64, fcm_token: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("upsert_push_token");
        let result = sqlx::query(
            r#"
            INSERT INTO push_tokens (owner_id, fcm_token, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (owner_id) DO UPDATE SET
                fcm_token = EXCLUDED.fcm_token,
                updated_at = NOW()
            "#,
        )
        .bind(owner_id)
        .bind(fcm_token)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Token of the device's owner together with the device's pet label.
    pub async fn find_target_for_device(
        &self,
        device_id: i64,
    ) -> Result<Option<NotificationTargetEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_notification_target");
        let result = sqlx::query_as::<_, NotificationTargetEntity>(
            r#"
            SELECT p.fcm_token,
                   COALESCE(NULLIF(BTRIM(d.pet_name), ''), d.serial_number) AS pet_name
            FROM devices d
            JOIN push_tokens p ON p.owner_id = d.owner_id
            WHERE d.id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
