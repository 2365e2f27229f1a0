//! Device repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::models::{DeviceChanges, NewDevice};

use crate::entities::DeviceEntity;
use crate::metrics::QueryTimer;

const DEVICE_COLUMNS: &str = "id, owner_id, serial_number, imei, model, firmware, pet_name, \
     active, last_latitude, last_longitude, last_comm, created_at";

/// Repository for device-related database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new active device.
    pub async fn create(&self, device: &NewDevice) -> Result<DeviceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_device");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            INSERT INTO devices (owner_id, serial_number, imei, model, firmware, pet_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(device.owner_id)
        .bind(&device.serial_number)
        .bind(&device.imei)
        .bind(&device.model)
        .bind(&device.firmware)
        .bind(&device.pet_name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a device by its ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_id");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All devices of an owner, newest first.
    pub async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_devices_by_owner");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            SELECT {DEVICE_COLUMNS} FROM devices
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update scoped to the owner. `None` values are preserved.
    pub async fn update(
        &self,
        id: i64,
        owner_id: i64,
        changes: &DeviceChanges,
    ) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_device");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            UPDATE devices SET
                imei = COALESCE($3, imei),
                model = COALESCE($4, model),
                firmware = COALESCE($5, firmware),
                pet_name = COALESCE($6, pet_name),
                active = COALESCE($7, active)
            WHERE id = $1 AND owner_id = $2
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&changes.imei)
        .bind(&changes.model)
        .bind(&changes.firmware)
        .bind(&changes.pet_name)
        .bind(changes.active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a device and its location history.
    ///
    /// Alerts and geofence associations go with it through foreign key
    /// cascades; locations carry no foreign key and are removed explicitly.
    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_device");
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM devices WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted > 0 {
            sqlx::query("DELETE FROM locations WHERE device_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(deleted > 0)
    }

    /// Record the last known position and communication time.
    pub async fn update_position(
        &self,
        id: i64,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_device_position");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            UPDATE devices SET
                last_latitude = $2,
                last_longitude = $3,
                last_comm = $4
            WHERE id = $1
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
