//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::Device;

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: i64,
    pub owner_id: i64,
    pub serial_number: String,
    pub imei: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub pet_name: Option<String>,
    pub active: bool,
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
    pub last_comm: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DeviceEntity> for Device {
    fn from(entity: DeviceEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            serial_number: entity.serial_number,
            imei: entity.imei,
            model: entity.model,
            firmware: entity.firmware,
            pet_name: entity.pet_name,
            active: entity.active,
            last_latitude: entity.last_latitude,
            last_longitude: entity.last_longitude,
            last_comm: entity.last_comm,
            created_at: entity.created_at,
        }
    }
}
