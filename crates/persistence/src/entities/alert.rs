//! Alert entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::{Alert, AlertWithPet};

/// Database row mapping for the alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertEntity {
    pub id: i64,
    pub device_id: i64,
    pub geofence_id: Option<i64>,
    pub alert_type: String,
    pub alert_timestamp: DateTime<Utc>,
    pub acknowledged_by: Option<i64>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl From<AlertEntity> for Alert {
    fn from(entity: AlertEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            geofence_id: entity.geofence_id,
            alert_type: entity.alert_type,
            alert_timestamp: entity.alert_timestamp,
            acknowledged_by: entity.acknowledged_by,
            acknowledged_at: entity.acknowledged_at,
        }
    }
}

/// Alert row joined with its device's display label.
#[derive(Debug, Clone, FromRow)]
pub struct AlertWithPetEntity {
    #[sqlx(flatten)]
    pub alert: AlertEntity,
    pub pet_name: String,
}

impl From<AlertWithPetEntity> for AlertWithPet {
    fn from(entity: AlertWithPetEntity) -> Self {
        Self {
            alert: entity.alert.into(),
            pet_name: entity.pet_name,
        }
    }
}

/// Push token and pet label for a device's owner.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationTargetEntity {
    pub fcm_token: String,
    pub pet_name: String,
}
