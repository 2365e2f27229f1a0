//! Geofence entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::Geofence;

/// Database row mapping for the geofences table.
#[derive(Debug, Clone, FromRow)]
pub struct GeofenceEntity {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<GeofenceEntity> for Geofence {
    fn from(entity: GeofenceEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            name: entity.name,
            latitude: entity.latitude,
            longitude: entity.longitude,
            radius_m: entity.radius_m,
            active: entity.active,
            created_at: entity.created_at,
        }
    }
}
