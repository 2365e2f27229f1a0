//! Location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::Location;

/// Database row mapping for the locations table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
    pub id: i64,
    pub device_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f32>,
    pub speed: Option<f32>,
    pub heading: Option<f32>,
    pub client_timestamp: i64,
    pub received_at: DateTime<Utc>,
}

impl From<LocationEntity> for Location {
    fn from(entity: LocationEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            accuracy: entity.accuracy,
            speed: entity.speed,
            heading: entity.heading,
            client_timestamp: entity.client_timestamp,
            received_at: entity.received_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_entity_to_domain() {
        let entity = LocationEntity {
            id: 100,
            device_id: 4,
            latitude: 10.0,
            longitude: 10.5,
            accuracy: Some(8.0),
            speed: None,
            heading: Some(270.0),
            client_timestamp: 1_700_000_000_000,
            received_at: Utc::now(),
        };

        let location: Location = entity.clone().into();
        assert_eq!(location.id, 100);
        assert_eq!(location.device_id, 4);
        assert_eq!(location.accuracy, Some(8.0));
        assert!(location.speed.is_none());
        assert_eq!(location.client_timestamp, entity.client_timestamp);
        assert_eq!(location.received_at, entity.received_at);
    }
}
