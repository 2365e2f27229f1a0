//! PostgreSQL-backed [`TrackingStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::models::{
    Alert, AlertWithPet, Device, DeviceChanges, Geofence, GeofenceChanges, Location, NewAlert,
    NewDevice, NewGeofence, NewLocation,
};
use domain::store::NotificationTarget;
use domain::{StoreError, TrackingStore};
use shared::pagination::AlertCursor;

use crate::metrics::record_pool_metrics;
use crate::repositories::{
    AlertRepository, DeviceRepository, GeofenceRepository, LocationRepository,
    PushTokenRepository,
};

/// Maps driver errors onto the storage error vocabulary.
///
/// PostgreSQL reports unique violations as `23505` and foreign key
/// violations as `23503`.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::Conflict(db_err.message().to_string()),
            Some("23503") => StoreError::ForeignKey(db_err.message().to_string()),
            _ => StoreError::Backend(db_err.to_string()),
        },
        other => StoreError::Backend(other.to_string()),
    }
}

/// Tracking store over a shared connection pool.
#[derive(Clone)]
pub struct PgTrackingStore {
    pool: PgPool,
    devices: DeviceRepository,
    locations: LocationRepository,
    geofences: GeofenceRepository,
    alerts: AlertRepository,
    push_tokens: PushTokenRepository,
}

impl PgTrackingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            devices: DeviceRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            geofences: GeofenceRepository::new(pool.clone()),
            alerts: AlertRepository::new(pool.clone()),
            push_tokens: PushTokenRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TrackingStore for PgTrackingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        record_pool_metrics(&self.pool);
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }

    async fn create_device(&self, device: NewDevice) -> Result<Device, StoreError> {
        self.devices
            .create(&device)
            .await
            .map(Into::into)
            .map_err(store_error)
    }

    async fn find_device(&self, device_id: i64) -> Result<Option<Device>, StoreError> {
        self.devices
            .find_by_id(device_id)
            .await
            .map(|d| d.map(Into::into))
            .map_err(store_error)
    }

    async fn list_devices_by_owner(&self, owner_id: i64) -> Result<Vec<Device>, StoreError> {
        self.devices
            .find_by_owner(owner_id)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn update_device(
        &self,
        device_id: i64,
        owner_id: i64,
        changes: DeviceChanges,
    ) -> Result<Option<Device>, StoreError> {
        self.devices
            .update(device_id, owner_id, &changes)
            .await
            .map(|d| d.map(Into::into))
            .map_err(store_error)
    }

    async fn delete_device(&self, device_id: i64, owner_id: i64) -> Result<bool, StoreError> {
        self.devices
            .delete(device_id, owner_id)
            .await
            .map_err(store_error)
    }

    async fn update_device_position(
        &self,
        device_id: i64,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<Device>, StoreError> {
        self.devices
            .update_position(device_id, latitude, longitude, at)
            .await
            .map(|d| d.map(Into::into))
            .map_err(store_error)
    }

    async fn insert_location(&self, location: NewLocation) -> Result<Location, StoreError> {
        self.locations
            .insert(&location)
            .await
            .map(Into::into)
            .map_err(store_error)
    }

    async fn list_locations(
        &self,
        device_id: i64,
        limit: i64,
    ) -> Result<Vec<Location>, StoreError> {
        self.locations
            .find_recent(device_id, limit)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn find_geofence_by_owner(&self, owner_id: i64) -> Result<Option<Geofence>, StoreError> {
        self.geofences
            .find_by_owner(owner_id, false)
            .await
            .map(|g| g.map(Into::into))
            .map_err(store_error)
    }

    async fn find_active_geofence_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Option<Geofence>, StoreError> {
        self.geofences
            .find_by_owner(owner_id, true)
            .await
            .map(|g| g.map(Into::into))
            .map_err(store_error)
    }

    async fn create_geofence(
        &self,
        geofence: NewGeofence,
    ) -> Result<(Geofence, Vec<i64>), StoreError> {
        self.geofences
            .create_with_devices(&geofence)
            .await
            .map(|(g, ids)| (g.into(), ids))
            .map_err(store_error)
    }

    async fn update_geofence(
        &self,
        geofence_id: i64,
        changes: GeofenceChanges,
    ) -> Result<Option<Geofence>, StoreError> {
        self.geofences
            .update(geofence_id, &changes)
            .await
            .map(|g| g.map(Into::into))
            .map_err(store_error)
    }

    async fn delete_geofence(&self, geofence_id: i64) -> Result<bool, StoreError> {
        self.geofences
            .delete(geofence_id)
            .await
            .map_err(store_error)
    }

    async fn geofence_device_ids(&self, geofence_id: i64) -> Result<Vec<i64>, StoreError> {
        self.geofences
            .device_ids(geofence_id)
            .await
            .map_err(store_error)
    }

    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        self.alerts
            .insert(&alert)
            .await
            .map(Into::into)
            .map_err(store_error)
    }

    async fn list_alerts_by_owner(
        &self,
        owner_id: i64,
        cursor: Option<AlertCursor>,
        limit: i64,
    ) -> Result<Vec<AlertWithPet>, StoreError> {
        self.alerts
            .find_by_owner(owner_id, cursor, limit)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn count_unread_alerts(&self, owner_id: i64) -> Result<i64, StoreError> {
        self.alerts
            .count_unread(owner_id)
            .await
            .map_err(store_error)
    }

    async fn acknowledge_alert(
        &self,
        alert_id: i64,
        owner_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError> {
        self.alerts
            .acknowledge(alert_id, owner_id, at)
            .await
            .map(|a| a.map(Into::into))
            .map_err(store_error)
    }

    async fn acknowledge_all_alerts(
        &self,
        owner_id: i64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.alerts
            .acknowledge_all(owner_id, at)
            .await
            .map_err(store_error)
    }

    async fn upsert_push_token(&self, owner_id: i64, fcm_token: &str) -> Result<(), StoreError> {
        self.push_tokens
            .upsert(owner_id, fcm_token)
            .await
            .map_err(store_error)
    }

    async fn notification_target(
        &self,
        device_id: i64,
    ) -> Result<Option<NotificationTarget>, StoreError> {
        self.push_tokens
            .find_target_for_device(device_id)
            .await
            .map(|t| {
                t.map(|t| NotificationTarget {
                    fcm_token: t.fcm_token,
                    pet_name: t.pet_name,
                })
            })
            .map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(store_error(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_pool_errors_map_to_backend() {
        let err = store_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
