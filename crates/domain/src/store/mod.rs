//! Storage-access capability.
//!
//! Services receive an `Arc<dyn TrackingStore>` at construction instead of
//! reaching for a process-wide database handle. The PostgreSQL implementation
//! lives in the `persistence` crate; [`memory::InMemoryStore`] backs tests and
//! local runs.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::pagination::AlertCursor;
use thiserror::Error;

use crate::models::{
    Alert, AlertWithPet, Device, DeviceChanges, Geofence, GeofenceChanges, Location, NewAlert,
    NewDevice, NewGeofence, NewLocation,
};

pub use memory::InMemoryStore;

/// Errors reported by a storage backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflicting record: {0}")]
    Conflict(String),

    #[error("Referenced record does not exist: {0}")]
    ForeignKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Who to notify about a device's alerts, and what to call the pet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub fcm_token: String,
    pub pet_name: String,
}

/// Persistence operations needed by the tracking services.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;

    // Devices

    async fn create_device(&self, device: NewDevice) -> Result<Device, StoreError>;

    async fn find_device(&self, device_id: i64) -> Result<Option<Device>, StoreError>;

    async fn list_devices_by_owner(&self, owner_id: i64) -> Result<Vec<Device>, StoreError>;

    async fn update_device(
        &self,
        device_id: i64,
        owner_id: i64,
        changes: DeviceChanges,
    ) -> Result<Option<Device>, StoreError>;

    async fn delete_device(&self, device_id: i64, owner_id: i64) -> Result<bool, StoreError>;

    /// Records the last known position; `None` when the device does not exist.
    async fn update_device_position(
        &self,
        device_id: i64,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<Device>, StoreError>;

    // Locations

    /// Appends a sample. The device is not required to exist.
    async fn insert_location(&self, location: NewLocation) -> Result<Location, StoreError>;

    /// Most recent samples first.
    async fn list_locations(&self, device_id: i64, limit: i64)
        -> Result<Vec<Location>, StoreError>;

    // Geofences

    async fn find_geofence_by_owner(&self, owner_id: i64) -> Result<Option<Geofence>, StoreError>;

    async fn find_active_geofence_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Option<Geofence>, StoreError>;

    /// Inserts the geofence and associates the owner's active devices, as one
    /// unit. Fails with [`StoreError::Conflict`] if the owner already has one.
    async fn create_geofence(
        &self,
        geofence: NewGeofence,
    ) -> Result<(Geofence, Vec<i64>), StoreError>;

    async fn update_geofence(
        &self,
        geofence_id: i64,
        changes: GeofenceChanges,
    ) -> Result<Option<Geofence>, StoreError>;

    /// Removes device associations, then the geofence itself.
    async fn delete_geofence(&self, geofence_id: i64) -> Result<bool, StoreError>;

    async fn geofence_device_ids(&self, geofence_id: i64) -> Result<Vec<i64>, StoreError>;

    // Alerts

    /// Fails with [`StoreError::ForeignKey`] if the device does not exist.
    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError>;

    /// Alerts for the owner's devices, newest first, strictly after `cursor`.
    async fn list_alerts_by_owner(
        &self,
        owner_id: i64,
        cursor: Option<AlertCursor>,
        limit: i64,
    ) -> Result<Vec<AlertWithPet>, StoreError>;

    async fn count_unread_alerts(&self, owner_id: i64) -> Result<i64, StoreError>;

    async fn acknowledge_alert(
        &self,
        alert_id: i64,
        owner_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError>;

    async fn acknowledge_all_alerts(&self, owner_id: i64, at: DateTime<Utc>)
        -> Result<u64, StoreError>;

    // Push tokens

    async fn upsert_push_token(&self, owner_id: i64, fcm_token: &str) -> Result<(), StoreError>;

    /// `None` when the device is unknown or its owner has no token.
    async fn notification_target(
        &self,
        device_id: i64,
    ) -> Result<Option<NotificationTarget>, StoreError>;
}
