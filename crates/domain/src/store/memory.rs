//! Process-local [`TrackingStore`].
//!
//! Mirrors the relational constraints of the PostgreSQL schema (unique serial
//! numbers, one geofence per owner, alert-to-device foreign key, cascades) so
//! that services behave the same against either backend. Individual
//! operations can be made to fail with [`InMemoryStore::fail_on`].

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::pagination::AlertCursor;
use tokio::sync::Mutex;

use super::{NotificationTarget, StoreError, TrackingStore};
use crate::models::{
    Alert, AlertWithPet, Device, DeviceChanges, Geofence, GeofenceChanges, Location, NewAlert,
    NewDevice, NewGeofence, NewLocation,
};

#[derive(Default)]
struct State {
    next_id: i64,
    devices: BTreeMap<i64, Device>,
    locations: BTreeMap<i64, Location>,
    geofences: BTreeMap<i64, Geofence>,
    geofence_devices: HashSet<(i64, i64)>,
    alerts: BTreeMap<i64, Alert>,
    push_tokens: HashMap<i64, String>,
    failing: HashSet<&'static str>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.failing.contains(operation) {
            return Err(StoreError::Backend(format!("{} unavailable", operation)));
        }
        Ok(())
    }

    fn owns_alert(&self, alert: &Alert, owner_id: i64) -> bool {
        self.devices
            .get(&alert.device_id)
            .is_some_and(|d| d.owner_id == owner_id)
    }
}

/// In-memory storage backend.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call to `operation` (a trait method name) fail
    /// with a backend error.
    pub async fn fail_on(&self, operation: &'static str) {
        self.state.lock().await.failing.insert(operation);
    }

    /// Clears all injected failures.
    pub async fn recover(&self) {
        self.state.lock().await.failing.clear();
    }

    pub async fn location_count(&self) -> usize {
        self.state.lock().await.locations.len()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.state.lock().await.alerts.values().cloned().collect()
    }

    /// Nulls a geofence's center and radius, as a legacy row may have them.
    #[cfg(test)]
    pub(crate) async fn clear_geofence_circle(&self, geofence_id: i64) {
        if let Some(geofence) = self.state.lock().await.geofences.get_mut(&geofence_id) {
            geofence.latitude = None;
            geofence.longitude = None;
            geofence.radius_m = None;
        }
    }
}

#[async_trait]
impl TrackingStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.state.lock().await.check("ping")
    }

    async fn create_device(&self, device: NewDevice) -> Result<Device, StoreError> {
        let mut state = self.state.lock().await;
        state.check("create_device")?;

        if state
            .devices
            .values()
            .any(|d| d.serial_number == device.serial_number)
        {
            return Err(StoreError::Conflict(format!(
                "serial number {} already registered",
                device.serial_number
            )));
        }

        let id = state.next_id();
        let device = Device {
            id,
            owner_id: device.owner_id,
            serial_number: device.serial_number,
            imei: device.imei,
            model: device.model,
            firmware: device.firmware,
            pet_name: device.pet_name,
            active: true,
            last_latitude: None,
            last_longitude: None,
            last_comm: None,
            created_at: Utc::now(),
        };
        state.devices.insert(id, device.clone());
        Ok(device)
    }

    async fn find_device(&self, device_id: i64) -> Result<Option<Device>, StoreError> {
        let state = self.state.lock().await;
        state.check("find_device")?;
        Ok(state.devices.get(&device_id).cloned())
    }

    async fn list_devices_by_owner(&self, owner_id: i64) -> Result<Vec<Device>, StoreError> {
        let state = self.state.lock().await;
        state.check("list_devices_by_owner")?;
        Ok(state
            .devices
            .values()
            .rev()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_device(
        &self,
        device_id: i64,
        owner_id: i64,
        changes: DeviceChanges,
    ) -> Result<Option<Device>, StoreError> {
        let mut state = self.state.lock().await;
        state.check("update_device")?;
        Ok(state
            .devices
            .get_mut(&device_id)
            .filter(|d| d.owner_id == owner_id)
            .map(|device| {
                changes.apply(device);
                device.clone()
            }))
    }

    async fn delete_device(&self, device_id: i64, owner_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        state.check("delete_device")?;

        let owned = state
            .devices
            .get(&device_id)
            .is_some_and(|d| d.owner_id == owner_id);
        if !owned {
            return Ok(false);
        }

        state.devices.remove(&device_id);
        state.locations.retain(|_, l| l.device_id != device_id);
        state.alerts.retain(|_, a| a.device_id != device_id);
        state.geofence_devices.retain(|(_, d)| *d != device_id);
        Ok(true)
    }

    async fn update_device_position(
        &self,
        device_id: i64,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<Device>, StoreError> {
        let mut state = self.state.lock().await;
        state.check("update_device_position")?;
        Ok(state.devices.get_mut(&device_id).map(|device| {
            device.last_latitude = Some(latitude);
            device.last_longitude = Some(longitude);
            device.last_comm = Some(at);
            device.clone()
        }))
    }

    async fn insert_location(&self, location: NewLocation) -> Result<Location, StoreError> {
        let mut state = self.state.lock().await;
        state.check("insert_location")?;

        let id = state.next_id();
        let location = Location {
            id,
            device_id: location.device_id,
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy: location.accuracy,
            speed: location.speed,
            heading: location.heading,
            client_timestamp: location.client_timestamp,
            received_at: location.received_at,
        };
        state.locations.insert(id, location.clone());
        Ok(location)
    }

    async fn list_locations(
        &self,
        device_id: i64,
        limit: i64,
    ) -> Result<Vec<Location>, StoreError> {
        let state = self.state.lock().await;
        state.check("list_locations")?;
        Ok(state
            .locations
            .values()
            .rev()
            .filter(|l| l.device_id == device_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn find_geofence_by_owner(&self, owner_id: i64) -> Result<Option<Geofence>, StoreError> {
        let state = self.state.lock().await;
        state.check("find_geofence_by_owner")?;
        Ok(state
            .geofences
            .values()
            .find(|g| g.owner_id == owner_id)
            .cloned())
    }

    async fn find_active_geofence_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Option<Geofence>, StoreError> {
        let state = self.state.lock().await;
        state.check("find_active_geofence_by_owner")?;
        Ok(state
            .geofences
            .values()
            .find(|g| g.owner_id == owner_id && g.active)
            .cloned())
    }

    async fn create_geofence(
        &self,
        geofence: NewGeofence,
    ) -> Result<(Geofence, Vec<i64>), StoreError> {
        let mut state = self.state.lock().await;
        state.check("create_geofence")?;

        if state
            .geofences
            .values()
            .any(|g| g.owner_id == geofence.owner_id)
        {
            return Err(StoreError::Conflict(format!(
                "owner {} already has a geofence",
                geofence.owner_id
            )));
        }

        let id = state.next_id();
        let geofence = Geofence {
            id,
            owner_id: geofence.owner_id,
            name: geofence.name,
            latitude: Some(geofence.latitude),
            longitude: Some(geofence.longitude),
            radius_m: Some(geofence.radius_m),
            active: true,
            created_at: Utc::now(),
        };

        let device_ids: Vec<i64> = state
            .devices
            .values()
            .filter(|d| d.owner_id == geofence.owner_id && d.active)
            .map(|d| d.id)
            .collect();
        for device_id in &device_ids {
            state.geofence_devices.insert((id, *device_id));
        }
        state.geofences.insert(id, geofence.clone());

        Ok((geofence, device_ids))
    }

    async fn update_geofence(
        &self,
        geofence_id: i64,
        changes: GeofenceChanges,
    ) -> Result<Option<Geofence>, StoreError> {
        let mut state = self.state.lock().await;
        state.check("update_geofence")?;
        Ok(state.geofences.get_mut(&geofence_id).map(|geofence| {
            changes.apply(geofence);
            geofence.clone()
        }))
    }

    async fn delete_geofence(&self, geofence_id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        state.check("delete_geofence")?;

        state.geofence_devices.retain(|(g, _)| *g != geofence_id);
        Ok(state.geofences.remove(&geofence_id).is_some())
    }

    async fn geofence_device_ids(&self, geofence_id: i64) -> Result<Vec<i64>, StoreError> {
        let state = self.state.lock().await;
        state.check("geofence_device_ids")?;
        let mut ids: Vec<i64> = state
            .geofence_devices
            .iter()
            .filter(|(g, _)| *g == geofence_id)
            .map(|(_, d)| *d)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let mut state = self.state.lock().await;
        state.check("insert_alert")?;

        if !state.devices.contains_key(&alert.device_id) {
            return Err(StoreError::ForeignKey(format!(
                "device {} does not exist",
                alert.device_id
            )));
        }

        let id = state.next_id();
        let alert = Alert {
            id,
            device_id: alert.device_id,
            geofence_id: alert.geofence_id,
            alert_type: alert.alert_type,
            alert_timestamp: alert.alert_timestamp,
            acknowledged_by: None,
            acknowledged_at: None,
        };
        state.alerts.insert(id, alert.clone());
        Ok(alert)
    }

    async fn list_alerts_by_owner(
        &self,
        owner_id: i64,
        cursor: Option<AlertCursor>,
        limit: i64,
    ) -> Result<Vec<AlertWithPet>, StoreError> {
        let state = self.state.lock().await;
        state.check("list_alerts_by_owner")?;

        let mut alerts: Vec<AlertWithPet> = state
            .alerts
            .values()
            .filter(|a| cursor.map_or(true, |c| c.precedes(a.alert_timestamp, a.id)))
            .filter_map(|a| {
                let device = state.devices.get(&a.device_id)?;
                (device.owner_id == owner_id).then(|| AlertWithPet {
                    alert: a.clone(),
                    pet_name: device.label().to_string(),
                })
            })
            .collect();

        alerts.sort_by(|a, b| {
            (b.alert.alert_timestamp, b.alert.id).cmp(&(a.alert.alert_timestamp, a.alert.id))
        });
        alerts.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(alerts)
    }

    async fn count_unread_alerts(&self, owner_id: i64) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        state.check("count_unread_alerts")?;
        let count = state
            .alerts
            .values()
            .filter(|a| a.is_unread() && state.owns_alert(a, owner_id))
            .count();
        Ok(count as i64)
    }

    async fn acknowledge_alert(
        &self,
        alert_id: i64,
        owner_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError> {
        let mut state = self.state.lock().await;
        state.check("acknowledge_alert")?;

        let owned = state
            .alerts
            .get(&alert_id)
            .is_some_and(|a| state.owns_alert(a, owner_id));
        if !owned {
            return Ok(None);
        }

        Ok(state.alerts.get_mut(&alert_id).map(|alert| {
            if alert.acknowledged_at.is_none() {
                alert.acknowledged_by = Some(owner_id);
                alert.acknowledged_at = Some(at);
            }
            alert.clone()
        }))
    }

    async fn acknowledge_all_alerts(
        &self,
        owner_id: i64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        state.check("acknowledge_all_alerts")?;

        let unread: Vec<i64> = state
            .alerts
            .values()
            .filter(|a| a.is_unread() && state.owns_alert(a, owner_id))
            .map(|a| a.id)
            .collect();

        for id in &unread {
            if let Some(alert) = state.alerts.get_mut(id) {
                alert.acknowledged_by = Some(owner_id);
                alert.acknowledged_at = Some(at);
            }
        }
        Ok(unread.len() as u64)
    }

    async fn upsert_push_token(&self, owner_id: i64, fcm_token: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check("upsert_push_token")?;
        state.push_tokens.insert(owner_id, fcm_token.to_string());
        Ok(())
    }

    async fn notification_target(
        &self,
        device_id: i64,
    ) -> Result<Option<NotificationTarget>, StoreError> {
        let state = self.state.lock().await;
        state.check("notification_target")?;

        let Some(device) = state.devices.get(&device_id) else {
            return Ok(None);
        };
        Ok(state
            .push_tokens
            .get(&device.owner_id)
            .map(|token| NotificationTarget {
                fcm_token: token.clone(),
                pet_name: device.label().to_string(),
            }))
    }
}
