//! Owner-scoped device registry.

use std::sync::Arc;

use shared::pagination::clamp_limit;
use tracing::info;
use validator::Validate;

use crate::error::DomainError;
use crate::models::device::{CreateDeviceRequest, UpdateDeviceRequest};
use crate::models::{Device, Location};
use crate::store::{StoreError, TrackingStore};

#[derive(Clone)]
pub struct DeviceService {
    store: Arc<dyn TrackingStore>,
    default_history: i64,
    max_history: i64,
}

impl DeviceService {
    pub fn new(store: Arc<dyn TrackingStore>, default_history: i64, max_history: i64) -> Self {
        Self {
            store,
            default_history,
            max_history,
        }
    }

    pub async fn register(
        &self,
        owner_id: i64,
        request: CreateDeviceRequest,
    ) -> Result<Device, DomainError> {
        request.validate()?;

        let device = self
            .store
            .create_device(request.into_new_device(owner_id))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    DomainError::Conflict("Serial number already registered".to_string())
                }
                other => DomainError::storage("create_device")(other),
            })?;

        info!(device_id = device.id, owner_id, "Device registered");
        Ok(device)
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<Device>, DomainError> {
        self.store
            .list_devices_by_owner(owner_id)
            .await
            .map_err(DomainError::storage("list_devices"))
    }

    /// Devices of other owners are reported as not found.
    pub async fn status(&self, owner_id: i64, device_id: i64) -> Result<Device, DomainError> {
        self.store
            .find_device(device_id)
            .await
            .map_err(DomainError::storage("find_device"))?
            .filter(|d| d.owner_id == owner_id)
            .ok_or(DomainError::NotFound("Device"))
    }

    pub async fn update(
        &self,
        owner_id: i64,
        device_id: i64,
        request: UpdateDeviceRequest,
    ) -> Result<Device, DomainError> {
        request.validate()?;

        self.store
            .update_device(device_id, owner_id, request.into())
            .await
            .map_err(DomainError::storage("update_device"))?
            .ok_or(DomainError::NotFound("Device"))
    }

    pub async fn delete(&self, owner_id: i64, device_id: i64) -> Result<(), DomainError> {
        let deleted = self
            .store
            .delete_device(device_id, owner_id)
            .await
            .map_err(DomainError::storage("delete_device"))?;
        if !deleted {
            return Err(DomainError::NotFound("Device"));
        }

        info!(device_id, owner_id, "Device deleted");
        Ok(())
    }

    /// Most recent locations first.
    pub async fn locations(
        &self,
        owner_id: i64,
        device_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Location>, DomainError> {
        self.status(owner_id, device_id).await?;

        let limit = clamp_limit(limit, self.default_history, self.max_history);
        self.store
            .list_locations(device_id, limit)
            .await
            .map_err(DomainError::storage("list_locations"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLocation;
    use crate::store::InMemoryStore;
    use chrono::Utc;

    fn request(serial: &str) -> CreateDeviceRequest {
        CreateDeviceRequest {
            serial_number: serial.to_string(),
            imei: None,
            model: Some("PT-200".to_string()),
            firmware: None,
            pet_name: Some("Rex".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_and_duplicate_serial() {
        let service = DeviceService::new(Arc::new(InMemoryStore::new()), 50, 100);

        let device = service.register(1, request("SN-1")).await.unwrap();
        assert!(device.active);
        assert_eq!(device.owner_id, 1);

        let err = service.register(2, request("SN-1")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_other_owners_device_is_not_found() {
        let service = DeviceService::new(Arc::new(InMemoryStore::new()), 50, 100);
        let device = service.register(1, request("SN-1")).await.unwrap();

        assert!(service.status(1, device.id).await.is_ok());
        assert!(matches!(
            service.status(2, device.id).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(2, device.id).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update(2, device.id, UpdateDeviceRequest::default())
                .await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_device() {
        let service = DeviceService::new(Arc::new(InMemoryStore::new()), 50, 100);
        let device = service.register(1, request("SN-1")).await.unwrap();

        let updated = service
            .update(
                1,
                device.id,
                UpdateDeviceRequest {
                    pet_name: Some("Luna".to_string()),
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.pet_name.as_deref(), Some("Luna"));
        assert_eq!(updated.model.as_deref(), Some("PT-200"));
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn test_location_history_is_clamped() {
        let store = Arc::new(InMemoryStore::new());
        let service = DeviceService::new(store.clone(), 2, 3);
        let device = service.register(1, request("SN-1")).await.unwrap();

        for i in 0..5 {
            store
                .insert_location(NewLocation {
                    device_id: device.id,
                    latitude: 10.0 + f64::from(i) * 0.001,
                    longitude: 10.0,
                    accuracy: None,
                    speed: None,
                    heading: None,
                    client_timestamp: i64::from(i),
                    received_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let default = service.locations(1, device.id, None).await.unwrap();
        assert_eq!(default.len(), 2);
        assert_eq!(default[0].client_timestamp, 4);

        let clamped = service.locations(1, device.id, Some(500)).await.unwrap();
        assert_eq!(clamped.len(), 3);

        assert!(service.locations(2, device.id, None).await.is_err());
    }
}
