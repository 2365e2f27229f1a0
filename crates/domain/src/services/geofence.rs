//! Geofence lifecycle: one safe zone per owner.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::error::DomainError;
use crate::models::geofence::{CreateGeofenceRequest, GeofenceResponse, UpdateGeofenceRequest};
use crate::models::GeofenceChanges;
use crate::store::{StoreError, TrackingStore};

const CONFLICT_MESSAGE: &str =
    "A geofence already exists for this account. Delete it before creating a new one.";

#[derive(Clone)]
pub struct GeofenceService {
    store: Arc<dyn TrackingStore>,
}

impl GeofenceService {
    pub fn new(store: Arc<dyn TrackingStore>) -> Self {
        Self { store }
    }

    /// Creates the owner's geofence and associates their active devices.
    ///
    /// Any existing geofence row, active or not, blocks creation. The store
    /// enforces the same rule atomically so that concurrent creates cannot
    /// both succeed.
    pub async fn create(
        &self,
        owner_id: i64,
        request: CreateGeofenceRequest,
    ) -> Result<GeofenceResponse, DomainError> {
        request.validate()?;

        if self
            .store
            .find_geofence_by_owner(owner_id)
            .await
            .map_err(DomainError::storage("find_geofence"))?
            .is_some()
        {
            return Err(DomainError::Conflict(CONFLICT_MESSAGE.to_string()));
        }

        let (geofence, device_ids) = self
            .store
            .create_geofence(request.into_new_geofence(owner_id))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => DomainError::Conflict(CONFLICT_MESSAGE.to_string()),
                other => DomainError::storage("create_geofence")(other),
            })?;

        info!(
            geofence_id = geofence.id,
            owner_id,
            devices = device_ids.len(),
            "Geofence created"
        );

        Ok(GeofenceResponse {
            geofence,
            device_ids,
        })
    }

    pub async fn get(&self, owner_id: i64) -> Result<GeofenceResponse, DomainError> {
        let geofence = self
            .store
            .find_geofence_by_owner(owner_id)
            .await
            .map_err(DomainError::storage("find_geofence"))?
            .ok_or(DomainError::NotFound("Geofence"))?;

        let device_ids = self
            .store
            .geofence_device_ids(geofence.id)
            .await
            .map_err(DomainError::storage("geofence_devices"))?;

        Ok(GeofenceResponse {
            geofence,
            device_ids,
        })
    }

    /// Applies a partial update. Zero values in the request leave fields as they are.
    pub async fn update(
        &self,
        owner_id: i64,
        request: UpdateGeofenceRequest,
    ) -> Result<GeofenceResponse, DomainError> {
        request.validate()?;

        let existing = self
            .store
            .find_geofence_by_owner(owner_id)
            .await
            .map_err(DomainError::storage("find_geofence"))?
            .ok_or(DomainError::NotFound("Geofence"))?;

        let changes = GeofenceChanges::from(request);
        let geofence = self
            .store
            .update_geofence(existing.id, changes)
            .await
            .map_err(DomainError::storage("update_geofence"))?
            .ok_or(DomainError::NotFound("Geofence"))?;

        let device_ids = self
            .store
            .geofence_device_ids(geofence.id)
            .await
            .map_err(DomainError::storage("geofence_devices"))?;

        info!(geofence_id = geofence.id, owner_id, "Geofence updated");

        Ok(GeofenceResponse {
            geofence,
            device_ids,
        })
    }

    pub async fn delete(&self, owner_id: i64) -> Result<(), DomainError> {
        let geofence = self
            .store
            .find_geofence_by_owner(owner_id)
            .await
            .map_err(DomainError::storage("find_geofence"))?
            .ok_or(DomainError::NotFound("Geofence"))?;

        let deleted = self
            .store
            .delete_geofence(geofence.id)
            .await
            .map_err(DomainError::storage("delete_geofence"))?;
        if !deleted {
            return Err(DomainError::NotFound("Geofence"));
        }

        info!(geofence_id = geofence.id, owner_id, "Geofence deleted");
        Ok(())
    }
}
