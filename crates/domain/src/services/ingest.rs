//! Location ingest pipeline.
//!
//! For every report: persist the sample, refresh the device's last known
//! position, then evaluate the owner's active geofence. Steps are not wrapped
//! in a transaction and a later failure never undoes the stored location.
//! The device refresh is best effort; a storage failure while loading the
//! geofence or writing the alert fails the call with the stage that broke.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::alert::AlertRecorder;
use crate::error::DomainError;
use crate::models::{Alert, Device, Location, LocationReport};
use crate::store::TrackingStore;

/// Stage name reported when the sample cannot be stored.
pub const STAGE_PERSIST_LOCATION: &str = "persist_location";
/// Stage name reported when the owner's geofence cannot be read.
pub const STAGE_LOAD_GEOFENCE: &str = "load_geofence";
/// Stage name reported when an exit alert cannot be written.
pub const STAGE_RECORD_ALERT: &str = "record_alert";

/// Outcome of checking one report against the owner's geofence.
#[derive(Debug, Clone, PartialEq)]
pub enum GeofenceEvaluation {
    /// The device row could not be found or read.
    UnknownDevice,
    /// The owner has no active geofence.
    NoGeofence,
    /// The geofence has no complete center and radius.
    Inert,
    Inside { distance_m: f64 },
    Exited { distance_m: f64, alert: Alert },
}

/// Result of a successful ingest.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub location: Location,
    pub evaluation: GeofenceEvaluation,
}

impl Ingested {
    pub fn alert(&self) -> Option<&Alert> {
        match &self.evaluation {
            GeofenceEvaluation::Exited { alert, .. } => Some(alert),
            _ => None,
        }
    }
}

/// Receives location reports from devices.
#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn TrackingStore>,
    recorder: AlertRecorder,
}

impl IngestService {
    pub fn new(store: Arc<dyn TrackingStore>, recorder: AlertRecorder) -> Self {
        Self { store, recorder }
    }

    /// Runs the full pipeline for one report.
    pub async fn submit_location(&self, report: LocationReport) -> Result<Ingested, DomainError> {
        let now = Utc::now();
        let new_location = report.into_new_location(now)?;

        let location = self
            .store
            .insert_location(new_location)
            .await
            .map_err(DomainError::storage(STAGE_PERSIST_LOCATION))?;

        info!(
            location_id = location.id,
            device_id = location.device_id,
            "Location recorded"
        );

        let evaluation = match self.refresh_device(&location, now).await {
            Some(device) => {
                self.evaluate_geofence(&device, location.latitude, location.longitude, now)
                    .await?
            }
            None => GeofenceEvaluation::UnknownDevice,
        };

        Ok(Ingested {
            location,
            evaluation,
        })
    }

    /// Updates the device's last known position.
    ///
    /// Falls back to a plain read if the update fails so that evaluation can
    /// still run.
    async fn refresh_device(&self, location: &Location, now: DateTime<Utc>) -> Option<Device> {
        let device_id = location.device_id;
        match self
            .store
            .update_device_position(device_id, location.latitude, location.longitude, now)
            .await
        {
            Ok(Some(device)) => Some(device),
            Ok(None) => {
                debug!(device_id, "Location for unknown device, skipping geofence check");
                None
            }
            Err(e) => {
                warn!(device_id, error = %e, "Failed to update device position");
                match self.store.find_device(device_id).await {
                    Ok(device) => device,
                    Err(e) => {
                        warn!(device_id, error = %e, "Failed to load device for geofence check");
                        None
                    }
                }
            }
        }
    }

    /// Checks a position against the device owner's active geofence.
    ///
    /// Storage failures are returned tagged with their stage.
    pub async fn evaluate_geofence(
        &self,
        device: &Device,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Result<GeofenceEvaluation, DomainError> {
        let geofence = self
            .store
            .find_active_geofence_by_owner(device.owner_id)
            .await
            .map_err(|e| {
                warn!(device_id = device.id, error = %e, "Failed to load geofence");
                DomainError::storage(STAGE_LOAD_GEOFENCE)(e)
            })?;
        let Some(geofence) = geofence else {
            debug!(device_id = device.id, owner_id = device.owner_id, "No active geofence");
            return Ok(GeofenceEvaluation::NoGeofence);
        };

        let Some(circle) = geofence.circle() else {
            debug!(geofence_id = geofence.id, "Geofence has no center or radius");
            return Ok(GeofenceEvaluation::Inert);
        };

        let distance_m = circle.distance_to(latitude, longitude);
        if !circle.is_outside(distance_m) {
            debug!(
                device_id = device.id,
                geofence_id = geofence.id,
                distance_m,
                "Device inside geofence"
            );
            return Ok(GeofenceEvaluation::Inside { distance_m });
        }

        let alert = self
            .recorder
            .record_geofence_exit(device, &geofence, now)
            .await
            .map_err(|e| {
                warn!(
                    device_id = device.id,
                    geofence_id = geofence.id,
                    error = %e,
                    "Failed to record geofence exit alert"
                );
                DomainError::storage(STAGE_RECORD_ALERT)(e)
            })?;

        Ok(GeofenceEvaluation::Exited { distance_m, alert })
    }
}
