//! Device domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A GPS tracker attached to a pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
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

impl Device {
    /// Name shown to the owner in alerts and notifications.
    ///
    /// Falls back to the serial number when no pet is named.
    pub fn label(&self) -> &str {
        self.pet_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.serial_number)
    }
}

/// Data required to insert a device.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub owner_id: i64,
    pub serial_number: String,
    pub imei: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub pet_name: Option<String>,
}

/// Partial device update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeviceChanges {
    pub imei: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub pet_name: Option<String>,
    pub active: Option<bool>,
}

impl DeviceChanges {
    pub fn apply(&self, device: &mut Device) {
        if let Some(imei) = &self.imei {
            device.imei = Some(imei.clone());
        }
        if let Some(model) = &self.model {
            device.model = Some(model.clone());
        }
        if let Some(firmware) = &self.firmware {
            device.firmware = Some(firmware.clone());
        }
        if let Some(pet_name) = &self.pet_name {
            device.pet_name = Some(pet_name.clone());
        }
        if let Some(active) = self.active {
            device.active = active;
        }
    }
}

/// Request payload for device registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeviceRequest {
    #[validate(length(
        min = 1,
        max = 64,
        message = "Serial number must be between 1 and 64 characters"
    ))]
    pub serial_number: String,

    #[validate(length(max = 64, message = "IMEI must be at most 64 characters"))]
    pub imei: Option<String>,

    #[validate(length(max = 80, message = "Model must be at most 80 characters"))]
    pub model: Option<String>,

    #[validate(length(max = 50, message = "Firmware must be at most 50 characters"))]
    pub firmware: Option<String>,

    #[validate(length(max = 80, message = "Pet name must be at most 80 characters"))]
    pub pet_name: Option<String>,
}

impl CreateDeviceRequest {
    pub fn into_new_device(self, owner_id: i64) -> NewDevice {
        NewDevice {
            owner_id,
            serial_number: self.serial_number.trim().to_string(),
            imei: self.imei,
            model: self.model,
            firmware: self.firmware,
            pet_name: self.pet_name,
        }
    }
}

/// Request payload for updating a device (partial update).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDeviceRequest {
    #[validate(length(max = 64, message = "IMEI must be at most 64 characters"))]
    pub imei: Option<String>,

    #[validate(length(max = 80, message = "Model must be at most 80 characters"))]
    pub model: Option<String>,

    #[validate(length(max = 50, message = "Firmware must be at most 50 characters"))]
    pub firmware: Option<String>,

    #[validate(length(max = 80, message = "Pet name must be at most 80 characters"))]
    pub pet_name: Option<String>,

    pub active: Option<bool>,
}

impl From<UpdateDeviceRequest> for DeviceChanges {
    fn from(req: UpdateDeviceRequest) -> Self {
        Self {
            imei: req.imei,
            model: req.model,
            firmware: req.firmware,
            pet_name: req.pet_name,
            active: req.active,
        }
    }
}

/// Query parameters for a device's location history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationHistoryQuery {
    pub limit: Option<i64>,
}
