//! Alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert type tag written when a device leaves its owner's geofence.
pub const ALERT_TYPE_GEOFENCE_EXIT: &str = "geofence_exit";

/// A persisted exit event, later acknowledged by the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub device_id: i64,
    pub geofence_id: Option<i64>,
    pub alert_type: String,
    pub alert_timestamp: DateTime<Utc>,
    pub acknowledged_by: Option<i64>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn is_unread(&self) -> bool {
        self.acknowledged_at.is_none()
    }
}

/// Data required to insert an alert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub device_id: i64,
    pub geofence_id: Option<i64>,
    pub alert_type: String,
    pub alert_timestamp: DateTime<Utc>,
}

impl NewAlert {
    pub fn geofence_exit(device_id: i64, geofence_id: i64, at: DateTime<Utc>) -> Self {
        Self {
            device_id,
            geofence_id: Some(geofence_id),
            alert_type: ALERT_TYPE_GEOFENCE_EXIT.to_string(),
            alert_timestamp: at,
        }
    }
}

/// Alert joined with the label of the pet wearing the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertWithPet {
    #[serde(flatten)]
    pub alert: Alert,
    /// Pet name, or the device serial number when no pet is named.
    pub pet_name: String,
}

/// Query parameters for the alert feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAlertsQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// One page of the alert feed.
#[derive(Debug, Clone, Serialize)]
pub struct AlertPage {
    pub data: Vec<AlertWithPet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
