//! Geofence domain model.
//!
//! Each owner has at most one geofence: a named circular safe zone that
//! applies to the devices associated with it at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// An owner's safe zone.
///
/// Center and radius are nullable; a geofence without a full circle never
/// produces alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A fully defined circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: i32,
}

impl Circle {
    /// Distance in meters from the center to the given point.
    pub fn distance_to(&self, latitude: f64, longitude: f64) -> f64 {
        shared::geo::haversine_distance(latitude, longitude, self.latitude, self.longitude)
    }

    /// Strictly greater than the radius; a point on the boundary is inside.
    pub fn is_outside(&self, distance_m: f64) -> bool {
        distance_m > f64::from(self.radius_m)
    }
}

impl Geofence {
    /// Returns the circle if center and radius are all set.
    pub fn circle(&self) -> Option<Circle> {
        Some(Circle {
            latitude: self.latitude?,
            longitude: self.longitude?,
            radius_m: self.radius_m?,
        })
    }
}

/// Data required to insert a geofence.
#[derive(Debug, Clone)]
pub struct NewGeofence {
    pub owner_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: i32,
}

/// Partial geofence update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeofenceChanges {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<i32>,
    pub active: Option<bool>,
}

impl GeofenceChanges {
    pub fn apply(&self, geofence: &mut Geofence) {
        if let Some(name) = &self.name {
            geofence.name = name.clone();
        }
        if let Some(latitude) = self.latitude {
            geofence.latitude = Some(latitude);
        }
        if let Some(longitude) = self.longitude {
            geofence.longitude = Some(longitude);
        }
        if let Some(radius_m) = self.radius_m {
            geofence.radius_m = Some(radius_m);
        }
        if let Some(active) = self.active {
            geofence.active = active;
        }
    }
}

/// Request payload for creating a geofence.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGeofenceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_radius"))]
    pub radius_m: i32,
}

impl CreateGeofenceRequest {
    pub fn into_new_geofence(self, owner_id: i64) -> NewGeofence {
        NewGeofence {
            owner_id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            radius_m: self.radius_m,
        }
    }
}

/// Request payload for updating a geofence.
///
/// Zero values (empty name, 0 latitude/longitude/radius) mean "not provided".
/// `active` is nullable so that an explicit `false` can be told apart from an
/// absent field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateGeofenceRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "validate_radius_change"))]
    pub radius_m: i32,

    pub active: Option<bool>,
}

fn validate_radius_change(radius_m: i32) -> Result<(), ValidationError> {
    if radius_m == 0 {
        return Ok(());
    }
    shared::validation::validate_radius(radius_m)
}

impl From<UpdateGeofenceRequest> for GeofenceChanges {
    fn from(req: UpdateGeofenceRequest) -> Self {
        Self {
            name: Some(req.name).filter(|n| !n.is_empty()),
            latitude: Some(req.latitude).filter(|v| *v != 0.0),
            longitude: Some(req.longitude).filter(|v| *v != 0.0),
            radius_m: Some(req.radius_m).filter(|v| *v != 0),
            active: req.active,
        }
    }
}

/// Geofence together with the devices it applies to.
#[derive(Debug, Clone, Serialize)]
pub struct GeofenceResponse {
    #[serde(flatten)]
    pub geofence: Geofence,
    pub device_ids: Vec<i64>,
}
