//! Domain models for PetSafe.

pub mod alert;
pub mod device;
pub mod geofence;
pub mod location;
pub mod push_token;

pub use alert::{Alert, AlertWithPet, NewAlert, ALERT_TYPE_GEOFENCE_EXIT};
pub use device::{Device, DeviceChanges, NewDevice};
pub use geofence::{Geofence, GeofenceChanges, NewGeofence};
pub use location::{Location, LocationReport, NewLocation};
pub use push_token::RegisterPushTokenRequest;
