//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod alert;
pub mod device;
pub mod geofence;
pub mod location;

pub use alert::{AlertEntity, AlertWithPetEntity, NotificationTargetEntity};
pub use device::DeviceEntity;
pub use geofence::GeofenceEntity;
pub use location::LocationEntity;
