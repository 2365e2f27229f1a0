//! Repository implementations for database operations.

pub mod alert;
pub mod device;
pub mod geofence;
pub mod location;
pub mod push_token;

pub use alert::AlertRepository;
pub use device::DeviceRepository;
pub use geofence::GeofenceRepository;
pub use location::LocationRepository;
pub use push_token::PushTokenRepository;
