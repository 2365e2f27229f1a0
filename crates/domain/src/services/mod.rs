//! Domain services for PetSafe.
//!
//! Services contain business logic that operates on domain models and reach
//! storage only through an injected [`crate::store::TrackingStore`].

pub mod alert;
pub mod device;
pub mod geofence;
pub mod ingest;
pub mod notification;

pub use alert::{AlertFeed, AlertRecorder};
pub use device::DeviceService;
pub use geofence::GeofenceService;
pub use ingest::{GeofenceEvaluation, IngestService, Ingested};
pub use notification::{
    GeofenceExitMessage, LoggingNotificationService, MockNotificationService, NotificationResult,
    NotificationService, SentNotification,
};
