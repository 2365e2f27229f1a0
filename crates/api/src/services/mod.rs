//! Outbound integrations.

pub mod fcm;

pub use fcm::{FcmError, FcmNotificationService};
