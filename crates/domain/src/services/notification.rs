//! Notification service for push notifications.
//!
//! The ingest pipeline only ever fires and forgets: the result of a send is
//! logged and never affects the alert that triggered it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::models::ALERT_TYPE_GEOFENCE_EXIT;

/// Contents of a geofence exit push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofenceExitMessage {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl GeofenceExitMessage {
    pub fn new(pet_name: &str, device_id: i64) -> Self {
        let data = BTreeMap::from([
            ("alert_type".to_string(), ALERT_TYPE_GEOFENCE_EXIT.to_string()),
            ("device_id".to_string(), device_id.to_string()),
            ("pet_name".to_string(), pet_name.to_string()),
        ]);

        Self {
            title: "Geofence alert".to_string(),
            body: format!("{} left the safe zone!", pet_name),
            data,
        }
    }
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was accepted by the push provider.
    Sent,
    /// The provider rejected the registration token.
    InvalidToken,
    /// Sending failed; the caller only logs this.
    Failed(String),
}

/// Push notification capability.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Tell an owner that one of their pets left the safe zone.
    async fn send_geofence_exit(
        &self,
        fcm_token: &str,
        pet_name: &str,
        device_id: i64,
    ) -> NotificationResult;
}

/// Notification service used when no push provider is configured.
///
/// Every send is logged at `info` and reported as sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotificationService;

#[async_trait::async_trait]
impl NotificationService for LoggingNotificationService {
    async fn send_geofence_exit(
        &self,
        _fcm_token: &str,
        pet_name: &str,
        device_id: i64,
    ) -> NotificationResult {
        let message = GeofenceExitMessage::new(pet_name, device_id);
        tracing::info!(
            device_id,
            title = %message.title,
            body = %message.body,
            "Push disabled, geofence_exit notification not sent"
        );
        NotificationResult::Sent
    }
}

/// A notification captured by [`MockNotificationService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub fcm_token: String,
    pub message: GeofenceExitMessage,
}

/// Mock notification service for tests.
///
/// Keeps a record of every call for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationService {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl MockNotificationService {
    /// Create a new mock notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock service that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Notifications recorded so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn send_geofence_exit(
        &self,
        fcm_token: &str,
        pet_name: &str,
        device_id: i64,
    ) -> NotificationResult {
        let message = GeofenceExitMessage::new(pet_name, device_id);

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentNotification {
                fcm_token: fcm_token.to_string(),
                message: message.clone(),
            });
        }

        if self.simulate_failure {
            tracing::warn!(
                device_id = %device_id,
                "Mock notification service simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            device_id = %device_id,
            pet_name = %pet_name,
            body = %message.body,
            "Mock: Would send geofence_exit notification"
        );

        NotificationResult::Sent
    }
}
