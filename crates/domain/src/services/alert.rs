//! Alert recording and the owner-facing alert feed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::pagination::{clamp_limit, AlertCursor};
use tracing::{debug, info, warn};

use super::notification::{NotificationResult, NotificationService};
use crate::error::DomainError;
use crate::models::alert::AlertPage;
use crate::models::{Alert, Device, Geofence, NewAlert};
use crate::store::{StoreError, TrackingStore};

/// Persists exit events and hands them to the notification collaborator.
#[derive(Clone)]
pub struct AlertRecorder {
    store: Arc<dyn TrackingStore>,
    notifier: Arc<dyn NotificationService>,
}

impl AlertRecorder {
    pub fn new(store: Arc<dyn TrackingStore>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { store, notifier }
    }

    /// Records a `geofence_exit` alert and schedules the push notification.
    ///
    /// No check is made for earlier unacknowledged alerts: every call writes a
    /// new row.
    pub async fn record_geofence_exit(
        &self,
        device: &Device,
        geofence: &Geofence,
        at: DateTime<Utc>,
    ) -> Result<Alert, StoreError> {
        let alert = self
            .store
            .insert_alert(NewAlert::geofence_exit(device.id, geofence.id, at))
            .await?;

        info!(
            alert_id = alert.id,
            device_id = device.id,
            geofence_id = geofence.id,
            owner_id = device.owner_id,
            "Geofence exit alert recorded"
        );

        let recorder = self.clone();
        let device_id = device.id;
        tokio::spawn(async move {
            recorder.notify(device_id).await;
        });

        Ok(alert)
    }

    /// Resolves the owner's push token and sends the exit notification.
    ///
    /// Every outcome is only logged.
    pub async fn notify(&self, device_id: i64) -> Option<NotificationResult> {
        let target = match self.store.notification_target(device_id).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                debug!(device_id, "No push token for device owner, skipping notification");
                return None;
            }
            Err(e) => {
                warn!(device_id, error = %e, "Failed to resolve notification target");
                return None;
            }
        };

        let result = self
            .notifier
            .send_geofence_exit(&target.fcm_token, &target.pet_name, device_id)
            .await;

        match &result {
            NotificationResult::Sent => {
                info!(device_id, "Geofence exit notification sent");
            }
            NotificationResult::InvalidToken => {
                warn!(device_id, "Push token rejected by provider");
            }
            NotificationResult::Failed(reason) => {
                warn!(device_id, reason = %reason, "Geofence exit notification failed");
            }
        }

        Some(result)
    }
}

/// Read and acknowledge flows over an owner's alerts.
#[derive(Clone)]
pub struct AlertFeed {
    store: Arc<dyn TrackingStore>,
    default_limit: i64,
    max_limit: i64,
}

impl AlertFeed {
    pub fn new(store: Arc<dyn TrackingStore>, default_limit: i64, max_limit: i64) -> Self {
        Self {
            store,
            default_limit,
            max_limit,
        }
    }

    /// Lists alerts newest first. `next_cursor` is set when more remain.
    pub async fn list(
        &self,
        owner_id: i64,
        cursor: Option<&str>,
        limit: Option<i64>,
    ) -> Result<AlertPage, DomainError> {
        let cursor = cursor
            .map(AlertCursor::decode)
            .transpose()
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        let limit = clamp_limit(limit, self.default_limit, self.max_limit);

        let mut data = self
            .store
            .list_alerts_by_owner(owner_id, cursor, limit + 1)
            .await
            .map_err(DomainError::storage("list_alerts"))?;

        let has_more = data.len() as i64 > limit;
        data.truncate(limit as usize);

        let next_cursor = if has_more {
            data.last()
                .map(|a| AlertCursor::new(a.alert.alert_timestamp, a.alert.id).encode())
        } else {
            None
        };

        Ok(AlertPage { data, next_cursor })
    }

    pub async fn unread_count(&self, owner_id: i64) -> Result<i64, DomainError> {
        self.store
            .count_unread_alerts(owner_id)
            .await
            .map_err(DomainError::storage("count_alerts"))
    }

    pub async fn acknowledge(&self, owner_id: i64, alert_id: i64) -> Result<Alert, DomainError> {
        self.store
            .acknowledge_alert(alert_id, owner_id, Utc::now())
            .await
            .map_err(DomainError::storage("acknowledge_alert"))?
            .ok_or(DomainError::NotFound("Alert"))
    }

    /// Returns the number of alerts that were unread.
    pub async fn acknowledge_all(&self, owner_id: i64) -> Result<u64, DomainError> {
        self.store
            .acknowledge_all_alerts(owner_id, Utc::now())
            .await
            .map_err(DomainError::storage("acknowledge_alerts"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDevice, NewGeofence};
    use crate::services::notification::MockNotificationService;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    async fn setup() -> (Arc<InMemoryStore>, Device, Geofence) {
        let store = Arc::new(InMemoryStore::new());
        let device = store
            .create_device(NewDevice {
                owner_id: 1,
                serial_number: "SN-1".to_string(),
                imei: None,
                model: None,
                firmware: None,
                pet_name: Some("Rex".to_string()),
            })
            .await
            .unwrap();
        let (geofence, _) = store
            .create_geofence(NewGeofence {
                owner_id: 1,
                name: "Home".to_string(),
                latitude: 10.0,
                longitude: 10.0,
                radius_m: 100,
            })
            .await
            .unwrap();
        (store, device, geofence)
    }

    #[tokio::test]
    async fn test_record_writes_alert_every_time() {
        let (store, device, geofence) = setup().await;
        let recorder = AlertRecorder::new(store.clone(), Arc::new(MockNotificationService::new()));

        let first = recorder
            .record_geofence_exit(&device, &geofence, Utc::now())
            .await
            .unwrap();
        let second = recorder
            .record_geofence_exit(&device, &geofence, Utc::now())
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.alert_type, "geofence_exit");
        assert_eq!(first.geofence_id, Some(geofence.id));
        assert_eq!(store.alerts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_notify_uses_owner_token_and_pet_name() {
        let (store, device, _) = setup().await;
        store.upsert_push_token(1, "owner-token").await.unwrap();
        let notifier = MockNotificationService::new();
        let recorder = AlertRecorder::new(store.clone(), Arc::new(notifier.clone()));

        let result = recorder.notify(device.id).await;
        assert_eq!(result, Some(NotificationResult::Sent));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].fcm_token, "owner-token");
        assert_eq!(sent[0].message.body, "Rex left the safe zone!");
    }

    #[tokio::test]
    async fn test_notify_without_token_is_skipped() {
        let (store, device, _) = setup().await;
        let notifier = MockNotificationService::new();
        let recorder = AlertRecorder::new(store, Arc::new(notifier.clone()));

        assert!(recorder.notify(device.id).await.is_none());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_keeps_alert() {
        let (store, device, geofence) = setup().await;
        store.upsert_push_token(1, "owner-token").await.unwrap();
        let recorder =
            AlertRecorder::new(store.clone(), Arc::new(MockNotificationService::failing()));

        recorder
            .record_geofence_exit(&device, &geofence, Utc::now())
            .await
            .unwrap();
        let result = recorder.notify(device.id).await;

        assert!(matches!(result, Some(NotificationResult::Failed(_))));
        assert_eq!(store.alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_record_spawns_notification() {
        let (store, device, geofence) = setup().await;
        store.upsert_push_token(1, "owner-token").await.unwrap();
        let notifier = MockNotificationService::new();
        let recorder = AlertRecorder::new(store, Arc::new(notifier.clone()));

        recorder
            .record_geofence_exit(&device, &geofence, Utc::now())
            .await
            .unwrap();

        for _ in 0..50 {
            if !notifier.sent().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_pages_with_cursor() {
        let (store, device, geofence) = setup().await;
        let base = Utc::now();
        for i in 0..5 {
            store
                .insert_alert(NewAlert::geofence_exit(
                    device.id,
                    geofence.id,
                    base + Duration::seconds(i),
                ))
                .await
                .unwrap();
        }
        let feed = AlertFeed::new(store, 50, 100);

        let first = feed.list(1, None, Some(2)).await.unwrap();
        assert_eq!(first.data.len(), 2);
        assert_eq!(first.data[0].pet_name, "Rex");
        let cursor = first.next_cursor.expect("more alerts remain");

        let second = feed.list(1, Some(&cursor), Some(2)).await.unwrap();
        let third = feed
            .list(1, second.next_cursor.as_deref(), Some(2))
            .await
            .unwrap();

        assert_eq!(second.data.len(), 2);
        assert_eq!(third.data.len(), 1);
        assert!(third.next_cursor.is_none());
        assert!(first.data[1].alert.alert_timestamp > second.data[0].alert.alert_timestamp);
    }

    #[tokio::test]
    async fn test_feed_rejects_bad_cursor() {
        let (store, _, _) = setup().await;
        let feed = AlertFeed::new(store, 50, 100);

        let err = feed.list(1, Some("%%%"), None).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_acknowledge_flows() {
        let (store, device, geofence) = setup().await;
        for _ in 0..3 {
            store
                .insert_alert(NewAlert::geofence_exit(device.id, geofence.id, Utc::now()))
                .await
                .unwrap();
        }
        let feed = AlertFeed::new(store.clone(), 50, 100);
        let alerts = store.alerts().await;

        assert_eq!(feed.unread_count(1).await.unwrap(), 3);

        let acked = feed.acknowledge(1, alerts[0].id).await.unwrap();
        assert_eq!(acked.acknowledged_by, Some(1));
        assert_eq!(feed.unread_count(1).await.unwrap(), 2);

        assert!(matches!(
            feed.acknowledge(2, alerts[1].id).await,
            Err(DomainError::NotFound(_))
        ));

        assert_eq!(feed.acknowledge_all(1).await.unwrap(), 2);
        assert_eq!(feed.unread_count(1).await.unwrap(), 0);
        assert_eq!(feed.acknowledge_all(1).await.unwrap(), 0);
    }
}
