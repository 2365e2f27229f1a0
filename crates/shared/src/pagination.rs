//! Keyset cursor encoding for the alert feed.
//!
//! Alerts are listed newest first, ordered by `(alert_timestamp DESC, id DESC)`.
//! The cursor carries the position of the last alert a client has seen.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Error type for cursor operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("Invalid ID in cursor")]
    InvalidId,
}

/// Position of an alert within the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertCursor {
    pub alert_timestamp: DateTime<Utc>,
    pub id: i64,
}

impl AlertCursor {
    pub fn new(alert_timestamp: DateTime<Utc>, id: i64) -> Self {
        Self { alert_timestamp, id }
    }

    /// Encodes as `base64url(RFC3339_micros "|" id)`.
    pub fn encode(&self) -> String {
        let raw = format!(
            "{}|{}",
            self.alert_timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.id
        );
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    pub fn decode(cursor: &str) -> Result<Self, CursorError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|_| CursorError::InvalidEncoding)?;
        let s = String::from_utf8(decoded).map_err(|_| CursorError::InvalidFormat)?;

        let (ts, id) = s.rsplit_once('|').ok_or(CursorError::InvalidFormat)?;
        let id: i64 = id.parse().map_err(|_| CursorError::InvalidId)?;
        let alert_timestamp = DateTime::parse_from_rfc3339(ts)
            .map_err(|_| CursorError::InvalidTimestamp)?
            .with_timezone(&Utc);

        Ok(Self { alert_timestamp, id })
    }

    /// Whether an alert at `(alert_timestamp, id)` comes strictly after this cursor
    /// in newest-first order.
    pub fn precedes(&self, alert_timestamp: DateTime<Utc>, id: i64) -> bool {
        (alert_timestamp, id) < (self.alert_timestamp, self.id)
    }
}

/// Clamps a requested page size into `1..=max`, using `default` when absent.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}
