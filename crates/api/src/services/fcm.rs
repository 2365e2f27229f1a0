//! Firebase Cloud Messaging (FCM) notification service.
//!
//! Implements the NotificationService trait using the FCM HTTP v1 API.
//! Service-account credentials are exchanged for an OAuth2 access token with
//! a signed JWT bearer grant; the token is cached until shortly before it
//! expires.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use domain::services::{GeofenceExitMessage, NotificationResult, NotificationService};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::FcmConfig;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// FCM notification service using Firebase Cloud Messaging HTTP v1 API.
pub struct FcmNotificationService {
    client: Client,
    config: FcmConfig,
    credentials: ServiceAccountCredentials,
    token_cache: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Google service account credentials structure.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    token_uri: String,
}

/// JWT claims for Google OAuth2 service account authentication.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// FCM v1 API message structure.
#[derive(Debug, Serialize)]
struct FcmMessage {
    message: MessagePayload,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    token: String,
    notification: NotificationPayload,
    data: BTreeMap<String, String>,
    android: AndroidConfig,
}

#[derive(Debug, Serialize)]
struct NotificationPayload {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct AndroidConfig {
    priority: &'static str,
}

impl FcmMessage {
    fn geofence_exit(fcm_token: &str, message: GeofenceExitMessage) -> Self {
        Self {
            message: MessagePayload {
                token: fcm_token.to_string(),
                notification: NotificationPayload {
                    title: message.title,
                    body: message.body,
                },
                data: message.data,
                android: AndroidConfig { priority: "high" },
            },
        }
    }
}

/// Error type for FCM operations.
#[derive(Debug, thiserror::Error)]
pub enum FcmError {
    #[error("Failed to parse credentials: {0}")]
    CredentialsError(String),

    #[error("Failed to create JWT: {0}")]
    JwtError(String),

    #[error("Failed to get access token: {0}")]
    TokenError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("FCM API error: {0}")]
    ApiError(String),

    #[error("Invalid FCM token")]
    InvalidToken,

    #[error("FCM is not enabled")]
    NotEnabled,
}

impl FcmNotificationService {
    /// Create a new FCM notification service.
    ///
    /// # Errors
    /// Returns an error if FCM is disabled or the credentials cannot be parsed.
    pub fn new(config: FcmConfig) -> Result<Self, FcmError> {
        if !config.enabled {
            return Err(FcmError::NotEnabled);
        }

        let credentials = Self::load_credentials(&config.credentials)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            credentials,
            token_cache: RwLock::new(None),
        })
    }

    /// Load service account credentials from a JSON string or a file path.
    fn load_credentials(source: &str) -> Result<ServiceAccountCredentials, FcmError> {
        if source.trim().starts_with('{') {
            serde_json::from_str(source)
                .map_err(|e| FcmError::CredentialsError(format!("Invalid JSON: {}", e)))
        } else {
            let content = std::fs::read_to_string(source).map_err(|e| {
                FcmError::CredentialsError(format!("Failed to read credentials file: {}", e))
            })?;
            serde_json::from_str(&content)
                .map_err(|e| FcmError::CredentialsError(format!("Invalid credentials JSON: {}", e)))
        }
    }

    /// Get a valid OAuth2 access token, refreshing if necessary.
    async fn access_token(&self) -> Result<String, FcmError> {
        if let Some(token) = self.token_cache.read().await.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let (access_token, expires_at) = self.fetch_access_token().await?;
        *self.token_cache.write().await = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });

        Ok(access_token)
    }

    fn signed_assertion(&self) -> Result<String, FcmError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        let encoding_key =
            jsonwebtoken::EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
                .map_err(|e| FcmError::JwtError(format!("Invalid private key: {}", e)))?;

        jsonwebtoken::encode(&header, &claims, &encoding_key)
            .map_err(|e| FcmError::JwtError(e.to_string()))
    }

    /// Exchange a signed assertion for an access token. Returns (token, expires_at).
    async fn fetch_access_token(&self) -> Result<(String, Instant), FcmError> {
        let assertion = self.signed_assertion()?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FcmError::TokenError(format!(
                "Token exchange failed: {}",
                error_text
            )));
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = Instant::now() + Duration::from_secs(token.expires_in);

        Ok((token.access_token, expires_at))
    }

    /// Send a message, retrying transport failures and 5xx responses with
    /// exponential backoff.
    async fn send_message(&self, message: &FcmMessage) -> Result<(), FcmError> {
        let access_token = self.access_token().await?;
        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.config.project_id
        );

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_delay(attempt)).await;
            }

            let resp = match self
                .client
                .post(&url)
                .bearer_auth(&access_token)
                .json(message)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(FcmError::HttpError(e));
                    continue;
                }
            };

            let status = resp.status();
            if status.is_success() {
                tracing::debug!(attempt, "FCM message sent");
                return Ok(());
            }

            let error_text = resp.text().await.unwrap_or_default();
            if status.is_server_error() {
                last_error = Some(FcmError::ApiError(error_text));
                continue;
            }
            if is_invalid_token(status.as_u16(), &error_text) {
                return Err(FcmError::InvalidToken);
            }
            return Err(FcmError::ApiError(error_text));
        }

        Err(last_error.unwrap_or_else(|| FcmError::ApiError("Unknown error".to_string())))
    }
}

/// FCM reports stale or malformed registration tokens as 400/404 with one of
/// these statuses; they are not worth retrying.
fn is_invalid_token(status: u16, body: &str) -> bool {
    matches!(status, 400 | 404) && (body.contains("UNREGISTERED") || body.contains("INVALID_ARGUMENT"))
}

/// Longest pause between two send attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff before retry `attempt` (1-based): 100ms, 200ms, 400ms,
/// capped at `MAX_RETRY_DELAY`.
fn retry_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(100u64.saturating_mul(factor)).min(MAX_RETRY_DELAY)
}

#[async_trait::async_trait]
impl NotificationService for FcmNotificationService {
    async fn send_geofence_exit(
        &self,
        fcm_token: &str,
        pet_name: &str,
        device_id: i64,
    ) -> NotificationResult {
        let message = FcmMessage::geofence_exit(fcm_token, GeofenceExitMessage::new(pet_name, device_id));

        match self.send_message(&message).await {
            Ok(()) => NotificationResult::Sent,
            Err(FcmError::InvalidToken) => NotificationResult::InvalidToken,
            Err(e) => {
                tracing::error!(error = %e, device_id, "Failed to send geofence exit notification");
                NotificationResult::Failed(e.to_string())
            }
        }
    }
}
