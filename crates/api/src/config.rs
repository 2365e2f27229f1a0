use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
    /// JWT verification configuration
    pub jwt: JwtAuthConfig,
    /// Push notification configuration
    #[serde(default)]
    pub fcm: FcmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests per minute per owner on authenticated routes. 0 disables.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Send `Strict-Transport-Security`. Enable only behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_location_history")]
    pub default_location_history: i64,

    #[serde(default = "default_max_location_history")]
    pub max_location_history: i64,

    #[serde(default = "default_alert_page_size")]
    pub default_alert_page_size: i64,

    #[serde(default = "default_max_alert_page_size")]
    pub max_alert_page_size: i64,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    100
}
fn default_location_history() -> i64 {
    50
}
fn default_max_location_history() -> i64 {
    100
}
fn default_alert_page_size() -> i64 {
    20
}
fn default_max_alert_page_size() -> i64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// RSA public key in PEM format for verifying tokens. Tokens are issued
    /// by the account service; this API only verifies them.
    pub public_key: String,

    /// Leeway in seconds for clock skew tolerance (default: 30)
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}

/// Firebase Cloud Messaging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    /// When disabled, notifications are only logged.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub project_id: String,

    /// Service account JSON, inline or as a file path
    #[serde(default)]
    pub credentials: String,

    #[serde(default = "default_fcm_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_fcm_max_retries")]
    pub max_retries: u32,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: String::new(),
            credentials: String::new(),
            timeout_ms: default_fcm_timeout_ms(),
            max_retries: default_fcm_max_retries(),
        }
    }
}

fn default_fcm_timeout_ms() -> u64 {
    10_000
}

fn default_fcm_max_retries() -> u32 {
    3
}

/// Upper bound for `fcm.max_retries`.
pub const MAX_FCM_RETRIES: u32 = 10;

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PETSAFE__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PETSAFE").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 100
            hsts_enabled = false

            [limits]
            default_location_history = 50
            max_location_history = 100
            default_alert_page_size = 20
            max_alert_page_size = 100

            [jwt]
            public_key = "test-public-key"
            leeway_secs = 30

            [fcm]
            enabled = false
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is skipped to allow partial configs
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PETSAFE__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.jwt.public_key.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PETSAFE__JWT__PUBLIC_KEY environment variable must be set".to_string(),
            ));
        }

        if self.limits.default_location_history > self.limits.max_location_history
            || self.limits.default_alert_page_size > self.limits.max_alert_page_size
        {
            return Err(ConfigValidationError::InvalidValue(
                "default page sizes cannot exceed their maximums".to_string(),
            ));
        }

        if self.fcm.enabled && (self.fcm.project_id.is_empty() || self.fcm.credentials.is_empty())
        {
            return Err(ConfigValidationError::MissingRequired(
                "fcm.project_id and fcm.credentials are required when FCM is enabled".to_string(),
            ));
        }

        if self.fcm.max_retries > MAX_FCM_RETRIES {
            return Err(ConfigValidationError::InvalidValue(format!(
                "fcm.max_retries cannot exceed {}",
                MAX_FCM_RETRIES
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
