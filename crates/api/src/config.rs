use std::str::FromStr;

use rbac_sync_core::credentials::{SyncCredentials, PLACEHOLDER_USER_ID};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got '{value}'")]
    InvalidValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Invalid CORS origin '{0}'")]
    InvalidCorsOrigin(String),
}

/// Connection parameters of the external sync service, handed out by the
/// credential endpoint. Either value may be absent; only that endpoint
/// fails when they are.
#[derive(Debug, Clone, Default)]
pub struct SyncServiceConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

impl SyncServiceConfig {
    /// Credentials to hand out, or `None` if the service is not configured.
    pub fn credentials(&self) -> Option<SyncCredentials> {
        match (&self.endpoint, &self.token) {
            (Some(endpoint), Some(token)) => Some(SyncCredentials {
                endpoint: endpoint.clone(),
                token: token.clone(),
                // TODO: issue per-user credentials once authentication exists.
                user_id: PLACEHOLDER_USER_ID.to_string(),
            }),
            _ => None,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for pool teardown after the listener stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Maximum accepted request body size in bytes (default: 10 MiB).
    pub max_batch_bytes: usize,
    pub sync_service: SyncServiceConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `MAX_BATCH_BYTES`       | `10485760`                 |
    /// | `SYNC_SERVICE_URL`      | unset                      |
    /// | `SYNC_SERVICE_TOKEN`    | unset                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let sync_service = SyncServiceConfig {
            endpoint: non_empty_env("SYNC_SERVICE_URL"),
            token: non_empty_env("SYNC_SERVICE_TOKEN"),
        };

        Ok(Self {
            host,
            port: parse_env("PORT", 3000, "u16")?,
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30, "u64")?,
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT_SECS", 30, "u64")?,
            max_batch_bytes: parse_env("MAX_BATCH_BYTES", 10 * 1024 * 1024, "usize")?,
            sync_service,
        })
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            var,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}
