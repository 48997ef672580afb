use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the RBAC sync API, without a trailing slash.
    pub api_url: String,
    /// SQLite connection string of the local store.
    pub local_db_url: String,
    /// How often the upload scheduler retries a queue it could not drain.
    pub upload_retry_interval: Duration,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            local_db_url: "sqlite::memory:".into(),
            upload_retry_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `SYNC_API_URL`                | `http://localhost:3000` |
    /// | `LOCAL_DB_URL`                | `sqlite::memory:`       |
    /// | `UPLOAD_RETRY_SECS`           | `5`                     |
    /// | `CLIENT_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let defaults = Self::default();

        let api_url = lookup("SYNC_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let local_db_url = lookup("LOCAL_DB_URL").unwrap_or(defaults.local_db_url);

        let retry_secs: u64 = parse_var(&lookup, "UPLOAD_RETRY_SECS", 5)?;
        if retry_secs == 0 {
            return Err(ClientError::Configuration(
                "UPLOAD_RETRY_SECS must be greater than zero".into(),
            ));
        }
        let timeout_secs: u64 = parse_var(&lookup, "CLIENT_REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            api_url,
            local_db_url,
            upload_retry_interval: Duration::from_secs(retry_secs),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn sync_url(&self) -> String {
        format!("{}/api/v1/sync", self.api_url)
    }

    pub fn credentials_url(&self) -> String {
        format!("{}/api/v1/sync/credentials", self.api_url)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ClientError> {
    match lookup(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ClientError::Configuration(format!("{var} must be a number, got '{value}'"))),
        None => Ok(default),
    }
}
