use rbac_sync_core::error::CoreError;

/// Errors raised by the local store, the upload path and the facade.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The sync endpoint answered the upload with a non-2xx status.
    #[error("Sync upload rejected ({status}): {body}")]
    UploadRejected { status: u16, body: String },

    /// The credential endpoint answered with a non-2xx status.
    #[error("Failed to fetch sync credentials ({status}): {body}")]
    CredentialsUnavailable { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The embedded SQLite store failed.
    #[error("Local store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
