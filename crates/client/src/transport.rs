//! Network seam between the client and the RBAC sync API.
//!
//! [`SyncTransport`] is what the upload bridge and session talk to;
//! [`HttpTransport`] is the production implementation over [`reqwest`].
//! Tests substitute their own implementations.

use async_trait::async_trait;
use rbac_sync_core::credentials::SyncCredentials;
use rbac_sync_core::sync::{BatchResponse, OperationDescriptor};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Fetch the sync service connection parameters.
    async fn fetch_credentials(&self) -> ClientResult<SyncCredentials>;

    /// Submit one batch of operations. `Ok` means the endpoint received and
    /// iterated the batch; individual results may still have failed.
    async fn submit(&self, operations: &[OperationDescriptor]) -> ClientResult<BatchResponse>;
}

/// [`SyncTransport`] over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    sync_url: String,
    credentials_url: String,
}

impl HttpTransport {
    /// Build a transport with its own [`reqwest::Client`] using the
    /// configured request timeout.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Build a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            sync_url: config.sync_url(),
            credentials_url: config.credentials_url(),
        }
    }

    /// Read the body of a non-2xx response for error reporting.
    async fn error_body(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string())
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn fetch_credentials(&self) -> ClientResult<SyncCredentials> {
        let response = self.client.get(&self.credentials_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::CredentialsUnavailable {
                status: status.as_u16(),
                body: Self::error_body(response).await,
            });
        }

        let credentials: SyncCredentials = response.json().await?;
        tracing::info!(endpoint = %credentials.endpoint, "Fetched sync credentials");
        Ok(credentials)
    }

    async fn submit(&self, operations: &[OperationDescriptor]) -> ClientResult<BatchResponse> {
        let response = self
            .client
            .post(&self.sync_url)
            .json(operations)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UploadRejected {
                status: status.as_u16(),
                body: Self::error_body(response).await,
            });
        }

        let batch: BatchResponse = response.json().await?;
        for failed in batch.failed() {
            tracing::warn!(
                op = %failed.operation,
                entity_type = %failed.entity_type,
                id = %failed.id,
                error = failed.error.as_deref().unwrap_or("unknown"),
                "Sync endpoint rejected operation"
            );
        }
        Ok(batch)
    }
}
