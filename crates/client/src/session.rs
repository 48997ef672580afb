//! A connected client: credentials fetched, upload loop running.

use std::sync::Arc;

use rbac_sync_core::credentials::SyncCredentials;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::UploadBridge;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::scheduler::UploadScheduler;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

#[derive(Debug)]
pub struct SyncSession {
    credentials: SyncCredentials,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SyncSession {
    /// Fetch credentials once, then start uploading in the background.
    ///
    /// Fails without spawning anything if the credentials are unavailable.
    pub async fn connect(
        store: LocalStore,
        transport: Arc<dyn SyncTransport>,
        config: &ClientConfig,
    ) -> ClientResult<Self> {
        let credentials = transport.fetch_credentials().await?;

        let scheduler = UploadScheduler::new(
            UploadBridge::new(store, transport),
            config.upload_retry_interval,
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { scheduler.run(cancel).await }
        });

        tracing::info!(
            endpoint = %credentials.endpoint,
            user_id = %credentials.user_id,
            "Sync session started"
        );

        Ok(Self {
            credentials,
            cancel,
            handle,
        })
    }

    pub fn credentials(&self) -> &SyncCredentials {
        &self.credentials
    }

    /// Stop the upload loop and wait for it to finish. Queued transactions
    /// stay in the store for the next session.
    pub async fn disconnect(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Upload scheduler task failed");
        }
        tracing::info!("Sync session stopped");
    }
}
