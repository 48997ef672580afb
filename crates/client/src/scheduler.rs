//! Background upload loop.
//!
//! [`UploadScheduler`] drains the upload queue whenever a local write
//! commits, and again on every retry tick so a queue left behind by a failed
//! upload is eventually delivered.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::bridge::{UploadBridge, UploadOutcome};
use crate::store::{TableUpdate, WriteOrigin};

pub struct UploadScheduler {
    bridge: UploadBridge,
    updates: broadcast::Receiver<TableUpdate>,
    retry_interval: Duration,
}

impl UploadScheduler {
    /// Writes committed after this call are guaranteed to wake the loop.
    pub fn new(bridge: UploadBridge, retry_interval: Duration) -> Self {
        Self {
            updates: bridge.store().subscribe(),
            bridge,
            retry_interval,
        }
    }

    /// Run until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.retry_interval);

        tracing::info!(
            retry_secs = self.retry_interval.as_secs(),
            "Upload scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Upload scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.drain().await;
                }
                update = self.updates.recv() => match update {
                    Ok(update) if update.origin == WriteOrigin::Local => {
                        self.drain().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Upload scheduler lagged behind table updates");
                        self.drain().await;
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    /// Upload transactions until the queue is empty or an upload fails.
    /// Returns how many transactions were delivered.
    pub async fn drain(&self) -> usize {
        let mut delivered = 0;
        loop {
            match self.bridge.upload_next().await {
                Ok(UploadOutcome::Idle) => break,
                Ok(UploadOutcome::Uploaded { .. }) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_secs = self.retry_interval.as_secs(),
                        "Upload cycle failed, will retry"
                    );
                    break;
                }
            }
        }
        if delivered > 0 {
            tracing::debug!(delivered, "Upload queue drained");
        }
        delivered
    }
}
