//! Upload bridge: drains one queued CRUD transaction to the sync endpoint.
//!
//! A transaction is acknowledged only after the endpoint accepted the whole
//! batch. Any transport failure leaves it queued, so the next drain cycle
//! submits the same operations again (at-least-once delivery).

use std::sync::Arc;

use rbac_sync_core::sync::{OperationDescriptor, SyncOp};

use crate::error::ClientResult;
use crate::store::{CrudTransaction, LocalStore};
use crate::transport::SyncTransport;

/// What one [`UploadBridge::upload_next`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The queue was empty.
    Idle,
    /// A transaction was delivered (or held only skippable entries) and
    /// removed from the queue.
    Uploaded {
        tx_id: i64,
        operations: usize,
        failed: usize,
    },
}

#[derive(Clone)]
pub struct UploadBridge {
    store: LocalStore,
    transport: Arc<dyn SyncTransport>,
}

impl UploadBridge {
    pub fn new(store: LocalStore, transport: Arc<dyn SyncTransport>) -> Self {
        Self { store, transport }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Upload the oldest pending transaction.
    ///
    /// On error the transaction stays queued and the error is returned to
    /// the caller, who decides when to retry.
    pub async fn upload_next(&self) -> ClientResult<UploadOutcome> {
        let Some(transaction) = self.store.next_crud_transaction().await? else {
            return Ok(UploadOutcome::Idle);
        };

        let operations = build_descriptors(&transaction);

        let mut failed = 0;
        if !operations.is_empty() {
            let response = self.transport.submit(&operations).await.inspect_err(|e| {
                tracing::warn!(
                    tx_id = transaction.tx_id,
                    operations = operations.len(),
                    error = %e,
                    "Upload failed, transaction stays queued"
                );
            })?;
            failed = response.failed().count();
        }

        self.store.complete(&transaction).await?;

        tracing::info!(
            tx_id = transaction.tx_id,
            operations = operations.len(),
            failed,
            "Uploaded CRUD transaction"
        );

        Ok(UploadOutcome::Uploaded {
            tx_id: transaction.tx_id,
            operations: operations.len(),
            failed,
        })
    }
}

/// Translate a transaction into wire descriptors, preserving order.
/// Entries of an unrecognized kind are skipped with a warning.
pub fn build_descriptors(transaction: &CrudTransaction) -> Vec<OperationDescriptor> {
    let mut operations = Vec::with_capacity(transaction.crud.len());

    for entry in &transaction.crud {
        let Some(op) = entry.op.sync_op() else {
            tracing::warn!(
                op = %entry.op,
                table = %entry.table,
                id = %entry.id,
                "Unknown operation type, skipping"
            );
            continue;
        };

        let descriptor = match op {
            SyncOp::Delete => OperationDescriptor::delete(entry.table.clone(), entry.id.clone()),
            op => OperationDescriptor::upsert(
                op,
                entry.table.clone(),
                entry.id.clone(),
                entry.data.clone().unwrap_or_default(),
            ),
        };
        operations.push(descriptor);
    }

    operations
}
