//! Sequential application of an uploaded sync batch.
//!
//! Operations run strictly in array order, one autocommit statement each, so
//! a later write to the same id observes the earlier one. A failing operation
//! is recorded and the loop moves on; nothing here retries.

use rbac_sync_core::error::CoreError;
use rbac_sync_core::sync::{BatchResponse, OperationDescriptor, OperationResult};
use rbac_sync_db::persistence::apply_mutation;
use rbac_sync_db::DbPool;
use serde_json::Value;

/// Why a single operation failed. Rendered into the `error` field of its
/// result.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode result row: {0}")]
    Encode(#[from] serde_json::Error),
}

enum Outcome {
    /// `type` named a table outside the RBAC schema.
    Skipped,
    Applied(Option<Value>),
}

/// Apply every descriptor in order and collect one result per attempted
/// operation. Skipped descriptors produce no result and are not counted.
pub async fn process_batch(pool: &DbPool, operations: &[OperationDescriptor]) -> BatchResponse {
    tracing::info!(operations = operations.len(), "Sync batch received");

    let mut results = Vec::with_capacity(operations.len());

    for descriptor in operations {
        tracing::debug!(
            op = %descriptor.op,
            entity_type = %descriptor.entity_type,
            id = %descriptor.id,
            has_data = descriptor.data.is_some(),
            "Processing sync operation"
        );

        match apply_descriptor(pool, descriptor).await {
            Ok(Outcome::Skipped) => {
                tracing::warn!(
                    entity_type = %descriptor.entity_type,
                    id = %descriptor.id,
                    "Unknown table type, skipping operation"
                );
            }
            Ok(Outcome::Applied(row)) => {
                results.push(OperationResult::succeeded(descriptor, row));
            }
            Err(e) => {
                tracing::error!(
                    op = %descriptor.op,
                    entity_type = %descriptor.entity_type,
                    id = %descriptor.id,
                    error = %e,
                    "Sync operation failed"
                );
                results.push(OperationResult::failed(descriptor, e.to_string()));
            }
        }
    }

    let response = BatchResponse::from_results(results);
    tracing::info!(
        total = operations.len(),
        processed = response.processed,
        successful = response.succeeded_count(),
        failed = response.failed().count(),
        "Sync batch completed"
    );
    response
}

async fn apply_descriptor(
    pool: &DbPool,
    descriptor: &OperationDescriptor,
) -> Result<Outcome, OperationError> {
    let Some(mutation) = descriptor.decode()? else {
        return Ok(Outcome::Skipped);
    };

    let row = apply_mutation(pool, &mutation).await?;
    let value = row.map(|r| serde_json::to_value(&r)).transpose()?;
    Ok(Outcome::Applied(value))
}
