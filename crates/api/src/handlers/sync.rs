//! Handler for the batch sync endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use rbac_sync_core::sync::{BatchResponse, OperationDescriptor};

use crate::engine::process_batch;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/sync
///
/// Apply a JSON array of operation descriptors in order. Answers 200 as soon
/// as the batch could be decoded and iterated, even if individual operations
/// failed; per-operation outcomes are in `results`.
///
/// The body is decoded by hand so that an undecodable batch maps to the
/// protocol's `{error, details}` response instead of an extractor rejection.
pub async fn sync_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<BatchResponse>> {
    let operations: Vec<OperationDescriptor> =
        serde_json::from_slice(&body).map_err(|e| AppError::MalformedBatch(e.to_string()))?;

    Ok(Json(process_batch(&state.pool, &operations).await))
}
