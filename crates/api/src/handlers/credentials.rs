//! Handler for the sync credential endpoint.

use axum::extract::State;
use axum::Json;
use rbac_sync_core::credentials::SyncCredentials;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/sync/credentials
///
/// Return the configured sync service endpoint and token. Fails with a
/// configuration error when either is missing.
pub async fn get_credentials(State(state): State<AppState>) -> AppResult<Json<SyncCredentials>> {
    let credentials = state
        .config
        .sync_service
        .credentials()
        .ok_or_else(|| AppError::Configuration("Sync service not configured".into()))?;

    tracing::debug!(endpoint = %credentials.endpoint, "Issued sync credentials");

    Ok(Json(credentials))
}
