//! Route definitions for the sync protocol.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{credentials, sync};
use crate::state::AppState;

/// Sync routes mounted at `/sync`.
///
/// ```text
/// POST   /                  -> sync_batch
/// GET    /credentials       -> get_credentials
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(sync::sync_batch))
        .route("/credentials", get(credentials::get_credentials))
}
