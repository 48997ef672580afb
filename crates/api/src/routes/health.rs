use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when Postgres does not answer.
    pub status: &'static str,
    pub version: &'static str,
    /// Result of a `SELECT 1` against the shared pool.
    pub db_healthy: bool,
}

/// Liveness probe for load balancers. Always 200; the sync service may be
/// up while the RBAC database is not.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = rbac_sync_db::health_check(&state.pool).await.is_ok();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// Mounted at the root, next to the `/api/v1` tree.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
