use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, created and owned by `main`.
    pub pool: rbac_sync_db::DbPool,
    /// Server configuration, including the sync service credentials.
    pub config: Arc<ServerConfig>,
}
