pub mod health;
pub mod rbac;
pub mod sync;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sync                    apply an operation batch (POST)
/// /sync/credentials        sync service connection parameters (GET)
///
/// /users                   list (GET)
/// /roles                   list (GET)
/// /permissions             list (GET)
/// /role-permissions        list with role/permission names (GET)
/// /timeline                creation-ordered view (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sync", sync::router())
        .merge(rbac::router())
}
