//! Route definitions for the read-only RBAC views.

use axum::routing::get;
use axum::Router;

use crate::handlers::rbac;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(rbac::list_users))
        .route("/roles", get(rbac::list_roles))
        .route("/permissions", get(rbac::list_permissions))
        .route("/role-permissions", get(rbac::list_role_permissions))
        .route("/timeline", get(rbac::timeline))
}
