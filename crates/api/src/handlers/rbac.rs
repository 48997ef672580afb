//! Read-only views of the server-side RBAC tables.
//!
//! Writes never come through here; they arrive as sync batches.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use rbac_sync_db::repositories::{
    PermissionRepo, RolePermissionRepo, RoleRepo, TimelineRepo, UserRepo,
};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users
pub async fn list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/roles
pub async fn list_roles(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let roles = RoleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// GET /api/v1/permissions
pub async fn list_permissions(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let permissions = PermissionRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: permissions }))
}

/// GET /api/v1/role-permissions
///
/// Links joined with role and permission names; names are null for
/// dangling links.
pub async fn list_role_permissions(
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let links = RolePermissionRepo::list_with_names(&state.pool).await?;
    Ok(Json(DataResponse { data: links }))
}

/// GET /api/v1/timeline
///
/// Users, roles and permissions in creation order, oldest first.
pub async fn timeline(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let entries = TimelineRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: entries }))
}
