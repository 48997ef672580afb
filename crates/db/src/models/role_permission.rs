//! Role-permission link models.

use rbac_sync_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `role_permissions` link table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RolePermission {
    pub id: EntityId,
    pub role_id: EntityId,
    pub permission_id: EntityId,
    pub created_at: Timestamp,
}

/// A link joined with the names of both sides. Names are `None` when the
/// link dangles.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RolePermissionWithNames {
    pub id: EntityId,
    pub role_id: EntityId,
    pub permission_id: EntityId,
    pub created_at: Timestamp,
    pub role_name: Option<String>,
    pub permission_name: Option<String>,
}
