//! Repository for the `role_permissions` link table.

use rbac_sync_core::entities::RolePermissionPayload;
use rbac_sync_core::types::now_timestamp;
use sqlx::PgPool;

use crate::models::role_permission::{RolePermission, RolePermissionWithNames};

const COLUMNS: &str = "id, role_id, permission_id, created_at";

/// Provides upsert, delete and read operations for role-permission links.
pub struct RolePermissionRepo;

impl RolePermissionRepo {
    /// Insert a link, or refresh `created_at` of the existing link with the
    /// same `(role_id, permission_id)` pair.
    ///
    /// The conflict key is the pair, not the id: re-submitting a link under
    /// a new id keeps the original row and its original id.
    pub async fn upsert(
        pool: &PgPool,
        input: &RolePermissionPayload,
    ) -> Result<RolePermission, sqlx::Error> {
        let now = now_timestamp();
        let query = format!(
            "INSERT INTO role_permissions (id, role_id, permission_id, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (role_id, permission_id) DO UPDATE SET
                created_at = EXCLUDED.created_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RolePermission>(&query)
            .bind(&input.id)
            .bind(&input.role_id)
            .bind(&input.permission_id)
            .bind(input.created_at.as_deref().unwrap_or(now.as_str()))
            .fetch_one(pool)
            .await
    }

    /// Delete a link by id, returning the deleted row if there was one.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<Option<RolePermission>, sqlx::Error> {
        let query = format!("DELETE FROM role_permissions WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, RolePermission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<RolePermission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM role_permissions WHERE id = $1");
        sqlx::query_as::<_, RolePermission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every link for a role.
    pub async fn list_for_role(
        pool: &PgPool,
        role_id: &str,
    ) -> Result<Vec<RolePermission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM role_permissions WHERE role_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RolePermission>(&query)
            .bind(role_id)
            .fetch_all(pool)
            .await
    }

    /// List all links with role and permission names, most recent first.
    pub async fn list_with_names(
        pool: &PgPool,
    ) -> Result<Vec<RolePermissionWithNames>, sqlx::Error> {
        sqlx::query_as::<_, RolePermissionWithNames>(
            "SELECT rp.id, rp.role_id, rp.permission_id, rp.created_at,
                    r.name AS role_name, p.name AS permission_name
             FROM role_permissions rp
             LEFT JOIN roles r ON rp.role_id = r.id
             LEFT JOIN permissions p ON rp.permission_id = p.id
             ORDER BY rp.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}
