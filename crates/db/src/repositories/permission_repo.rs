//! Repository for the `permissions` table.

use rbac_sync_core::entities::PermissionPayload;
use rbac_sync_core::types::now_timestamp;
use sqlx::PgPool;

use crate::models::permission::Permission;

const COLUMNS: &str = "id, name, description, created_at, updated_at";

pub struct PermissionRepo;

impl PermissionRepo {
    /// Insert a permission, or overwrite name, description and `updated_at`
    /// when the id exists.
    pub async fn upsert(
        pool: &PgPool,
        input: &PermissionPayload,
    ) -> Result<Permission, sqlx::Error> {
        let now = now_timestamp();
        let query = format!(
            "INSERT INTO permissions (id, name, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Permission>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.created_at.as_deref().unwrap_or(now.as_str()))
            .bind(input.updated_at.as_deref().unwrap_or(now.as_str()))
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<Option<Permission>, sqlx::Error> {
        let query = format!("DELETE FROM permissions WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Permission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Permission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM permissions WHERE id = $1");
        sqlx::query_as::<_, Permission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all permissions, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Permission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM permissions ORDER BY created_at DESC");
        sqlx::query_as::<_, Permission>(&query).fetch_all(pool).await
    }
}
