//! Repository for the `roles` table.

use rbac_sync_core::entities::RolePayload;
use rbac_sync_core::types::now_timestamp;
use sqlx::PgPool;

use crate::models::role::Role;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Provides upsert, delete and read operations for roles.
pub struct RoleRepo;

impl RoleRepo {
    /// Insert a role, or overwrite name, description and `updated_at` when
    /// the id exists.
    pub async fn upsert(pool: &PgPool, input: &RolePayload) -> Result<Role, sqlx::Error> {
        let now = now_timestamp();
        let query = format!(
            "INSERT INTO roles (id, name, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.created_at.as_deref().unwrap_or(now.as_str()))
            .bind(input.updated_at.as_deref().unwrap_or(now.as_str()))
            .fetch_one(pool)
            .await
    }

    /// Delete a role by id. Users and links that reference it are left
    /// untouched.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("DELETE FROM roles WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a role by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all roles, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles ORDER BY created_at DESC");
        sqlx::query_as::<_, Role>(&query).fetch_all(pool).await
    }
}
