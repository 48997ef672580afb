//! Repository for the `users` table.

use rbac_sync_core::entities::UserPayload;
use rbac_sync_core::types::now_timestamp;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, role_id, created_at, updated_at";

/// Provides upsert, delete and read operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user, or overwrite every mutable column when the id exists.
    ///
    /// Missing timestamps default to now. `created_at` of an existing row is
    /// never changed.
    pub async fn upsert(pool: &PgPool, input: &UserPayload) -> Result<User, sqlx::Error> {
        let now = now_timestamp();
        let query = format!(
            "INSERT INTO users (id, name, email, role_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                role_id = EXCLUDED.role_id,
                updated_at = EXCLUDED.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.role_id)
            .bind(input.created_at.as_deref().unwrap_or(now.as_str()))
            .bind(input.updated_at.as_deref().unwrap_or(now.as_str()))
            .fetch_one(pool)
            .await
    }

    /// Delete a user by id, returning the deleted row if there was one.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("DELETE FROM users WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all users, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }
}
