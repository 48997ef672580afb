//! Read-only creation timeline across users, roles and permissions.

use sqlx::PgPool;

use crate::models::timeline::TimelineEntry;

pub struct TimelineRepo;

impl TimelineRepo {
    /// All users, roles and permissions ordered oldest first.
    ///
    /// Timestamps share one ISO-8601 format, so text ordering is
    /// chronological.
    pub async fn list(pool: &PgPool) -> Result<Vec<TimelineEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimelineEntry>(
            "SELECT 'user' AS kind, id, name, email AS detail, created_at FROM users
             UNION ALL
             SELECT 'role' AS kind, id, name, description AS detail, created_at FROM roles
             UNION ALL
             SELECT 'permission' AS kind, id, name, description AS detail, created_at
             FROM permissions
             ORDER BY created_at ASC",
        )
        .fetch_all(pool)
        .await
    }
}
