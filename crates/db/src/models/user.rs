//! User entity model.

use rbac_sync_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub role_id: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
