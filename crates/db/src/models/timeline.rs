//! Creation-order view across users, roles and permissions.

use rbac_sync_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// One entry of the combined timeline. `detail` is the user's email or the
/// role/permission description.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimelineEntry {
    pub kind: String,
    pub id: EntityId,
    pub name: String,
    pub detail: Option<String>,
    pub created_at: Timestamp,
}
