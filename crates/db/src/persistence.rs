//! Applies one decoded sync mutation to the relational store.
//!
//! There is no retry here: a failed statement surfaces as an error for that
//! single operation, and redelivery is the uploading client's job.

use rbac_sync_core::entities::{EntityKind, EntityPayload};
use rbac_sync_core::sync::EntityMutation;
use serde::Serialize;
use sqlx::PgPool;

use crate::models::permission::Permission;
use crate::models::role::Role;
use crate::models::role_permission::RolePermission;
use crate::models::user::User;
use crate::repositories::{PermissionRepo, RolePermissionRepo, RoleRepo, UserRepo};

/// The row an applied mutation produced (upsert) or removed (delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AppliedRow {
    User(User),
    Role(Role),
    Permission(Permission),
    RolePermission(RolePermission),
}

impl AppliedRow {
    pub fn kind(&self) -> EntityKind {
        match self {
            AppliedRow::User(_) => EntityKind::User,
            AppliedRow::Role(_) => EntityKind::Role,
            AppliedRow::Permission(_) => EntityKind::Permission,
            AppliedRow::RolePermission(_) => EntityKind::RolePermission,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            AppliedRow::User(row) => &row.id,
            AppliedRow::Role(row) => &row.id,
            AppliedRow::Permission(row) => &row.id,
            AppliedRow::RolePermission(row) => &row.id,
        }
    }
}

/// Apply a single mutation as one autocommit statement.
///
/// Upserts always return the resulting row. Deletes return the removed row,
/// or `None` when the id did not exist.
pub async fn apply_mutation(
    pool: &PgPool,
    mutation: &EntityMutation,
) -> Result<Option<AppliedRow>, sqlx::Error> {
    let row = match mutation {
        EntityMutation::Upsert(payload) => Some(match payload {
            EntityPayload::User(p) => AppliedRow::User(UserRepo::upsert(pool, p).await?),
            EntityPayload::Role(p) => AppliedRow::Role(RoleRepo::upsert(pool, p).await?),
            EntityPayload::Permission(p) => {
                AppliedRow::Permission(PermissionRepo::upsert(pool, p).await?)
            }
            EntityPayload::RolePermission(p) => {
                AppliedRow::RolePermission(RolePermissionRepo::upsert(pool, p).await?)
            }
        }),
        EntityMutation::Delete { kind, id } => match kind {
            EntityKind::User => UserRepo::delete(pool, id).await?.map(AppliedRow::User),
            EntityKind::Role => RoleRepo::delete(pool, id).await?.map(AppliedRow::Role),
            EntityKind::Permission => PermissionRepo::delete(pool, id)
                .await?
                .map(AppliedRow::Permission),
            EntityKind::RolePermission => RolePermissionRepo::delete(pool, id)
                .await?
                .map(AppliedRow::RolePermission),
        },
    };

    tracing::debug!(
        entity_type = %mutation.kind(),
        id = mutation.id(),
        affected = row.is_some(),
        "Mutation applied"
    );

    Ok(row)
}
