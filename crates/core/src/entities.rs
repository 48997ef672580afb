//! The four RBAC entity kinds, their records and their upsert payloads.
//!
//! Records are what readers see (local live collections, server list
//! endpoints). Payloads are what a PUT/PATCH carries: timestamps are optional
//! there because the writer may leave them to the persistence layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Closed set of entity kinds that take part in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Role,
    Permission,
    RolePermission,
}

impl EntityKind {
    /// All kinds, in the order their tables are created.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Role,
        EntityKind::Permission,
        EntityKind::RolePermission,
    ];

    /// Table name used on the wire and in both databases.
    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Role => "roles",
            EntityKind::Permission => "permissions",
            EntityKind::RolePermission => "role_permissions",
        }
    }

    /// Resolve a wire table name. Returns `None` for tables outside the
    /// RBAC schema.
    pub fn from_table(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.table_name() == name)
    }

    /// Non-id columns, in schema order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["name", "email", "role_id", "created_at", "updated_at"],
            EntityKind::Role | EntityKind::Permission => {
                &["name", "description", "created_at", "updated_at"]
            }
            EntityKind::RolePermission => &["role_id", "permission_id", "created_at"],
        }
    }

    /// Human-readable singular name, used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Role => "Role",
            EntityKind::Permission => "Permission",
            EntityKind::RolePermission => "RolePermission",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    /// May be null or point at a role that no longer exists.
    pub role_id: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Association between a role and a permission. The `(role_id,
/// permission_id)` pair is intended to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: EntityId,
    pub role_id: EntityId,
    pub permission_id: EntityId,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Upsert payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role_id: Option<EntityId>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePayload {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPayload {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionPayload {
    pub id: EntityId,
    pub role_id: EntityId,
    pub permission_id: EntityId,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A strongly-typed upsert payload for one of the four entity kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityPayload {
    User(UserPayload),
    Role(RolePayload),
    Permission(PermissionPayload),
    RolePermission(RolePermissionPayload),
}

impl EntityPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::User(_) => EntityKind::User,
            EntityPayload::Role(_) => EntityKind::Role,
            EntityPayload::Permission(_) => EntityKind::Permission,
            EntityPayload::RolePermission(_) => EntityKind::RolePermission,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityPayload::User(p) => &p.id,
            EntityPayload::Role(p) => &p.id,
            EntityPayload::Permission(p) => &p.id,
            EntityPayload::RolePermission(p) => &p.id,
        }
    }

    /// Decode a JSON object into the payload type of `kind`.
    pub fn from_value(
        kind: EntityKind,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EntityKind::User => EntityPayload::User(serde_json::from_value(value)?),
            EntityKind::Role => EntityPayload::Role(serde_json::from_value(value)?),
            EntityKind::Permission => EntityPayload::Permission(serde_json::from_value(value)?),
            EntityKind::RolePermission => {
                EntityPayload::RolePermission(serde_json::from_value(value)?)
            }
        })
    }
}
