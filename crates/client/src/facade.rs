//! UI-facing RBAC read/write facade.
//!
//! [`RbacFacade`] keeps an in-memory [`RbacSnapshot`] of the four local
//! tables, refreshed after every committed write whether it came from this
//! client or from the sync service. Writes go straight to the local store
//! and return immediately; the upload bridge forwards them later.

use std::sync::Arc;

use rbac_sync_core::entities::{EntityKind, Permission, Role, RolePermission, User};
use rbac_sync_core::error::CoreError;
use rbac_sync_core::types::{new_entity_id, now_timestamp, EntityId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};
use crate::store::{LocalRow, LocalStore};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The four collections, each ordered most recently created first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RbacSnapshot {
    pub users: Vec<User>,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub role_permissions: Vec<RolePermission>,
}

impl RbacSnapshot {
    /// The role a user points at, if both exist.
    pub fn user_role(&self, user_id: &str) -> Option<&Role> {
        let role_id = self
            .users
            .iter()
            .find(|u| u.id == user_id)?
            .role_id
            .as_deref()?;
        self.roles.iter().find(|r| r.id == role_id)
    }

    /// Permissions linked to a role. Links to missing permissions are
    /// ignored.
    pub fn role_permissions(&self, role_id: &str) -> Vec<&Permission> {
        let linked: Vec<&str> = self
            .role_permissions
            .iter()
            .filter(|rp| rp.role_id == role_id)
            .map(|rp| rp.permission_id.as_str())
            .collect();
        self.permissions
            .iter()
            .filter(|p| linked.contains(&p.id.as_str()))
            .collect()
    }

    pub fn has_link(&self, role_id: &str, permission_id: &str) -> bool {
        self.role_permissions
            .iter()
            .any(|rp| rp.role_id == role_id && rp.permission_id == permission_id)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role_id: Option<EntityId>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPermission {
    pub name: String,
    pub description: Option<String>,
}

/// Fields to change on a user. `role_id: Some(None)` clears the role.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<Option<EntityId>>,
}

/// Fields to change on a role or permission. `description: Some(None)`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct DefinitionChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

/// Result of [`RbacFacade::toggle_role_permission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Granted(RolePermission),
    Revoked,
}

// ---------------------------------------------------------------------------
// RbacFacade
// ---------------------------------------------------------------------------

pub struct RbacFacade {
    store: LocalStore,
    snapshot: Arc<watch::Sender<RbacSnapshot>>,
    cancel: CancellationToken,
}

impl RbacFacade {
    /// Load the current tables and start following store updates.
    pub async fn open(store: LocalStore) -> ClientResult<Self> {
        let mut updates = store.subscribe();
        let (sender, _) = watch::channel(load_snapshot(&store).await?);
        let snapshot = Arc::new(sender);
        let cancel = CancellationToken::new();

        tokio::spawn({
            let store = store.clone();
            let snapshot = Arc::clone(&snapshot);
            let cancel = cancel.clone();
            async move {
                loop {
                    let kinds = tokio::select! {
                        _ = cancel.cancelled() => break,
                        update = updates.recv() => match update {
                            Ok(update) => update.tables,
                            Err(RecvError::Lagged(_)) => EntityKind::ALL.to_vec(),
                            Err(RecvError::Closed) => break,
                        },
                    };
                    if let Err(e) = reload(&store, &snapshot, &kinds).await {
                        tracing::error!(error = %e, "Failed to refresh RBAC snapshot");
                    }
                }
                tracing::debug!("RBAC snapshot listener stopped");
            }
        });

        Ok(Self {
            store,
            snapshot,
            cancel,
        })
    }

    pub fn snapshot(&self) -> RbacSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receive every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RbacSnapshot> {
        self.snapshot.subscribe()
    }

    /// Reload all four collections from the store.
    pub async fn refresh(&self) -> ClientResult<()> {
        reload(&self.store, &self.snapshot, &EntityKind::ALL).await
    }

    pub fn user_role(&self, user_id: &str) -> Option<Role> {
        self.snapshot.borrow().user_role(user_id).cloned()
    }

    pub fn role_permissions(&self, role_id: &str) -> Vec<Permission> {
        self.snapshot
            .borrow()
            .role_permissions(role_id)
            .into_iter()
            .cloned()
            .collect()
    }

    // ---- users ----

    pub async fn create_user(&self, input: NewUser) -> ClientResult<User> {
        require_non_blank("User name", &input.name)?;
        require_non_blank("User email", &input.email)?;

        let now = now_timestamp();
        let user = User {
            id: new_entity_id(),
            name: input.name,
            email: input.email,
            role_id: input.role_id,
            created_at: now.clone(),
            updated_at: now,
        };
        self.insert(EntityKind::User, &user).await?;
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, changes: UserChanges) -> ClientResult<User> {
        let mut fields = Map::new();
        if let Some(name) = changes.name {
            require_non_blank("User name", &name)?;
            fields.insert("name".into(), Value::String(name));
        }
        if let Some(email) = changes.email {
            require_non_blank("User email", &email)?;
            fields.insert("email".into(), Value::String(email));
        }
        if let Some(role_id) = changes.role_id {
            fields.insert("role_id".into(), role_id.map_or(Value::Null, Value::String));
        }
        self.update(EntityKind::User, id, fields).await
    }

    pub async fn delete_user(&self, id: &str) -> ClientResult<bool> {
        self.delete(EntityKind::User, id).await
    }

    // ---- roles ----

    pub async fn create_role(&self, input: NewRole) -> ClientResult<Role> {
        require_non_blank("Role name", &input.name)?;

        let now = now_timestamp();
        let role = Role {
            id: new_entity_id(),
            name: input.name,
            description: input.description,
            created_at: now.clone(),
            updated_at: now,
        };
        self.insert(EntityKind::Role, &role).await?;
        Ok(role)
    }

    pub async fn update_role(&self, id: &str, changes: DefinitionChanges) -> ClientResult<Role> {
        let fields = definition_fields("Role name", changes)?;
        self.update(EntityKind::Role, id, fields).await
    }

    /// Delete a role. Users and links that reference it are left dangling.
    pub async fn delete_role(&self, id: &str) -> ClientResult<bool> {
        self.delete(EntityKind::Role, id).await
    }

    // ---- permissions ----

    pub async fn create_permission(&self, input: NewPermission) -> ClientResult<Permission> {
        require_non_blank("Permission name", &input.name)?;

        let now = now_timestamp();
        let permission = Permission {
            id: new_entity_id(),
            name: input.name,
            description: input.description,
            created_at: now.clone(),
            updated_at: now,
        };
        self.insert(EntityKind::Permission, &permission).await?;
        Ok(permission)
    }

    pub async fn update_permission(
        &self,
        id: &str,
        changes: DefinitionChanges,
    ) -> ClientResult<Permission> {
        let fields = definition_fields("Permission name", changes)?;
        self.update(EntityKind::Permission, id, fields).await
    }

    pub async fn delete_permission(&self, id: &str) -> ClientResult<bool> {
        self.delete(EntityKind::Permission, id).await
    }

    // ---- links ----

    /// Grant the permission to the role if the snapshot has no such link,
    /// otherwise revoke every link for the pair.
    ///
    /// The presence check reads the in-memory snapshot, so two concurrent
    /// toggles can both see the link as absent and both insert. The server
    /// collapses such duplicates onto one row per pair.
    pub async fn toggle_role_permission(
        &self,
        role_id: &str,
        permission_id: &str,
    ) -> ClientResult<ToggleOutcome> {
        let linked = self.snapshot.borrow().has_link(role_id, permission_id);

        if linked {
            self.store
                .delete_where(
                    EntityKind::RolePermission,
                    vec![
                        ("role_id".into(), role_id.to_string()),
                        ("permission_id".into(), permission_id.to_string()),
                    ],
                )
                .await?;
            reload(&self.store, &self.snapshot, &[EntityKind::RolePermission]).await?;
            return Ok(ToggleOutcome::Revoked);
        }

        let link = RolePermission {
            id: new_entity_id(),
            role_id: role_id.to_string(),
            permission_id: permission_id.to_string(),
            created_at: now_timestamp(),
        };
        self.insert(EntityKind::RolePermission, &link).await?;
        Ok(ToggleOutcome::Granted(link))
    }

    // ---- internals ----

    async fn insert<T: Serialize>(&self, kind: EntityKind, record: &T) -> ClientResult<()> {
        self.store.put(kind, to_row(record)?).await?;
        reload(&self.store, &self.snapshot, &[kind]).await
    }

    async fn update<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
        mut fields: LocalRow,
    ) -> ClientResult<T> {
        fields.insert("updated_at".into(), Value::String(now_timestamp()));

        let row = self
            .store
            .patch(kind, id, fields)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: kind.label(),
                id: id.to_string(),
            })?;
        reload(&self.store, &self.snapshot, &[kind]).await?;
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> ClientResult<bool> {
        let removed = self.store.delete(kind, id).await?;
        if removed {
            reload(&self.store, &self.snapshot, &[kind]).await?;
        }
        Ok(removed)
    }
}

impl Drop for RbacFacade {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn definition_fields(name_field: &str, changes: DefinitionChanges) -> ClientResult<LocalRow> {
    let mut fields = Map::new();
    if let Some(name) = changes.name {
        require_non_blank(name_field, &name)?;
        fields.insert("name".into(), Value::String(name));
    }
    if let Some(description) = changes.description {
        fields.insert(
            "description".into(),
            description.map_or(Value::Null, Value::String),
        );
    }
    Ok(fields)
}

fn to_row<T: Serialize>(record: &T) -> ClientResult<LocalRow> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(ClientError::Core(CoreError::Internal(format!(
            "Expected a record object, got {other}"
        )))),
    }
}

/// Decode table rows, dropping (and logging) rows that do not fit the
/// record type, such as a user with a null name.
fn decode_rows<T: DeserializeOwned>(kind: EntityKind, rows: Vec<LocalRow>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(Value::Object(row)) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(table = %kind, error = %e, "Skipping undecodable local row");
                None
            }
        })
        .collect()
}

async fn load_snapshot(store: &LocalStore) -> ClientResult<RbacSnapshot> {
    Ok(RbacSnapshot {
        users: decode_rows(EntityKind::User, store.get_all(EntityKind::User).await?),
        roles: decode_rows(EntityKind::Role, store.get_all(EntityKind::Role).await?),
        permissions: decode_rows(
            EntityKind::Permission,
            store.get_all(EntityKind::Permission).await?,
        ),
        role_permissions: decode_rows(
            EntityKind::RolePermission,
            store.get_all(EntityKind::RolePermission).await?,
        ),
    })
}

/// Re-read the given tables and publish the updated snapshot. Collections
/// not listed in `kinds` keep whatever the snapshot holds at publish time.
async fn reload(
    store: &LocalStore,
    snapshot: &watch::Sender<RbacSnapshot>,
    kinds: &[EntityKind],
) -> ClientResult<()> {
    let mut fresh = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        fresh.push((kind, store.get_all(kind).await?));
    }

    snapshot.send_modify(|current| {
        for (kind, rows) in fresh {
            match kind {
                EntityKind::User => current.users = decode_rows(kind, rows),
                EntityKind::Role => current.roles = decode_rows(kind, rows),
                EntityKind::Permission => current.permissions = decode_rows(kind, rows),
                EntityKind::RolePermission => {
                    current.role_permissions = decode_rows(kind, rows)
                }
            }
        }
    });
    Ok(())
}
