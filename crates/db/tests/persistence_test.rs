//! Integration tests for `apply_mutation` and the entity repositories.

use assert_matches::assert_matches;
use rbac_sync_core::entities::{
    EntityKind, EntityPayload, PermissionPayload, RolePayload, RolePermissionPayload, UserPayload,
};
use rbac_sync_core::sync::EntityMutation;
use rbac_sync_db::persistence::{apply_mutation, AppliedRow};
use rbac_sync_db::repositories::{PermissionRepo, RolePermissionRepo, RoleRepo, UserRepo};
use sqlx::PgPool;

fn user(id: &str, name: &str) -> UserPayload {
    UserPayload {
        id: id.into(),
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        role_id: None,
        created_at: Some("2026-03-01T10:00:00.000Z".into()),
        updated_at: Some("2026-03-01T10:00:00.000Z".into()),
    }
}

fn link(id: &str, role_id: &str, permission_id: &str, created_at: &str) -> RolePermissionPayload {
    RolePermissionPayload {
        id: id.into(),
        role_id: role_id.into(),
        permission_id: permission_id.into(),
        created_at: Some(created_at.into()),
    }
}

// ---------------------------------------------------------------------------
// Idempotent delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_of_missing_id_returns_none_for_every_kind(pool: PgPool) {
    for kind in EntityKind::ALL {
        let mutation = EntityMutation::Delete {
            kind,
            id: "does-not-exist".into(),
        };
        let result = apply_mutation(&pool, &mutation).await.unwrap();
        assert!(result.is_none(), "{kind} delete should be a no-op");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_returns_the_removed_row(pool: PgPool) {
    UserRepo::upsert(&pool, &user("u1", "Ada")).await.unwrap();

    let removed = apply_mutation(
        &pool,
        &EntityMutation::Delete {
            kind: EntityKind::User,
            id: "u1".into(),
        },
    )
    .await
    .unwrap();

    assert_matches!(removed, Some(AppliedRow::User(ref row)) if row.name == "Ada");
    assert!(UserRepo::find_by_id(&pool, "u1").await.unwrap().is_none());

    // Second delete of the same id is still fine.
    let again = UserRepo::delete(&pool, "u1").await.unwrap();
    assert!(again.is_none());
}

// ---------------------------------------------------------------------------
// Upsert convergence
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn same_put_twice_yields_one_row_equal_to_payload(pool: PgPool) {
    let payload = user("u1", "Ada");
    let mutation = EntityMutation::Upsert(EntityPayload::User(payload.clone()));

    apply_mutation(&pool, &mutation).await.unwrap();
    apply_mutation(&pool, &mutation).await.unwrap();

    let rows = UserRepo::list(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, payload.id);
    assert_eq!(rows[0].name, payload.name);
    assert_eq!(rows[0].email, payload.email);
    assert_eq!(Some(rows[0].updated_at.clone()), payload.updated_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upsert_overwrites_mutable_columns_but_keeps_created_at(pool: PgPool) {
    UserRepo::upsert(&pool, &user("u1", "Ada")).await.unwrap();

    let mut changed = user("u1", "Grace");
    changed.role_id = Some("r1".into());
    changed.created_at = Some("2030-01-01T00:00:00.000Z".into());
    changed.updated_at = Some("2026-03-02T09:30:00.000Z".into());
    let row = UserRepo::upsert(&pool, &changed).await.unwrap();

    assert_eq!(row.name, "Grace");
    assert_eq!(row.role_id.as_deref(), Some("r1"));
    assert_eq!(row.created_at, "2026-03-01T10:00:00.000Z");
    assert_eq!(row.updated_at, "2026-03-02T09:30:00.000Z");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_timestamps_default_to_now(pool: PgPool) {
    let role = RoleRepo::upsert(
        &pool,
        &RolePayload {
            id: "r1".into(),
            name: "Admin".into(),
            description: None,
            created_at: None,
            updated_at: None,
        },
    )
    .await
    .unwrap();

    assert!(role.created_at.ends_with('Z'));
    assert!(!role.updated_at.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn link_pair_is_the_conflict_key(pool: PgPool) {
    RolePermissionRepo::upsert(&pool, &link("rp1", "r1", "p1", "2026-03-01T10:00:00.000Z"))
        .await
        .unwrap();
    let row = RolePermissionRepo::upsert(&pool, &link("rp2", "r1", "p1", "2026-03-05T10:00:00.000Z"))
        .await
        .unwrap();

    // Same pair under a new id refreshes the timestamp of the original row.
    assert_eq!(row.id, "rp1");
    assert_eq!(row.created_at, "2026-03-05T10:00:00.000Z");

    let links = RolePermissionRepo::list_for_role(&pool, "r1").await.unwrap();
    assert_eq!(links.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn link_with_reused_id_and_new_pair_is_an_error(pool: PgPool) {
    RolePermissionRepo::upsert(&pool, &link("rp1", "r1", "p1", "2026-03-01T10:00:00.000Z"))
        .await
        .unwrap();

    let result =
        RolePermissionRepo::upsert(&pool, &link("rp1", "r1", "p2", "2026-03-01T10:00:00.000Z"))
            .await;

    assert_matches!(result, Err(sqlx::Error::Database(_)));
}

// ---------------------------------------------------------------------------
// Referential shape only
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn dangling_references_are_accepted(pool: PgPool) {
    let mut payload = user("u1", "Ada");
    payload.role_id = Some("no-such-role".into());
    UserRepo::upsert(&pool, &payload).await.unwrap();

    RolePermissionRepo::upsert(&pool, &link("rp1", "ghost-role", "ghost-perm", "2026-03-01T10:00:00.000Z"))
        .await
        .unwrap();

    let links = RolePermissionRepo::list_with_names(&pool).await.unwrap();
    assert_eq!(links.len(), 1);
    assert!(links[0].role_name.is_none());
    assert!(links[0].permission_name.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_role_does_not_cascade(pool: PgPool) {
    RoleRepo::upsert(
        &pool,
        &RolePayload {
            id: "r1".into(),
            name: "Admin".into(),
            description: Some("Everything".into()),
            created_at: None,
            updated_at: None,
        },
    )
    .await
    .unwrap();
    let mut payload = user("u1", "Ada");
    payload.role_id = Some("r1".into());
    UserRepo::upsert(&pool, &payload).await.unwrap();
    RolePermissionRepo::upsert(&pool, &link("rp1", "r1", "p1", "2026-03-01T10:00:00.000Z"))
        .await
        .unwrap();

    RoleRepo::delete(&pool, "r1").await.unwrap();

    let user = UserRepo::find_by_id(&pool, "u1").await.unwrap().unwrap();
    assert_eq!(user.role_id.as_deref(), Some("r1"));
    assert!(RolePermissionRepo::find_by_id(&pool, "rp1").await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn timeline_lists_entities_oldest_first(pool: PgPool) {
    PermissionRepo::upsert(
        &pool,
        &PermissionPayload {
            id: "p1".into(),
            name: "read".into(),
            description: Some("Read things".into()),
            created_at: Some("2026-03-03T00:00:00.000Z".into()),
            updated_at: None,
        },
    )
    .await
    .unwrap();
    UserRepo::upsert(&pool, &user("u1", "Ada")).await.unwrap();

    let entries = rbac_sync_db::repositories::TimelineRepo::list(&pool).await.unwrap();
    let kinds: Vec<_> = entries.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, ["user", "permission"]);
    assert_eq!(entries[0].detail.as_deref(), Some("ada@example.com"));
}
