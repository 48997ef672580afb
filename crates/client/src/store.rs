//! Embedded local store with a queued upload log.
//!
//! [`LocalStore`] owns a SQLite pool holding the four RBAC tables. Every
//! local write runs in one SQLite transaction that also appends CRUD
//! entries to `ps_crud` under a fresh transaction id, so the upload queue
//! and the tables never disagree. Remote-origin writes bypass the queue.
//!
//! Each committed write is announced as a [`TableUpdate`] on a broadcast
//! channel; [`LocalStore::watch_table`] turns those announcements into live
//! query results.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rbac_sync_core::entities::EntityKind;
use rbac_sync_core::error::CoreError;
use rbac_sync_core::sync::SyncOp;
use rbac_sync_core::types::EntityId;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};
use tokio::sync::{broadcast, watch};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::schema;

/// Capacity of the table-update broadcast channel.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// A row of an entity table: `id` plus every column, each a JSON string or
/// `null`.
pub type LocalRow = Map<String, Value>;

// ---------------------------------------------------------------------------
// Writes and notifications
// ---------------------------------------------------------------------------

/// One mutation against an entity table.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalWrite {
    /// Insert or replace a whole row. `row` must carry a string `id`.
    Put { kind: EntityKind, row: LocalRow },
    /// Update some columns of an existing row. Missing rows are left alone.
    Patch {
        kind: EntityKind,
        id: EntityId,
        changes: LocalRow,
    },
    Delete { kind: EntityKind, id: EntityId },
    /// Delete every row whose columns equal all the given values.
    DeleteWhere {
        kind: EntityKind,
        filter: Vec<(String, String)>,
    },
}

impl LocalWrite {
    pub fn kind(&self) -> EntityKind {
        match self {
            LocalWrite::Put { kind, .. }
            | LocalWrite::Patch { kind, .. }
            | LocalWrite::Delete { kind, .. }
            | LocalWrite::DeleteWhere { kind, .. } => *kind,
        }
    }
}

/// Where a committed write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// Written by this client; queued for upload.
    Local,
    /// Applied from the sync service; never uploaded.
    Remote,
}

/// Announcement that one committed write touched the listed tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableUpdate {
    pub tables: Vec<EntityKind>,
    pub origin: WriteOrigin,
}

impl TableUpdate {
    pub fn touches(&self, kind: EntityKind) -> bool {
        self.tables.contains(&kind)
    }
}

// ---------------------------------------------------------------------------
// Upload queue
// ---------------------------------------------------------------------------

/// Kind of a queued mutation, as recorded in `ps_crud.op`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateType {
    Put,
    Patch,
    Delete,
    /// Anything else found in the queue. The upload bridge skips these.
    Unknown(String),
}

impl UpdateType {
    pub fn as_str(&self) -> &str {
        match self {
            UpdateType::Put => "PUT",
            UpdateType::Patch => "PATCH",
            UpdateType::Delete => "DELETE",
            UpdateType::Unknown(raw) => raw,
        }
    }

    /// The wire operation this mutation uploads as.
    pub fn sync_op(&self) -> Option<SyncOp> {
        match self {
            UpdateType::Put => Some(SyncOp::Put),
            UpdateType::Patch => Some(SyncOp::Patch),
            UpdateType::Delete => Some(SyncOp::Delete),
            UpdateType::Unknown(_) => None,
        }
    }
}

impl From<&str> for UpdateType {
    fn from(raw: &str) -> Self {
        match raw {
            "PUT" => UpdateType::Put,
            "PATCH" => UpdateType::Patch,
            "DELETE" => UpdateType::Delete,
            other => UpdateType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One queued mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct CrudEntry {
    pub seq: i64,
    pub op: UpdateType,
    pub table: String,
    pub id: EntityId,
    /// Column values for PUT and PATCH (the full row, without `id`);
    /// `None` for DELETE.
    pub data: Option<Map<String, Value>>,
}

/// All mutations one local write produced, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CrudTransaction {
    pub tx_id: i64,
    pub crud: Vec<CrudEntry>,
}

#[derive(FromRow)]
struct CrudRow {
    seq: i64,
    op: String,
    table_name: String,
    row_id: String,
    data: Option<String>,
}

impl TryFrom<CrudRow> for CrudEntry {
    type Error = serde_json::Error;

    fn try_from(row: CrudRow) -> Result<Self, Self::Error> {
        let data = row
            .data
            .as_deref()
            .map(serde_json::from_str::<Map<String, Value>>)
            .transpose()?;
        Ok(CrudEntry {
            seq: row.seq,
            op: UpdateType::from(row.op.as_str()),
            table: row.table_name,
            id: row.row_id,
            data,
        })
    }
}

// ---------------------------------------------------------------------------
// LocalStore
// ---------------------------------------------------------------------------

/// Handle to the embedded store. Cheap to clone; clones share the pool and
/// the update channel.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
    updates: broadcast::Sender<TableUpdate>,
}

impl LocalStore {
    /// Open (or create) the store at `url` and make sure its tables exist.
    ///
    /// An in-memory database lives only as long as its single pooled
    /// connection, so that connection is never recycled.
    pub async fn open(url: &str) -> ClientResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(4)
                .connect_with(options)
                .await?
        };

        schema::bootstrap(&pool).await?;
        tracing::debug!(url, "Local store opened");

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Ok(Self { pool, updates })
    }

    /// Open the store named by [`ClientConfig::local_db_url`].
    pub async fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::open(&config.local_db_url).await
    }

    pub async fn in_memory() -> ClientResult<Self> {
        Self::open("sqlite::memory:").await
    }

    /// Receive a [`TableUpdate`] for every committed write.
    pub fn subscribe(&self) -> broadcast::Receiver<TableUpdate> {
        self.updates.subscribe()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---- reads ----

    /// Every row of a table, most recently created first.
    pub async fn get_all(&self, kind: EntityKind) -> ClientResult<Vec<LocalRow>> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC",
            select_list(kind),
            kind.table_name()
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| local_row(kind, row))
            .collect::<Result<_, _>>()?)
    }

    pub async fn get(&self, kind: EntityKind, id: &str) -> ClientResult<Option<LocalRow>> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_row(&mut *conn, kind, id).await?)
    }

    /// Live view of one table.
    ///
    /// The receiver starts with the current rows and is refreshed after
    /// every write that touches the table, whatever its origin. The
    /// refresh task ends once every receiver is dropped.
    pub async fn watch_table(
        &self,
        kind: EntityKind,
    ) -> ClientResult<watch::Receiver<Vec<LocalRow>>> {
        let mut updates = self.subscribe();
        let (tx, rx) = watch::channel(self.get_all(kind).await?);
        let store = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    update = updates.recv() => {
                        match update {
                            Ok(update) if !update.touches(kind) => continue,
                            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                        match store.get_all(kind).await {
                            Ok(rows) => {
                                if tx.send(rows).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::error!(table = %kind, error = %e, "Failed to refresh watched table");
                            }
                        }
                    }
                }
            }
            tracing::debug!(table = %kind, "Table watch ended");
        });

        Ok(rx)
    }

    // ---- local writes ----

    pub async fn put(&self, kind: EntityKind, row: LocalRow) -> ClientResult<()> {
        self.write_batch(vec![LocalWrite::Put { kind, row }]).await
    }

    /// Update some columns of a row and return the row as it now stands, or
    /// `None` if it does not exist.
    pub async fn patch(
        &self,
        kind: EntityKind,
        id: &str,
        changes: LocalRow,
    ) -> ClientResult<Option<LocalRow>> {
        self.write_batch(vec![LocalWrite::Patch {
            kind,
            id: id.to_string(),
            changes,
        }])
        .await?;
        self.get(kind, id).await
    }

    /// Delete a row by id. Returns whether a row was removed.
    pub async fn delete(&self, kind: EntityKind, id: &str) -> ClientResult<bool> {
        let removed = self
            .commit(
                vec![LocalWrite::Delete {
                    kind,
                    id: id.to_string(),
                }],
                WriteOrigin::Local,
            )
            .await?;
        Ok(removed > 0)
    }

    /// Delete every row matching all `(column, value)` pairs. Returns the
    /// number of rows removed.
    pub async fn delete_where(
        &self,
        kind: EntityKind,
        filter: Vec<(String, String)>,
    ) -> ClientResult<u64> {
        self.commit(vec![LocalWrite::DeleteWhere { kind, filter }], WriteOrigin::Local)
            .await
    }

    /// Apply several writes atomically as one upload transaction.
    pub async fn write_batch(&self, writes: Vec<LocalWrite>) -> ClientResult<()> {
        self.commit(writes, WriteOrigin::Local).await.map(|_| ())
    }

    /// Apply writes that originated on the sync service. Tables change and
    /// watchers fire, but nothing is queued for upload.
    pub async fn apply_remote(&self, writes: Vec<LocalWrite>) -> ClientResult<()> {
        self.commit(writes, WriteOrigin::Remote).await.map(|_| ())
    }

    // ---- upload queue ----

    /// The oldest queued transaction, if any.
    pub async fn next_crud_transaction(&self) -> ClientResult<Option<CrudTransaction>> {
        let mut conn = self.pool.acquire().await?;

        let tx_id: Option<i64> =
            sqlx::query_scalar("SELECT tx_id FROM ps_crud ORDER BY seq ASC LIMIT 1")
                .fetch_optional(&mut *conn)
                .await?;
        let Some(tx_id) = tx_id else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, CrudRow>(
            "SELECT seq, op, table_name, row_id, data FROM ps_crud
             WHERE tx_id = ? ORDER BY seq ASC",
        )
        .bind(tx_id)
        .fetch_all(&mut *conn)
        .await?;

        let crud = rows
            .into_iter()
            .map(CrudEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CrudTransaction { tx_id, crud }))
    }

    /// Drop a delivered transaction from the queue.
    pub async fn complete(&self, transaction: &CrudTransaction) -> ClientResult<()> {
        let result = sqlx::query("DELETE FROM ps_crud WHERE tx_id = ?")
            .bind(transaction.tx_id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(
            tx_id = transaction.tx_id,
            entries = result.rows_affected(),
            "CRUD transaction completed"
        );
        Ok(())
    }

    /// Number of queued mutations across all transactions.
    pub async fn pending_count(&self) -> ClientResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM ps_crud")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn has_pending(&self) -> ClientResult<bool> {
        Ok(self.pending_count().await? > 0)
    }

    // ---- internals ----

    /// Run `writes` in one SQLite transaction and announce the touched
    /// tables. Returns the number of rows changed.
    async fn commit(&self, writes: Vec<LocalWrite>, origin: WriteOrigin) -> ClientResult<u64> {
        if writes.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let tx_id = match origin {
            WriteOrigin::Local => Some(next_tx_id(&mut *tx).await?),
            WriteOrigin::Remote => None,
        };

        let mut changed = 0;
        let mut touched = BTreeSet::new();
        for write in &writes {
            let rows = apply_write(&mut *tx, write, tx_id).await?;
            if rows > 0 {
                touched.insert(write.kind().table_name());
            }
            changed += rows;
        }

        tx.commit().await?;

        if !touched.is_empty() {
            let tables: Vec<EntityKind> = touched
                .into_iter()
                .filter_map(EntityKind::from_table)
                .collect();
            tracing::debug!(?tables, ?origin, ?tx_id, changed, "Local write committed");
            // No receivers is fine: nothing is watching yet.
            let _ = self.updates.send(TableUpdate { tables, origin });
        }

        Ok(changed)
    }
}

// ---------------------------------------------------------------------------
// Statement helpers
// ---------------------------------------------------------------------------

fn select_list(kind: EntityKind) -> String {
    let mut columns = vec!["id"];
    columns.extend_from_slice(kind.columns());
    columns.join(", ")
}

fn local_row(kind: EntityKind, row: &SqliteRow) -> Result<LocalRow, sqlx::Error> {
    let mut map = Map::new();
    let id: String = row.try_get("id")?;
    map.insert("id".to_string(), Value::String(id));
    for &column in kind.columns() {
        let value: Option<String> = row.try_get(column)?;
        map.insert(column.to_string(), value.map_or(Value::Null, Value::String));
    }
    Ok(map)
}

/// Text value stored for a JSON field. Non-string scalars keep their JSON
/// rendering since every column is `TEXT`.
fn column_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn check_column(kind: EntityKind, column: &str) -> Result<(), CoreError> {
    if kind.columns().contains(&column) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown column '{column}' for {kind}"
        )))
    }
}

async fn fetch_row(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: &str,
) -> Result<Option<LocalRow>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE id = ?",
        select_list(kind),
        kind.table_name()
    );
    let row = sqlx::query(&query).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(|r| local_row(kind, r)).transpose()
}

async fn next_tx_id(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("UPDATE ps_tx SET next_tx = next_tx + 1 WHERE id = 1 RETURNING next_tx - 1")
        .fetch_one(conn)
        .await
}

async fn enqueue(
    conn: &mut SqliteConnection,
    tx_id: i64,
    op: UpdateType,
    kind: EntityKind,
    id: &str,
    data: Option<&LocalRow>,
) -> ClientResult<()> {
    let data = data
        .map(|row| {
            let mut columns = row.clone();
            columns.remove("id");
            serde_json::to_string(&columns)
        })
        .transpose()?;

    sqlx::query(
        "INSERT INTO ps_crud (tx_id, op, table_name, row_id, data) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(tx_id)
    .bind(op.as_str())
    .bind(kind.table_name())
    .bind(id)
    .bind(data)
    .execute(conn)
    .await?;
    Ok(())
}

/// Apply one write, queueing CRUD entries when `tx_id` is set. Returns the
/// number of rows changed.
async fn apply_write(
    conn: &mut SqliteConnection,
    write: &LocalWrite,
    tx_id: Option<i64>,
) -> ClientResult<u64> {
    match write {
        LocalWrite::Put { kind, row } => {
            let id = match row.get("id") {
                Some(Value::String(id)) if !id.is_empty() => id.clone(),
                _ => {
                    return Err(CoreError::Validation(format!(
                        "{} row requires a string id",
                        kind.label()
                    ))
                    .into())
                }
            };
            for column in row.keys().filter(|c| c.as_str() != "id") {
                check_column(*kind, column)?;
            }

            let placeholders = vec!["?"; kind.columns().len() + 1].join(", ");
            let query = format!(
                "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
                kind.table_name(),
                select_list(*kind)
            );
            let mut statement = sqlx::query(&query).bind(&id);
            for &column in kind.columns() {
                statement = statement.bind(column_text(row.get(column)));
            }
            statement.execute(&mut *conn).await?;

            if let Some(tx_id) = tx_id {
                let stored = stored_row(*kind, &id, row);
                enqueue(conn, tx_id, UpdateType::Put, *kind, &id, Some(&stored)).await?;
            }
            Ok(1)
        }

        LocalWrite::Patch { kind, id, changes } => {
            let columns: Vec<&String> = changes.keys().filter(|c| c.as_str() != "id").collect();
            if columns.is_empty() {
                return Ok(0);
            }
            for column in &columns {
                check_column(*kind, column)?;
            }

            let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
            let query = format!(
                "UPDATE {} SET {} WHERE id = ?",
                kind.table_name(),
                assignments.join(", ")
            );
            let mut statement = sqlx::query(&query);
            for column in &columns {
                statement = statement.bind(column_text(changes.get(column.as_str())));
            }
            let updated = statement.bind(id).execute(&mut *conn).await?.rows_affected();
            if updated == 0 {
                return Ok(0);
            }

            if let Some(tx_id) = tx_id {
                let full = fetch_row(conn, *kind, id).await?;
                enqueue(conn, tx_id, UpdateType::Patch, *kind, id, full.as_ref()).await?;
            }
            Ok(updated)
        }

        LocalWrite::Delete { kind, id } => delete_by_id(conn, *kind, id, tx_id).await,

        LocalWrite::DeleteWhere { kind, filter } => {
            if filter.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Refusing to delete every row of {kind} without a filter"
                ))
                .into());
            }
            for (column, _) in filter {
                check_column(*kind, column)?;
            }

            let conditions: Vec<String> = filter.iter().map(|(c, _)| format!("{c} = ?")).collect();
            let query = format!(
                "SELECT id FROM {} WHERE {}",
                kind.table_name(),
                conditions.join(" AND ")
            );
            let mut statement = sqlx::query_scalar::<_, String>(&query);
            for (_, value) in filter {
                statement = statement.bind(value);
            }
            let ids = statement.fetch_all(&mut *conn).await?;

            let mut removed = 0;
            for id in &ids {
                removed += delete_by_id(conn, *kind, id, tx_id).await?;
            }
            Ok(removed)
        }
    }
}

async fn delete_by_id(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: &str,
    tx_id: Option<i64>,
) -> ClientResult<u64> {
    let query = format!("DELETE FROM {} WHERE id = ?", kind.table_name());
    let removed = sqlx::query(&query)
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if removed > 0 {
        if let Some(tx_id) = tx_id {
            enqueue(conn, tx_id, UpdateType::Delete, kind, id, None).await?;
        }
    }
    Ok(removed)
}

/// The row exactly as a PUT stored it: every column present, text or null.
fn stored_row(kind: EntityKind, id: &str, row: &LocalRow) -> LocalRow {
    let mut stored = Map::new();
    stored.insert("id".to_string(), Value::String(id.to_string()));
    for &column in kind.columns() {
        stored.insert(
            column.to_string(),
            column_text(row.get(column)).map_or(Value::Null, Value::String),
        );
    }
    stored
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::error::ClientError;

    fn role_row(id: &str, name: &str, created_at: &str) -> LocalRow {
        json!({
            "id": id,
            "name": name,
            "description": null,
            "created_at": created_at,
            "updated_at": created_at,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn changes(value: Value) -> LocalRow {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn from_config_opens_the_configured_database() {
        let config = ClientConfig {
            local_db_url: "sqlite::memory:".into(),
            ..ClientConfig::default()
        };
        let store = LocalStore::from_config(&config).await.unwrap();

        store
            .put(EntityKind::Role, role_row("r1", "admin", "2024-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        assert_eq!(store.get_all(EntityKind::Role).await.unwrap().len(), 1);
        assert!(store.has_pending().await.unwrap());
    }

    #[tokio::test]
    async fn put_queues_one_transaction_with_full_row() {
        let store = LocalStore::in_memory().await.unwrap();
        store
            .put(EntityKind::Role, role_row("r1", "Admin", "2026-03-01T10:00:00.000Z"))
            .await
            .unwrap();

        let tx = store.next_crud_transaction().await.unwrap().unwrap();
        assert_eq!(tx.crud.len(), 1);
        let entry = &tx.crud[0];
        assert_eq!(entry.op, UpdateType::Put);
        assert_eq!(entry.table, "roles");
        assert_eq!(entry.id, "r1");

        let data = entry.data.as_ref().unwrap();
        assert_eq!(data["name"], "Admin");
        assert_eq!(data["description"], Value::Null);
        assert!(data.get("id").is_none());
    }

    #[tokio::test]
    async fn rows_are_listed_newest_first() {
        let store = LocalStore::in_memory().await.unwrap();
        store
            .put(EntityKind::Role, role_row("old", "Old", "2026-03-01T10:00:00.000Z"))
            .await
            .unwrap();
        store
            .put(EntityKind::Role, role_row("new", "New", "2026-03-02T10:00:00.000Z"))
            .await
            .unwrap();

        let rows = store.get_all(EntityKind::Role).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["new", "old"]);
    }

    #[tokio::test]
    async fn patch_records_the_full_updated_row() {
        let store = LocalStore::in_memory().await.unwrap();
        store
            .put(EntityKind::Role, role_row("r1", "Admin", "2026-03-01T10:00:00.000Z"))
            .await
            .unwrap();
        let first = store.next_crud_transaction().await.unwrap().unwrap();
        store.complete(&first).await.unwrap();

        let row = store
            .patch(EntityKind::Role, "r1", changes(json!({"name": "Owner"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["name"], "Owner");

        let tx = store.next_crud_transaction().await.unwrap().unwrap();
        assert_eq!(tx.crud[0].op, UpdateType::Patch);
        let data = tx.crud[0].data.as_ref().unwrap();
        assert_eq!(data["name"], "Owner");
        assert_eq!(data["created_at"], "2026-03-01T10:00:00.000Z");
    }

    #[tokio::test]
    async fn patch_of_missing_row_queues_nothing() {
        let store = LocalStore::in_memory().await.unwrap();
        let row = store
            .patch(EntityKind::User, "ghost", changes(json!({"name": "Nobody"})))
            .await
            .unwrap();

        assert!(row.is_none());
        assert!(!store.has_pending().await.unwrap());
    }

    #[tokio::test]
    async fn write_batch_is_one_transaction_in_order() {
        let store = LocalStore::in_memory().await.unwrap();
        store
            .write_batch(vec![
                LocalWrite::Put {
                    kind: EntityKind::Role,
                    row: role_row("r1", "Admin", "2026-03-01T10:00:00.000Z"),
                },
                LocalWrite::Delete {
                    kind: EntityKind::Role,
                    id: "r1".into(),
                },
            ])
            .await
            .unwrap();

        let tx = store.next_crud_transaction().await.unwrap().unwrap();
        let ops: Vec<_> = tx.crud.iter().map(|e| e.op.clone()).collect();
        assert_eq!(ops, [UpdateType::Put, UpdateType::Delete]);

        store.complete(&tx).await.unwrap();
        assert!(store.next_crud_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transactions_drain_oldest_first() {
        let store = LocalStore::in_memory().await.unwrap();
        store
            .put(EntityKind::Role, role_row("r1", "A", "2026-03-01T10:00:00.000Z"))
            .await
            .unwrap();
        store
            .put(EntityKind::Role, role_row("r2", "B", "2026-03-01T10:00:01.000Z"))
            .await
            .unwrap();

        let first = store.next_crud_transaction().await.unwrap().unwrap();
        assert_eq!(first.crud[0].id, "r1");
        store.complete(&first).await.unwrap();

        let second = store.next_crud_transaction().await.unwrap().unwrap();
        assert_eq!(second.crud[0].id, "r2");
        assert!(second.tx_id > first.tx_id);
    }

    #[tokio::test]
    async fn delete_where_removes_matching_links() {
        let store = LocalStore::in_memory().await.unwrap();
        store
            .put(
                EntityKind::RolePermission,
                changes(json!({"id": "rp1", "role_id": "r1", "permission_id": "p1", "created_at": "t"})),
            )
            .await
            .unwrap();

        let removed = store
            .delete_where(
                EntityKind::RolePermission,
                vec![
                    ("role_id".into(), "r1".into()),
                    ("permission_id".into(), "p1".into()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_all(EntityKind::RolePermission).await.unwrap().is_empty());
        assert_eq!(store.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_columns_are_rejected() {
        let store = LocalStore::in_memory().await.unwrap();
        let result = store
            .delete_where(EntityKind::Role, vec![("1=1; --".into(), "x".into())])
            .await;
        assert_matches!(result, Err(ClientError::Core(CoreError::Validation(_))));

        let result = store.delete_where(EntityKind::Role, Vec::new()).await;
        assert_matches!(result, Err(ClientError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn remote_writes_are_not_queued() {
        let store = LocalStore::in_memory().await.unwrap();
        let mut updates = store.subscribe();

        store
            .apply_remote(vec![LocalWrite::Put {
                kind: EntityKind::Role,
                row: role_row("r1", "Admin", "2026-03-01T10:00:00.000Z"),
            }])
            .await
            .unwrap();

        assert_eq!(store.get_all(EntityKind::Role).await.unwrap().len(), 1);
        assert!(!store.has_pending().await.unwrap());

        let update = updates.recv().await.unwrap();
        assert_eq!(update.origin, WriteOrigin::Remote);
        assert_eq!(update.tables, [EntityKind::Role]);
    }

    #[tokio::test]
    async fn watch_table_follows_changes() {
        let store = LocalStore::in_memory().await.unwrap();
        let mut roles = store.watch_table(EntityKind::Role).await.unwrap();
        assert!(roles.borrow().is_empty());

        store
            .put(EntityKind::Role, role_row("r1", "Admin", "2026-03-01T10:00:00.000Z"))
            .await
            .unwrap();

        roles.changed().await.unwrap();
        assert_eq!(roles.borrow_and_update().len(), 1);

        store.delete(EntityKind::Role, "r1").await.unwrap();
        roles.changed().await.unwrap();
        assert!(roles.borrow().is_empty());
    }
}
