//! DDL of the embedded store.
//!
//! The four RBAC tables mirror the server schema with every column typed
//! `TEXT`. Two internal tables back the upload queue: `ps_crud` holds one
//! row per queued mutation, and `ps_tx` hands out transaction ids.

use rbac_sync_core::entities::EntityKind;
use sqlx::SqlitePool;

pub const CRUD_TABLE: &str = "ps_crud";

const CREATE_CRUD_TABLE: &str = "CREATE TABLE IF NOT EXISTS ps_crud (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    tx_id INTEGER NOT NULL,
    op TEXT NOT NULL,
    table_name TEXT NOT NULL,
    row_id TEXT NOT NULL,
    data TEXT
)";

const CREATE_TX_TABLE: &str = "CREATE TABLE IF NOT EXISTS ps_tx (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    next_tx INTEGER NOT NULL
)";

const SEED_TX_TABLE: &str = "INSERT OR IGNORE INTO ps_tx (id, next_tx) VALUES (1, 1)";

/// `CREATE TABLE` statement for one entity table.
pub fn create_table_sql(kind: EntityKind) -> String {
    let columns: Vec<String> = kind
        .columns()
        .iter()
        .map(|column| format!("{column} TEXT"))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY NOT NULL, {})",
        kind.table_name(),
        columns.join(", ")
    )
}

/// Create every table the store needs. Safe to run on an existing database.
pub async fn bootstrap(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for kind in EntityKind::ALL {
        sqlx::query(&create_table_sql(kind)).execute(&mut *tx).await?;
    }
    sqlx::query(CREATE_CRUD_TABLE).execute(&mut *tx).await?;
    sqlx::query(CREATE_TX_TABLE).execute(&mut *tx).await?;
    sqlx::query(SEED_TX_TABLE).execute(&mut *tx).await?;
    tx.commit().await
}
