//! Persistence layer for the RBAC sync server.
//!
//! Owns the PostgreSQL connection pool lifecycle (construction, health
//! check, migrations, teardown), the row models, one repository per entity
//! and [`persistence::apply_mutation`], which applies a single decoded sync
//! mutation.

pub mod config;
pub mod models;
pub mod persistence;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub use config::{DbConfig, DbConfigError};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from explicit configuration.
///
/// The pool is created once by the server's startup routine and handed to
/// everything that needs it; nothing in this crate holds a global pool.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    let options = config.connect_options()?;
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Close every connection in the pool. Waits for checked-out connections to
/// be returned first.
pub async fn close_pool(pool: &DbPool) {
    pool.close().await;
    tracing::info!("Database connection pool closed");
}
