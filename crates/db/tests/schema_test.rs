use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    rbac_sync_db::health_check(&pool).await.unwrap();

    for table in ["users", "roles", "permissions", "role_permissions"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Every id and timestamp column is plain text.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_id_and_timestamp_columns_are_text(pool: PgPool) {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT table_name::text, column_name::text, data_type::text
         FROM information_schema.columns
         WHERE table_schema = 'public'
           AND table_name IN ('users', 'roles', 'permissions', 'role_permissions')
           AND (column_name IN ('id', 'role_id', 'permission_id')
                OR column_name LIKE '%_at')",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, column, data_type) in rows {
        assert_eq!(data_type, "text", "{table}.{column} should be text");
    }
}

/// No foreign keys anywhere, so dangling references are accepted.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_schema_has_no_foreign_keys(pool: PgPool) {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM information_schema.table_constraints
         WHERE constraint_type = 'FOREIGN KEY' AND table_schema = 'public'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count.0, 0);
}
