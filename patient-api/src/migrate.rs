//! Startup migrations
//!
//! All migration scripts are idempotent (`CREATE TABLE IF NOT EXISTS`,
//! `CREATE OR REPLACE FUNCTION`), so the runner simply executes every file in
//! order on every boot. No version bookkeeping table is needed.

use crate::error::ApiResult;
use deadpool_postgres::Pool;

/// Embedded migration scripts, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[
    ("0001_schema.sql", include_str!("../migrations/0001_schema.sql")),
    (
        "0002_search_rpc.sql",
        include_str!("../migrations/0002_search_rpc.sql"),
    ),
    (
        "0003_message_source.sql",
        include_str!("../migrations/0003_message_source.sql"),
    ),
];

/// Run all migrations against the given pool.
pub async fn run_migrations(pool: &Pool) -> ApiResult<()> {
    let conn = pool.get().await?;

    for (name, sql) in MIGRATIONS {
        tracing::info!(migration = name, "applying migration");
        conn.batch_execute(sql).await?;
    }

    tracing::info!(count = MIGRATIONS.len(), "migrations applied");
    Ok(())
}
