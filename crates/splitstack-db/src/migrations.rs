//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied on [`Database::new`](crate::Database::new).
//!
//! ```text
//! 001_initial_schema.sql
//!   stacks         id → stack document (JSON), name/date/share_id for listing
//!   shared_stacks  share_id → snapshot (JSON)
//! ```
//!
//! Applied files are recorded with their checksum in `_sqlx_migrations`;
//! editing one after release makes every existing database refuse to open.
//! Schema changes go in a new numbered file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let known = MIGRATOR.migrations.len();
    debug!(known, "Applying schema migrations");

    MIGRATOR.run(pool).await?;

    info!(known, "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((
        MIGRATOR.migrations.len(),
        usize::try_from(applied).unwrap_or_default(),
    ))
}
