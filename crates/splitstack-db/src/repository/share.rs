//! # Share Repository
//!
//! SQLite-backed key-value store for share snapshots
//! (`shared_stacks`: share_id → snapshot JSON).

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use splitstack_core::{ShareId, ShareSnapshot};

#[derive(FromRow)]
struct SnapshotRow {
    snapshot: String,
}

/// Repository for published share snapshots.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: SqlitePool,
}

impl ShareRepository {
    /// Creates a new ShareRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShareRepository { pool }
    }

    /// Reads the snapshot stored under `id`, if any.
    pub async fn get(&self, id: &ShareId) -> DbResult<Option<ShareSnapshot>> {
        let row: Option<SnapshotRow> =
            sqlx::query_as("SELECT snapshot FROM shared_stacks WHERE share_id = ?1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row
            .map(|row| serde_json::from_str(&row.snapshot))
            .transpose()?)
    }

    /// Stores `snapshot` under `id`, replacing any earlier one.
    pub async fn set(&self, id: &ShareId, snapshot: &ShareSnapshot) -> DbResult<()> {
        let json = serde_json::to_string(snapshot)?;

        debug!(share_id = %id, receipts = snapshot.receipts.len(), "Storing share snapshot");

        sqlx::query(
            r#"
            INSERT INTO shared_stacks (share_id, snapshot, shared_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(share_id) DO UPDATE SET
                snapshot = excluded.snapshot,
                shared_at = excluded.shared_at
            "#,
        )
        .bind(id.as_str())
        .bind(&json)
        .bind(snapshot.shared_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
