//! # Stack Repository
//!
//! Stores each stack as one JSON document.
//!
//! ## Save / Load
//! ```text
//! save(&stack)                           get(id, &roster)
//!     │                                      │
//!     ▼                                      ▼
//! serde_json::to_string(stack)          SELECT document FROM stacks
//!     │                                      │
//!     ▼                                      ▼
//! INSERT … ON CONFLICT(id) DO UPDATE    serde_json::from_str::<Stack>
//!   (last write wins)                        │
//!                                            ▼
//!                                       stack.normalize(roster)
//!                                         (older documents get defaults)
//!                                            │
//!                                            ▼
//!                                       stack.validate()
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use splitstack_core::{Roster, ShareId, Stack};

/// Listing row: what `list()` shows without decoding documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StackListing {
    pub id: String,
    pub name: String,
    pub stack_date: NaiveDate,
    pub share_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct DocumentRow {
    document: String,
}

/// Repository for stack documents.
#[derive(Debug, Clone)]
pub struct StackRepository {
    pool: SqlitePool,
}

impl StackRepository {
    /// Creates a new StackRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StackRepository { pool }
    }

    /// Inserts or replaces a stack document.
    pub async fn save(&self, stack: &Stack) -> DbResult<()> {
        let document = serde_json::to_string(stack)?;
        let now = Utc::now();

        debug!(stack_id = %stack.id(), receipts = stack.receipts().len(), "Saving stack");

        sqlx::query(
            r#"
            INSERT INTO stacks (id, name, stack_date, share_id, document, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                stack_date = excluded.stack_date,
                share_id = excluded.share_id,
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(stack.id())
        .bind(stack.name())
        .bind(stack.date())
        .bind(stack.share_id().map(ShareId::as_str))
        .bind(&document)
        .bind(stack.created_at())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads a stack, restoring defaults for fields older documents lack.
    pub async fn find(&self, id: &str, roster: &Roster) -> DbResult<Option<Stack>> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT document FROM stacks WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode(&row.document, roster)).transpose()
    }

    /// Like [`find`](Self::find), but a missing stack is an error.
    pub async fn get(&self, id: &str, roster: &Roster) -> DbResult<Stack> {
        self.find(id, roster)
            .await?
            .ok_or_else(|| DbError::not_found("Stack", id))
    }

    /// Finds the local stack that owns a share link, if it was published
    /// from this database.
    pub async fn find_by_share_id(&self, share_id: &ShareId, roster: &Roster) -> DbResult<Option<Stack>> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT document FROM stacks WHERE share_id = ?1 LIMIT 1")
                .bind(share_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|row| decode(&row.document, roster)).transpose()
    }

    /// All stacks, newest date first.
    pub async fn list(&self) -> DbResult<Vec<StackListing>> {
        let listings = sqlx::query_as::<_, StackListing>(
            r#"
            SELECT id, name, stack_date, share_id, updated_at
            FROM stacks
            ORDER BY stack_date DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    /// Deletes a stack. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM stacks WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(stack_id = %id, deleted = result.rows_affected(), "Deleted stack");
        Ok(result.rows_affected() > 0)
    }
}

fn decode(document: &str, roster: &Roster) -> DbResult<Stack> {
    let mut stack: Stack = serde_json::from_str(document)?;
    stack.normalize(roster, Utc::now());
    stack.validate()?;
    Ok(stack)
}

// =============================================================================
// Unit Tests
// =============================================================================
