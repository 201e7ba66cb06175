//! # Database Errors
//!
//! ```text
//! sqlx::Error ─────────┐
//! MigrateError ────────┤
//! serde_json::Error ───┼──► DbError ──► CliError ──► "Error: …"
//! CoreError ───────────┘
//! ```
//!
//! Lock contention (pool timeout, `SQLITE_BUSY`) is reported as
//! [`DbError::Busy`] so callers can tell "try again" apart from a broken
//! query.

use splitstack_core::CoreError;
use thiserror::Error;

/// SQLite primary result code for `SQLITE_BUSY`.
const SQLITE_BUSY: &str = "5";

#[derive(Debug, Error)]
pub enum DbError {
    /// No stack with that id, or a share id that was never published.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The database file could not be created or opened.
    #[error("Could not open database: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Another process holds the write lock, or every pooled connection is in use.
    #[error("Database is busy, try again")]
    Busy,

    #[error("Query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A stored stack or snapshot does not match the current document shape.
    #[error("Invalid stored document: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::Connection("connection pool is closed".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(SQLITE_BUSY) => DbError::Busy,
            other => DbError::Query(other),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_busy() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::Busy));
    }

    #[test]
    fn test_other_sqlx_errors_keep_their_source() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Query(sqlx::Error::RowNotFound)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err: DbError = CoreError::NothingToShare.into();
        assert_eq!(err.to_string(), CoreError::NothingToShare.to_string());
    }

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Stack", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Stack not found: abc");
    }
}
