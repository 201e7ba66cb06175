//! # Connection Setup
//!
//! ```text
//! SplitConfig ──► DbConfig::new(path).max_connections(n)
//!                     │
//!                     ▼
//!              Database::new(config)
//!                 ├── mkdir -p <parent>
//!                 ├── SQLite: WAL, synchronous=NORMAL, foreign_keys, busy_timeout
//!                 ├── SqlitePool
//!                 └── migrations (unless disabled)
//!                     │
//!          ┌──────────┴──────────┐
//!          ▼                     ▼
//!     db.stacks()           db.shares()
//!   StackRepository       ShareRepository
//! ```
//!
//! A CLI invocation is short-lived, but two can overlap (`share` in one
//! terminal, `list` in another). WAL lets the reader proceed while the
//! writer commits, and the busy timeout makes a second writer wait instead
//! of failing with `SQLITE_BUSY`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::share::ShareRepository;
use crate::repository::stack::StackRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// DbConfig
// =============================================================================

/// Where the database lives and how the pool behaves.
///
/// ```rust
/// use std::time::Duration;
/// use splitstack_db::DbConfig;
///
/// let config = DbConfig::new("/tmp/splitstack.db")
///     .max_connections(2)
///     .busy_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_connections, 2);
/// assert!(!config.is_in_memory());
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Pool size. Default 4.
    pub max_connections: u32,

    /// How long to wait for a free pooled connection. Default 10s.
    pub acquire_timeout: Duration,

    /// How long SQLite retries a locked database before giving up. Default 5s.
    pub busy_timeout: Duration,

    /// Apply pending migrations when connecting. Default true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed database at `path`; created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Private in-memory database, gone when the pool closes. For tests.
    pub fn in_memory() -> Self {
        // every extra connection would open a separate empty database
        DbConfig::new(IN_MEMORY).max_connections(1)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Connection(e.to_string()))?
        } else {
            if let Some(dir) = self.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| {
                    DbError::Connection(format!("cannot create {}: {e}", dir.display()))
                })?;
            }
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Pool handle. Clones share the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        debug!(path = %config.database_path.display(), "Opening database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }

        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Database ready"
        );
        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stack documents.
    pub fn stacks(&self) -> StackRepository {
        StackRepository::new(self.pool.clone())
    }

    /// Published share snapshots.
    pub fn shares(&self) -> ShareRepository {
        ShareRepository::new(self.pool.clone())
    }

    /// Waits for open connections to finish and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database closed");
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let (embedded, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(embedded, applied);
        assert!(embedded >= 1);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();

        let (embedded, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(embedded, applied);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("splitstack-db-{}", std::process::id()));
        let path = dir.join("nested").join("splitstack.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        db.close().await;

        assert!(path.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/splitstack.db")
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(1))
            .run_migrations(false);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(!config.run_migrations);

        let memory = DbConfig::in_memory();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
    }
}
