//! # splitstack-db: Database Layer for SplitStack
//!
//! Persists stack documents and share snapshots in SQLite via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SplitStack Data Flow                             │
//! │                                                                         │
//! │  CLI command (balances <stack-id>)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   splitstack-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ StackRepo     │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ ShareRepo     │    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │                        ShareStore trait ◄── MemoryShareStore   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/splitstack.db                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Stack and share repositories
//! - [`share_store`] - Share key-value boundary and publish/open workflow
//!
//! ## Usage
//!
//! ```rust,ignore
//! use splitstack_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/splitstack.db")).await?;
//!
//! let mut stack = db.stacks().get(&stack_id, &roster).await?;
//! let share_id = splitstack_db::publish_stack(&db.shares(), &mut stack, Utc::now()).await?;
//! db.stacks().save(&stack).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod share_store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::share::ShareRepository;
pub use repository::stack::{StackListing, StackRepository};
pub use share_store::{open_shared, publish_stack, MemoryShareStore, ShareStore};
