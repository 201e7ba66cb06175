//! # Repository Module
//!
//! Database repository implementations for SplitStack.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.stacks().get(id, &roster)                                  │
//! │       ▼                                                                 │
//! │  StackRepository                     ShareRepository                   │
//! │  ├── save(&stack)   (upsert)         ├── get(&share_id)                │
//! │  ├── find / get                      └── set(&share_id, &snapshot)     │
//! │  ├── find_by_share_id                                                  │
//! │  ├── list()                                                            │
//! │  └── delete(id)                                                        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StackRepository`](stack::StackRepository) - Stack documents
//! - [`ShareRepository`](share::ShareRepository) - Share snapshots

pub mod share;
pub mod stack;
