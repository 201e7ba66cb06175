//! # Share Store
//!
//! The sharing boundary: an opaque key-value store from [`ShareId`] to
//! [`ShareSnapshot`], plus the publish / open workflow on top of it.
//!
//! ```text
//!   publish_stack(store, &mut stack, now)
//!        │
//!        ├── stack.prepare_share(now)   reuse or assign id, completed only
//!        ├── store.set(id, snapshot)
//!        └── returns id                 caller saves the stack (id is kept)
//!
//!   open_shared(store, id, roster)
//!        │
//!        ├── store.get(id)              None → NotFound
//!        ├── snapshot.normalize(roster)
//!        └── snapshot.validate()        bad amounts → Core(Validation)
//! ```
//!
//! Implementations: [`ShareRepository`] (SQLite) and [`MemoryShareStore`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::share::ShareRepository;
use splitstack_core::{Roster, ShareId, ShareSnapshot, Stack};

/// Key-value storage for share snapshots.
pub trait ShareStore: Send + Sync {
    /// Snapshot stored under `id`, if any.
    fn get(&self, id: &ShareId) -> impl Future<Output = DbResult<Option<ShareSnapshot>>> + Send;

    /// Stores `snapshot` under `id`, replacing any earlier value.
    fn set(&self, id: &ShareId, snapshot: &ShareSnapshot) -> impl Future<Output = DbResult<()>> + Send;
}

impl ShareStore for ShareRepository {
    async fn get(&self, id: &ShareId) -> DbResult<Option<ShareSnapshot>> {
        ShareRepository::get(self, id).await
    }

    async fn set(&self, id: &ShareId, snapshot: &ShareSnapshot) -> DbResult<()> {
        ShareRepository::set(self, id, snapshot).await
    }
}

/// In-process store, for tests and offline previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    entries: Arc<RwLock<HashMap<ShareId, ShareSnapshot>>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl ShareStore for MemoryShareStore {
    async fn get(&self, id: &ShareId) -> DbResult<Option<ShareSnapshot>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn set(&self, id: &ShareId, snapshot: &ShareSnapshot) -> DbResult<()> {
        self.entries.write().await.insert(id.clone(), snapshot.clone());
        Ok(())
    }
}

// =============================================================================
// Workflow
// =============================================================================

/// Publishes the stack's completed receipts and returns the share id.
///
/// The id is recorded on `stack`; persist the stack afterwards so the
/// next publish updates the same link.
///
/// ## Errors
/// - `Core(NothingToShare)` when no receipt is completed; nothing is written
pub async fn publish_stack<S: ShareStore>(
    store: &S,
    stack: &mut Stack,
    now: DateTime<Utc>,
) -> DbResult<ShareId> {
    let (share_id, snapshot) = stack.prepare_share(now)?;
    store.set(&share_id, &snapshot).await?;

    info!(
        share_id = %share_id,
        stack_id = %stack.id(),
        receipts = snapshot.receipts.len(),
        "Published stack"
    );
    Ok(share_id)
}

/// Loads a shared snapshot for read-only viewing.
///
/// ## Errors
/// - `NotFound` when nothing was published under `id`
/// - `Core` when the stored receipts break the document invariants
pub async fn open_shared<S: ShareStore>(
    store: &S,
    id: &ShareId,
    roster: &Roster,
) -> DbResult<ShareSnapshot> {
    let mut snapshot = store
        .get(id)
        .await?
        .ok_or_else(|| DbError::not_found("Shared stack", id.as_str()))?;
    snapshot.normalize(roster);
    snapshot.validate()?;
    Ok(snapshot)
}

// =============================================================================
// Unit Tests
// =============================================================================
