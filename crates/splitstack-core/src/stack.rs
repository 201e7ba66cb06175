//! # Stack Aggregate
//!
//! A hangout: a named, dated group of receipts. Stacks are the unit of
//! persistence and of sharing.
//!
//! ```text
//! Stack "Lisbon trip" (2024-06-01)
//! ├── Receipt 0  ✓ completed  ─┐
//! ├── Receipt 1  ✓ completed  ─┼──► summary(roster) ──► BalanceSummary
//! ├── Receipt 2  ✎ draft       │    (drafts ignored)
//! └── share_id: Some("K7Q2ZD") ─┴──► prepare_share() ──► ShareSnapshot
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::balance::{summarize, BalanceSummary};
use crate::error::{CoreError, CoreResult};
use crate::receipt::Receipt;
use crate::share::{ShareId, ShareSnapshot};
use crate::types::Roster;
use crate::validation::{validate_stack_name, ValidationResult};

/// An ordered sequence of receipts with a name, a date and an optional
/// share link. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Stack {
    id: String,
    name: String,
    #[ts(as = "String")]
    date: NaiveDate,
    #[serde(default)]
    receipts: Vec<Receipt>,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    share_id: Option<ShareId>,
}

impl Stack {
    /// Creates a stack holding one empty receipt.
    pub fn new(name: &str, date: NaiveDate, roster: &Roster, now: DateTime<Utc>) -> ValidationResult<Self> {
        validate_stack_name(name)?;

        Ok(Stack {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            date,
            receipts: vec![Receipt::new(roster, now)],
            created_at: now,
            share_id: None,
        })
    }

    /// Creates a stack around receipts converted from elsewhere. An empty
    /// list gets one blank receipt.
    pub fn from_receipts(
        name: &str,
        date: NaiveDate,
        receipts: Vec<Receipt>,
        roster: &Roster,
        now: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        let mut stack = Stack::new(name, date, roster, now)?;
        if !receipts.is_empty() {
            stack.receipts = receipts;
        }
        Ok(stack)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn share_id(&self) -> Option<&ShareId> {
        self.share_id.as_ref()
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn rename(&mut self, name: &str) -> ValidationResult<()> {
        validate_stack_name(name)?;
        self.name = name.trim().to_string();
        Ok(())
    }

    // =========================================================================
    // Receipts
    // =========================================================================

    /// Appends an empty receipt and returns its index.
    pub fn add_receipt(&mut self, roster: &Roster, now: DateTime<Utc>) -> usize {
        self.receipts.push(Receipt::new(roster, now));
        self.receipts.len() - 1
    }

    pub fn receipt(&self, index: usize) -> CoreResult<&Receipt> {
        self.receipts
            .get(index)
            .ok_or(CoreError::ReceiptNotFound(index))
    }

    pub fn receipt_mut(&mut self, index: usize) -> CoreResult<&mut Receipt> {
        self.receipts
            .get_mut(index)
            .ok_or(CoreError::ReceiptNotFound(index))
    }

    /// Removes a receipt. The last remaining receipt cannot be deleted.
    pub fn delete_receipt(&mut self, index: usize) -> CoreResult<Receipt> {
        if index >= self.receipts.len() {
            return Err(CoreError::ReceiptNotFound(index));
        }
        if self.receipts.len() == 1 {
            return Err(CoreError::LastReceipt);
        }
        Ok(self.receipts.remove(index))
    }

    pub fn completed_receipts(&self) -> impl Iterator<Item = &Receipt> {
        self.receipts.iter().filter(|r| r.is_completed())
    }

    pub fn completed_count(&self) -> usize {
        self.completed_receipts().count()
    }

    /// Balances across the completed receipts, `None` if there are none.
    pub fn summary(&self, roster: &Roster) -> CoreResult<Option<BalanceSummary>> {
        summarize(&self.receipts, roster)
    }

    // =========================================================================
    // Sharing
    // =========================================================================

    /// Builds the snapshot for a share link.
    ///
    /// The stack's existing share id is reused; otherwise a new one is
    /// generated and kept on the stack so later shares update the same link.
    ///
    /// ## Errors
    /// - `NothingToShare` when no receipt is completed
    pub fn prepare_share(&mut self, now: DateTime<Utc>) -> CoreResult<(ShareId, ShareSnapshot)> {
        let receipts: Vec<Receipt> = self.completed_receipts().cloned().collect();
        if receipts.is_empty() {
            return Err(CoreError::NothingToShare);
        }

        let share_id = self.share_id.get_or_insert_with(ShareId::generate).clone();
        let snapshot = ShareSnapshot {
            stack_name: self.name.clone(),
            stack_date: self.date,
            receipts,
            shared_at: now,
        };
        Ok((share_id, snapshot))
    }

    // =========================================================================
    // Backward Compatibility
    // =========================================================================

    /// Restores invariants on a stack loaded from storage: at least one
    /// receipt, every receipt normalized against `roster`.
    pub fn normalize(&mut self, roster: &Roster, now: DateTime<Utc>) {
        if self.receipts.is_empty() {
            self.receipts.push(Receipt::new(roster, now));
        }
        for receipt in &mut self.receipts {
            receipt.normalize(roster);
        }
    }

    /// Checks a stack that was deserialized rather than built through the
    /// editing methods. Run after [`normalize`](Self::normalize).
    pub fn validate(&self) -> CoreResult<()> {
        validate_stack_name(&self.name)?;
        self.receipts.iter().try_for_each(Receipt::validate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
