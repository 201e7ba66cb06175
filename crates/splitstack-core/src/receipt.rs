//! # Receipt Aggregate
//!
//! A single itemized bill and its editing lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Receipt Lifecycle                                │
//! │                                                                         │
//! │  Receipt::new(roster)          all roster members active, no items     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DRAFT ◄──────────────────────────────────────────┐                    │
//! │   • add/remove individual + shared items          │                    │
//! │   • toggle participants (≥1 stays active)         │ reopen()           │
//! │   • set subject / taxes / tip / payer             │                    │
//! │       │                                           │                    │
//! │       │ finalize() ── compute_split() ── ✗ MissingFields                │
//! │       ▼                                           │                    │
//! │  COMPLETED ───────────────────────────────────────┘                    │
//! │   • splits frozen, edits rejected                                       │
//! │   • mark_settled() tracks who has paid the payer                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived Totals
//! `subtotal()` and `total()` are computed from the items every time they
//! are read. They are never stored, so they cannot drift. Both use checked
//! addition and report `AmountOverflow` rather than wrapping.
//!
//! Every mutating method checks all of its preconditions before touching
//! any field, so a rejected call leaves the receipt exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::split::{compute_split, Splits};
use crate::types::{LineItem, Participant, Roster, SharedLineItem};
use crate::validation::{validate_item_price, validate_split, validate_subject, validate_surcharge};
use crate::SETTLEMENT_EPSILON;

// =============================================================================
// Receipt
// =============================================================================

/// One receipt within a stack.
///
/// Amounts are integer cents. Deserialization is lenient about fields
/// older SplitStack documents lack; call [`Receipt::normalize`] and then
/// [`Receipt::validate`] after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub(crate) id: String,

    #[serde(default)]
    pub(crate) subject: String,

    /// Roster-ordered, never empty once normalized.
    #[serde(default)]
    pub(crate) active_participants: Vec<Participant>,

    #[serde(default)]
    pub(crate) individual_items: BTreeMap<Participant, Vec<LineItem>>,

    #[serde(default)]
    pub(crate) shared_items: Vec<SharedLineItem>,

    #[serde(default)]
    pub(crate) taxes: Money,

    #[serde(default)]
    pub(crate) tip: Money,

    #[serde(default)]
    pub(crate) payer: Option<Participant>,

    #[serde(default)]
    pub(crate) splits: Splits,

    #[serde(default)]
    pub(crate) is_completed: bool,

    /// Debtors who have paid the payer back.
    #[serde(default)]
    pub(crate) settled: BTreeSet<Participant>,

    #[ts(as = "String")]
    pub(crate) timestamp: DateTime<Utc>,
}

/// How many debtors on a completed receipt have paid the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentStatus {
    pub paid: usize,
    pub total: usize,
}

impl PaymentStatus {
    /// True when there was something to pay and everyone has paid.
    pub fn is_fully_paid(&self) -> bool {
        self.total > 0 && self.paid == self.total
    }
}

impl Receipt {
    /// Creates an empty draft receipt with every roster member active.
    pub fn new(roster: &Roster, now: DateTime<Utc>) -> Self {
        Receipt {
            id: Uuid::new_v4().to_string(),
            subject: String::new(),
            active_participants: roster.members().to_vec(),
            individual_items: roster.iter().map(|p| (p.clone(), Vec::new())).collect(),
            shared_items: Vec::new(),
            taxes: Money::zero(),
            tip: Money::zero(),
            payer: None,
            splits: Splits::new(),
            is_completed: false,
            settled: BTreeSet::new(),
            timestamp: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn active_participants(&self) -> &[Participant] {
        &self.active_participants
    }

    pub fn is_active(&self, participant: &Participant) -> bool {
        self.active_participants.contains(participant)
    }

    /// Items bought by `participant` (empty when they have none).
    pub fn individual_items(&self, participant: &Participant) -> &[LineItem] {
        self.individual_items
            .get(participant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn shared_items(&self) -> &[SharedLineItem] {
        &self.shared_items
    }

    pub fn taxes(&self) -> Money {
        self.taxes
    }

    pub fn tip(&self) -> Money {
        self.tip
    }

    pub fn payer(&self) -> Option<&Participant> {
        self.payer.as_ref()
    }

    /// Persisted split result; empty until the receipt is finalized.
    pub fn splits(&self) -> &Splits {
        &self.splits
    }

    /// Stored split for `participant`, zero when absent.
    pub fn split_for(&self, participant: &Participant) -> Money {
        self.splits.get(participant).copied().unwrap_or_default()
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn settled(&self) -> &BTreeSet<Participant> {
        &self.settled
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    // =========================================================================
    // Derived Totals
    // =========================================================================

    /// Sum of one participant's individual items.
    pub fn participant_total(&self, participant: &Participant) -> CoreResult<Money> {
        Money::checked_sum(self.individual_items(participant).iter().map(|i| i.price))
            .ok_or(CoreError::AmountOverflow)
    }

    /// Individual items of active participants plus every shared item.
    pub fn subtotal(&self) -> CoreResult<Money> {
        let mut subtotal = Money::checked_sum(self.shared_items.iter().map(|i| i.price))
            .ok_or(CoreError::AmountOverflow)?;
        for participant in &self.active_participants {
            subtotal = subtotal
                .checked_add(self.participant_total(participant)?)
                .ok_or(CoreError::AmountOverflow)?;
        }
        Ok(subtotal)
    }

    /// `subtotal + taxes + tip`.
    pub fn total(&self) -> CoreResult<Money> {
        Money::checked_sum([self.subtotal()?, self.taxes, self.tip]).ok_or(CoreError::AmountOverflow)
    }

    /// What the payer should get back from everyone else:
    /// `total - splits[payer]`. `None` until the receipt is completed.
    pub fn payer_receivable(&self) -> CoreResult<Option<Money>> {
        let Some(payer) = self.payer.as_ref().filter(|_| self.is_completed) else {
            return Ok(None);
        };
        self.total()?
            .checked_sub(self.split_for(payer))
            .map(Some)
            .ok_or(CoreError::AmountOverflow)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    fn ensure_editable(&self) -> CoreResult<()> {
        if self.is_completed {
            return Err(CoreError::ReceiptCompleted {
                receipt_id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn ensure_active(&self, participant: &Participant) -> CoreResult<()> {
        if !self.is_active(participant) {
            return Err(CoreError::ParticipantNotActive(participant.clone()));
        }
        Ok(())
    }

    pub fn set_subject(&mut self, subject: &str) -> CoreResult<()> {
        self.ensure_editable()?;
        validate_subject(subject)?;
        self.subject = subject.trim().to_string();
        Ok(())
    }

    pub fn set_taxes(&mut self, taxes: Money) -> CoreResult<()> {
        self.ensure_editable()?;
        validate_surcharge("taxes", taxes)?;
        self.taxes = taxes;
        Ok(())
    }

    pub fn set_tip(&mut self, tip: Money) -> CoreResult<()> {
        self.ensure_editable()?;
        validate_surcharge("tip", tip)?;
        self.tip = tip;
        Ok(())
    }

    /// Sets or clears the payer. A payer must be active.
    pub fn set_payer(&mut self, payer: Option<Participant>) -> CoreResult<()> {
        self.ensure_editable()?;
        if let Some(p) = &payer {
            self.ensure_active(p)?;
        }
        self.payer = payer;
        Ok(())
    }

    pub fn add_individual_item(&mut self, participant: &Participant, item: LineItem) -> CoreResult<()> {
        self.ensure_editable()?;
        self.ensure_active(participant)?;
        self.individual_items
            .entry(participant.clone())
            .or_default()
            .push(item);
        Ok(())
    }

    pub fn remove_individual_item(&mut self, participant: &Participant, index: usize) -> CoreResult<LineItem> {
        self.ensure_editable()?;
        match self.individual_items.get_mut(participant) {
            Some(items) if index < items.len() => Ok(items.remove(index)),
            _ => Err(CoreError::ItemNotFound {
                kind: "individual",
                index,
            }),
        }
    }

    /// Adds a shared item. Every participant of the item must be active.
    pub fn add_shared_item(&mut self, item: SharedLineItem) -> CoreResult<()> {
        self.ensure_editable()?;
        for participant in &item.participants {
            self.ensure_active(participant)?;
        }
        self.shared_items.push(item);
        Ok(())
    }

    pub fn remove_shared_item(&mut self, index: usize) -> CoreResult<SharedLineItem> {
        self.ensure_editable()?;
        if index >= self.shared_items.len() {
            return Err(CoreError::ItemNotFound {
                kind: "shared",
                index,
            });
        }
        Ok(self.shared_items.remove(index))
    }

    // =========================================================================
    // Active Participants
    // =========================================================================

    /// Adds `participant` to the active set (roster order is kept).
    /// Already-active participants are left alone.
    pub fn activate_participant(&mut self, roster: &Roster, participant: &Participant) -> CoreResult<()> {
        self.ensure_editable()?;
        roster.require(participant)?;

        if self.is_active(participant) {
            return Ok(());
        }

        self.active_participants.push(participant.clone());
        self.active_participants
            .sort_by_key(|p| roster.position(p).unwrap_or(usize::MAX));
        self.individual_items.entry(participant.clone()).or_default();
        Ok(())
    }

    /// Removes `participant` from the active set.
    ///
    /// ## Effects
    /// - Their individual items are discarded
    /// - They are stripped from every shared item; items left with nobody
    ///   are removed
    /// - If they were the payer, the payer is cleared
    ///
    /// ## Errors
    /// - `LastActiveParticipant` when they are the only active participant;
    ///   nothing is changed
    pub fn deactivate_participant(&mut self, participant: &Participant) -> CoreResult<()> {
        self.ensure_editable()?;
        self.ensure_active(participant)?;

        if self.active_participants.len() <= 1 {
            return Err(CoreError::LastActiveParticipant {
                participant: participant.clone(),
            });
        }

        self.active_participants.retain(|p| p != participant);
        self.individual_items.insert(participant.clone(), Vec::new());
        for item in &mut self.shared_items {
            item.participants.remove(participant);
        }
        self.shared_items.retain(|item| !item.participants.is_empty());
        if self.payer.as_ref() == Some(participant) {
            self.payer = None;
        }
        Ok(())
    }

    /// Flips `participant` in or out of the active set.
    ///
    /// Returns whether they are active afterwards.
    pub fn toggle_participant(&mut self, roster: &Roster, participant: &Participant) -> CoreResult<bool> {
        if self.is_active(participant) {
            self.deactivate_participant(participant)?;
            Ok(false)
        } else {
            self.activate_participant(roster, participant)?;
            Ok(true)
        }
    }

    /// Resets the form: subject, items, taxes, tip, payer and any split.
    /// The active set is kept.
    ///
    /// Unlike the editing methods this also works on a completed receipt:
    /// it is reopened the same way [`reopen`](Self::reopen) does, then
    /// emptied.
    pub fn clear(&mut self, roster: &Roster) {
        self.discard_split();
        self.subject.clear();
        self.individual_items = roster.iter().map(|p| (p.clone(), Vec::new())).collect();
        self.shared_items.clear();
        self.taxes = Money::zero();
        self.tip = Money::zero();
        self.payer = None;
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Computes and freezes the split, marking the receipt completed.
    ///
    /// ## Errors
    /// - `ReceiptCompleted` if already finalized
    /// - `Validation(MissingFields)` naming subject / payer / total
    pub fn finalize(&mut self, now: DateTime<Utc>) -> CoreResult<&Splits> {
        self.ensure_editable()?;
        let splits = compute_split(self)?;

        self.splits = splits;
        self.is_completed = true;
        self.timestamp = now;
        Ok(&self.splits)
    }

    /// Returns a completed receipt to draft, dropping its split and
    /// payment tracking.
    pub fn reopen(&mut self) -> CoreResult<()> {
        if !self.is_completed {
            return Err(CoreError::ReceiptNotCompleted {
                receipt_id: self.id.clone(),
            });
        }
        self.discard_split();
        Ok(())
    }

    fn discard_split(&mut self) {
        self.splits.clear();
        self.settled.clear();
        self.is_completed = false;
    }

    // =========================================================================
    // Payment Tracking
    // =========================================================================

    /// Participants other than the payer whose split is above the
    /// settlement threshold.
    pub fn debtors(&self) -> impl Iterator<Item = &Participant> {
        self.splits
            .iter()
            .filter(move |(p, amount)| Some(*p) != self.payer.as_ref() && **amount > SETTLEMENT_EPSILON)
            .map(|(p, _)| p)
    }

    fn ensure_debtor(&self, participant: &Participant) -> CoreResult<()> {
        if !self.is_completed {
            return Err(CoreError::ReceiptNotCompleted {
                receipt_id: self.id.clone(),
            });
        }
        if !self.debtors().any(|p| p == participant) {
            return Err(CoreError::NothingOwed(participant.clone()));
        }
        Ok(())
    }

    /// Records that `participant` has paid the payer back.
    pub fn mark_settled(&mut self, participant: &Participant) -> CoreResult<()> {
        self.ensure_debtor(participant)?;
        self.settled.insert(participant.clone());
        Ok(())
    }

    pub fn unmark_settled(&mut self, participant: &Participant) -> CoreResult<()> {
        self.ensure_debtor(participant)?;
        self.settled.remove(participant);
        Ok(())
    }

    pub fn payment_status(&self) -> PaymentStatus {
        let mut status = PaymentStatus { paid: 0, total: 0 };
        for debtor in self.debtors() {
            status.total += 1;
            if self.settled.contains(debtor) {
                status.paid += 1;
            }
        }
        status
    }

    // =========================================================================
    // Backward Compatibility
    // =========================================================================

    /// Restores invariants on a receipt loaded from an older document.
    ///
    /// - Missing active set → whole roster
    /// - Every roster member gets an item list
    /// - A blank payer (older documents store `""`) becomes no payer
    /// - On drafts, a payer who is no longer active is cleared
    pub fn normalize(&mut self, roster: &Roster) {
        if self.active_participants.is_empty() {
            self.active_participants = roster.members().to_vec();
        }
        for participant in roster.iter() {
            self.individual_items.entry(participant.clone()).or_default();
        }
        if self.payer.as_ref().is_some_and(|p| p.as_str().trim().is_empty()) {
            self.payer = None;
        }
        if !self.is_completed {
            if let Some(payer) = &self.payer {
                if !self.active_participants.contains(payer) {
                    self.payer = None;
                }
            }
        }
    }

    /// Checks a receipt that was deserialized rather than built through
    /// the editing methods.
    ///
    /// ## Errors
    /// - `Validation` for a price that is not positive, negative taxes,
    ///   tip or split, any amount above `MAX_AMOUNT`, a shared item with
    ///   no participants, or a completed receipt without a payer
    /// - `AmountOverflow` if the total does not fit
    pub fn validate(&self) -> CoreResult<()> {
        for item in self.individual_items.values().flatten() {
            validate_item_price(item.price)?;
        }
        for item in &self.shared_items {
            validate_item_price(item.price)?;
            if item.participants.is_empty() {
                return Err(ValidationError::Required {
                    field: "participants".to_string(),
                }
                .into());
            }
        }
        validate_surcharge("taxes", self.taxes)?;
        validate_surcharge("tip", self.tip)?;
        for amount in self.splits.values() {
            validate_split(*amount)?;
        }
        if self.is_completed && self.payer.is_none() {
            return Err(ValidationError::Required {
                field: "payer".to_string(),
            }
            .into());
        }
        self.total()?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn roster() -> Roster {
        Roster::new(["ana", "ben", "cleo"]).unwrap()
    }

    fn p(name: &str) -> Participant {
        Participant::new(name)
    }

    fn item(name: &str, cents: i64) -> LineItem {
        LineItem::new(name, Money::from_cents(cents)).unwrap()
    }

    fn shared(name: &str, cents: i64, who: &[&str]) -> SharedLineItem {
        SharedLineItem::new(name, Money::from_cents(cents), who.iter().map(|n| p(n))).unwrap()
    }

    fn draft() -> Receipt {
        Receipt::new(&roster(), Utc::now())
    }

    #[test]
    fn test_new_receipt_is_empty_with_everyone_active() {
        let receipt = draft();
        assert_eq!(receipt.active_participants(), roster().members());
        assert!(receipt.subtotal().unwrap().is_zero());
        assert!(receipt.total().unwrap().is_zero());
        assert!(receipt.payer().is_none());
        assert!(!receipt.is_completed());
        for participant in roster().iter() {
            assert!(receipt.individual_items(participant).is_empty());
        }
    }

    #[test]
    fn test_totals_follow_items() {
        let mut receipt = draft();
        receipt.add_individual_item(&p("ana"), item("Ramen", 1400)).unwrap();
        receipt.add_individual_item(&p("ben"), item("Udon", 1200)).unwrap();
        receipt.add_shared_item(shared("Gyoza", 900, &["ana", "ben"])).unwrap();
        receipt.set_taxes(Money::from_cents(350)).unwrap();
        receipt.set_tip(Money::from_cents(500)).unwrap();

        assert_eq!(receipt.subtotal().unwrap().cents(), 3500);
        assert_eq!(receipt.total().unwrap().cents(), 4350);

        receipt.remove_individual_item(&p("ana"), 0).unwrap();
        assert_eq!(receipt.subtotal().unwrap().cents(), 2100);
        assert_eq!(receipt.total().unwrap().cents(), 2950);
    }

    #[test]
    fn test_deactivate_strips_items_and_payer() {
        let mut receipt = draft();
        receipt.add_individual_item(&p("cleo"), item("Soda", 300)).unwrap();
        receipt.add_shared_item(shared("Fries", 600, &["ben", "cleo"])).unwrap();
        receipt.add_shared_item(shared("Cake", 800, &["cleo"])).unwrap();
        receipt.set_payer(Some(p("cleo"))).unwrap();

        receipt.deactivate_participant(&p("cleo")).unwrap();

        assert!(!receipt.is_active(&p("cleo")));
        assert!(receipt.individual_items(&p("cleo")).is_empty());
        assert_eq!(receipt.shared_items().len(), 1);
        assert_eq!(receipt.shared_items()[0].name, "Fries");
        assert!(!receipt.shared_items()[0].participants.contains(&p("cleo")));
        assert!(receipt.payer().is_none());
    }

    #[test]
    fn test_last_active_participant_cannot_be_removed() {
        let mut receipt = draft();
        receipt.deactivate_participant(&p("ben")).unwrap();
        receipt.deactivate_participant(&p("cleo")).unwrap();
        receipt.add_individual_item(&p("ana"), item("Tea", 250)).unwrap();
        let before = receipt.clone();

        let result = receipt.deactivate_participant(&p("ana"));

        assert!(matches!(
            result,
            Err(CoreError::LastActiveParticipant { .. })
        ));
        assert_eq!(receipt, before);
    }

    #[test]
    fn test_toggle_restores_roster_order() {
        let mut receipt = draft();
        assert!(!receipt.toggle_participant(&roster(), &p("ana")).unwrap());
        assert!(receipt.toggle_participant(&roster(), &p("ana")).unwrap());
        assert_eq!(receipt.active_participants(), roster().members());
    }

    #[test]
    fn test_activate_unknown_participant_is_rejected() {
        let mut receipt = draft();
        let result = receipt.activate_participant(&roster(), &p("zed"));
        assert!(matches!(result, Err(CoreError::UnknownParticipant(_))));
    }

    #[test]
    fn test_payer_must_be_active() {
        let mut receipt = draft();
        receipt.deactivate_participant(&p("ben")).unwrap();
        assert!(matches!(
            receipt.set_payer(Some(p("ben"))),
            Err(CoreError::ParticipantNotActive(_))
        ));
        receipt.set_payer(Some(p("ana"))).unwrap();
        assert_eq!(receipt.payer(), Some(&p("ana")));
    }

    #[test]
    fn test_items_for_inactive_participants_are_rejected() {
        let mut receipt = draft();
        receipt.deactivate_participant(&p("cleo")).unwrap();
        assert!(receipt.add_individual_item(&p("cleo"), item("Tea", 100)).is_err());
        assert!(receipt.add_shared_item(shared("Pie", 900, &["ana", "cleo"])).is_err());
        assert!(receipt.shared_items().is_empty());
    }

    #[test]
    fn test_remove_missing_item() {
        let mut receipt = draft();
        assert!(matches!(
            receipt.remove_shared_item(0),
            Err(CoreError::ItemNotFound { kind: "shared", index: 0 })
        ));
        assert!(matches!(
            receipt.remove_individual_item(&p("ana"), 2),
            Err(CoreError::ItemNotFound { kind: "individual", .. })
        ));
    }

    #[test]
    fn test_negative_tip_is_rejected() {
        let mut receipt = draft();
        assert!(receipt.set_tip(Money::from_cents(-100)).is_err());
        assert!(receipt.tip().is_zero());
    }

    #[test]
    fn test_finalize_requires_fields() {
        let mut receipt = draft();
        let err = receipt.finalize(Utc::now()).unwrap_err();
        match err {
            CoreError::Validation(ValidationError::MissingFields { fields }) => {
                assert_eq!(fields, ["subject", "payer", "total"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!receipt.is_completed());
    }

    #[test]
    fn test_finalize_freezes_receipt() {
        let mut receipt = draft();
        receipt.set_subject("Lunch").unwrap();
        receipt.add_individual_item(&p("ana"), item("Bowl", 1200)).unwrap();
        receipt.add_individual_item(&p("ben"), item("Wrap", 900)).unwrap();
        receipt.set_payer(Some(p("ana"))).unwrap();

        let splits = receipt.finalize(Utc::now()).unwrap().clone();
        assert_eq!(splits[&p("ana")].cents(), 1200);
        assert_eq!(splits[&p("ben")].cents(), 900);
        assert!(receipt.is_completed());
        assert_eq!(receipt.payer_receivable().unwrap(), Some(Money::from_cents(900)));

        assert!(matches!(
            receipt.add_individual_item(&p("ben"), item("Cookie", 200)),
            Err(CoreError::ReceiptCompleted { .. })
        ));
        assert!(receipt.finalize(Utc::now()).is_err());

        receipt.reopen().unwrap();
        assert!(!receipt.is_completed());
        assert!(receipt.splits().is_empty());
        assert_eq!(receipt.payer_receivable().unwrap(), None);
    }

    #[test]
    fn test_payment_tracking() {
        let mut receipt = draft();
        receipt.set_subject("Pizza").unwrap();
        receipt.add_shared_item(shared("Pizza", 3000, &["ana", "ben", "cleo"])).unwrap();
        receipt.set_payer(Some(p("ana"))).unwrap();

        assert!(matches!(
            receipt.mark_settled(&p("ben")),
            Err(CoreError::ReceiptNotCompleted { .. })
        ));

        receipt.finalize(Utc::now()).unwrap();
        assert_eq!(receipt.payment_status(), PaymentStatus { paid: 0, total: 2 });

        receipt.mark_settled(&p("ben")).unwrap();
        assert_eq!(receipt.payment_status(), PaymentStatus { paid: 1, total: 2 });
        assert!(!receipt.payment_status().is_fully_paid());

        receipt.mark_settled(&p("cleo")).unwrap();
        assert!(receipt.payment_status().is_fully_paid());

        assert!(matches!(
            receipt.mark_settled(&p("ana")),
            Err(CoreError::NothingOwed(_))
        ));

        receipt.unmark_settled(&p("cleo")).unwrap();
        assert_eq!(receipt.payment_status().paid, 1);
    }

    #[test]
    fn test_clear_keeps_active_set() {
        let mut receipt = draft();
        receipt.deactivate_participant(&p("cleo")).unwrap();
        receipt.set_subject("Brunch").unwrap();
        receipt.add_individual_item(&p("ana"), item("Eggs", 1100)).unwrap();
        receipt.set_tip(Money::from_cents(300)).unwrap();
        receipt.set_payer(Some(p("ben"))).unwrap();

        receipt.clear(&roster());

        assert_eq!(receipt.subject(), "");
        assert!(receipt.total().unwrap().is_zero());
        assert!(receipt.payer().is_none());
        assert_eq!(receipt.active_participants(), [p("ana"), p("ben")]);
    }

    #[test]
    fn test_clear_reopens_completed_receipt() {
        let mut receipt = draft();
        receipt.set_subject("Drinks").unwrap();
        receipt.add_individual_item(&p("ben"), item("Beer", 700)).unwrap();
        receipt.set_payer(Some(p("ana"))).unwrap();
        receipt.finalize(Utc::now()).unwrap();
        receipt.mark_settled(&p("ben")).unwrap();

        receipt.clear(&roster());

        assert!(!receipt.is_completed());
        assert!(receipt.splits().is_empty());
        assert!(receipt.settled().is_empty());
        assert!(matches!(receipt.reopen(), Err(CoreError::ReceiptNotCompleted { .. })));
        receipt.set_subject("Drinks again").unwrap();
        assert_eq!(receipt.subject(), "Drinks again");
    }

    #[test]
    fn test_totals_report_overflow() {
        let huge = r#"{ "name": "Yacht", "price": 9223372036854775800 }"#;
        let json = format!(
            r#"{{
                "id": "r1",
                "subject": "Marina",
                "activeParticipants": ["ana", "ben"],
                "individualItems": {{ "ana": [{huge}], "ben": [{huge}] }},
                "payer": "ana",
                "timestamp": "2024-05-01T18:30:00Z"
            }}"#
        );
        let receipt: Receipt = serde_json::from_str(&json).unwrap();

        assert!(receipt.participant_total(&p("ana")).is_ok());
        assert!(matches!(receipt.subtotal(), Err(CoreError::AmountOverflow)));
        assert!(matches!(receipt.total(), Err(CoreError::AmountOverflow)));
        assert!(matches!(crate::compute_split(&receipt), Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let json = r#"{
            "id": "1700000000000",
            "subject": "Tacos",
            "individualItems": { "ana": [{ "name": "Taco", "price": 450 }] },
            "sharedItems": [],
            "tip": 0,
            "payer": "",
            "splits": {},
            "isCompleted": false,
            "timestamp": "2024-05-01T18:30:00Z"
        }"#;

        let mut receipt: Receipt = serde_json::from_str(json).unwrap();
        receipt.normalize(&roster());

        assert_eq!(receipt.active_participants(), roster().members());
        assert!(receipt.payer().is_none());
        assert!(receipt.individual_items(&p("cleo")).is_empty());
        assert_eq!(receipt.subtotal().unwrap().cents(), 450);
        assert!(receipt.validate().is_ok());
    }

    fn stored(fields: &str) -> Receipt {
        let json = format!(
            r#"{{ "id": "r1", "subject": "Stored", "payer": "ana", {fields}, "timestamp": "2024-05-01T18:30:00Z" }}"#
        );
        let mut receipt: Receipt = serde_json::from_str(&json).unwrap();
        receipt.normalize(&roster());
        receipt
    }

    #[test]
    fn test_validate_rejects_bad_documents() {
        let negative_tax = stored(r#""taxes": -250"#);
        assert!(matches!(
            negative_tax.validate(),
            Err(CoreError::Validation(ValidationError::Negative { ref field })) if field == "taxes"
        ));

        let free_item = stored(r#""individualItems": { "ben": [{ "name": "Water", "price": 0 }] }"#);
        assert!(matches!(
            free_item.validate(),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        let nobody = stored(r#""sharedItems": [{ "name": "Fries", "price": 500, "participants": [] }]"#);
        assert!(matches!(
            nobody.validate(),
            Err(CoreError::Validation(ValidationError::Required { ref field })) if field == "participants"
        ));

        let negative_split = stored(r#""splits": { "ben": -100 }, "isCompleted": true"#);
        assert!(matches!(
            negative_split.validate(),
            Err(CoreError::Validation(ValidationError::Negative { ref field })) if field == "split"
        ));

        let huge_tip = stored(r#""tip": 100000000000000"#);
        assert!(matches!(
            huge_tip.validate(),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_validate_requires_payer_on_completed_receipts() {
        let json = r#"{
            "id": "r1",
            "subject": "Lunch",
            "payer": "",
            "splits": { "ana": 500 },
            "isCompleted": true,
            "timestamp": "2024-05-01T18:30:00Z"
        }"#;
        let mut receipt: Receipt = serde_json::from_str(json).unwrap();
        receipt.normalize(&roster());

        assert!(matches!(
            receipt.validate(),
            Err(CoreError::Validation(ValidationError::Required { ref field })) if field == "payer"
        ));
    }

    #[test]
    fn test_unknown_active_set_key_is_ignored() {
        let json = r#"{
            "id": "r1",
            "activeFriends": ["ben"],
            "timestamp": "2024-05-01T18:30:00Z"
        }"#;

        let mut receipt: Receipt = serde_json::from_str(json).unwrap();
        receipt.normalize(&roster());
        assert_eq!(receipt.active_participants(), roster().members());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_value(draft()).unwrap();
        assert!(json.get("activeParticipants").is_some());
        assert!(json.get("individualItems").is_some());
        assert!(json.get("isCompleted").is_some());
    }
}
