//! # Receipt Splitter
//!
//! Turns one receipt's line items, taxes and tip into what each active
//! participant owes.
//!
//! ## Order of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      compute_split(receipt)                             │
//! │                                                                         │
//! │  0. subject / payer / total present?  ── no ──► MissingFields           │
//! │       │                                                                 │
//! │  1. running[p] = 0            for p in active participants              │
//! │  2. running[p] += Σ own items                                           │
//! │  3. running[p] += price / |item.participants|                           │
//! │        (only for item participants still active; others are dropped)    │
//! │  4. if subtotal > 0 and taxes > 0:                                      │
//! │        running[p] *= taxes / subtotal + 1                               │
//! │  5. if tip > 0:                                                         │
//! │        running[p] += tip / |active|                                     │
//! │  6. splits[p] = ceil_to_cent(running[p])                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-5 run in exact decimal arithmetic. Money leaves `Decimal` once,
//! at step 6, so `splits` are always whole cents and never below the exact
//! share.
//!
//! The tax rate multiplies each participant's entire running total
//! (individual and shared), so taxes are apportioned by spend.
//!
//! ## Example
//! ```rust
//! use chrono::Utc;
//! use splitstack_core::{compute_split, LineItem, Money, Participant, Receipt, Roster};
//!
//! let roster = Roster::new(["ana", "ben"]).unwrap();
//! let ana = Participant::new("ana");
//! let ben = Participant::new("ben");
//!
//! let mut receipt = Receipt::new(&roster, Utc::now());
//! receipt.set_subject("Dinner").unwrap();
//! receipt.add_individual_item(&ana, LineItem::new("Steak", Money::from_cents(5000)).unwrap()).unwrap();
//! receipt.add_individual_item(&ben, LineItem::new("Salmon", Money::from_cents(5000)).unwrap()).unwrap();
//! receipt.set_taxes(Money::from_cents(800)).unwrap();
//! receipt.set_tip(Money::from_cents(1000)).unwrap();
//! receipt.set_payer(Some(ana.clone())).unwrap();
//!
//! let splits = compute_split(&receipt).unwrap();
//! assert_eq!(splits[&ana].cents(), 5900);
//! assert_eq!(splits[&ben].cents(), 5900);
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::receipt::Receipt;
use crate::types::Participant;

/// Amount owed per participant.
pub type Splits = BTreeMap<Participant, Money>;

/// Computes each active participant's share of `receipt`.
///
/// This is a preview: the receipt is not modified. Use
/// [`Receipt::finalize`] to store the result.
///
/// ## Errors
/// - `Validation(MissingFields)` listing subject / payer / total (in that
///   order) for every one that is missing
/// - `ParticipantNotActive` if a stored payer is no longer active
/// - `AmountOverflow` if the total or an intermediate amount does not fit
pub fn compute_split(receipt: &Receipt) -> CoreResult<Splits> {
    ensure_splittable(receipt)?;

    let active = receipt.active_participants();

    // Steps 1 + 2
    let mut running: BTreeMap<&Participant, Decimal> = BTreeMap::new();
    for participant in active {
        running.insert(participant, receipt.participant_total(participant)?.to_decimal());
    }

    // Step 3
    for item in receipt.shared_items() {
        let share = item.share();
        for participant in &item.participants {
            if let Some(value) = running.get_mut(participant) {
                *value = checked(value.checked_add(share))?;
            }
        }
    }

    // Step 4
    let subtotal = receipt.subtotal()?;
    let taxes = receipt.taxes();
    if subtotal.is_positive() && taxes.is_positive() {
        let rate = checked(taxes.to_decimal().checked_div(subtotal.to_decimal()))? + Decimal::ONE;
        for value in running.values_mut() {
            *value = checked(value.checked_mul(rate))?;
        }
    }

    // Step 5
    let tip = receipt.tip();
    if tip.is_positive() && !active.is_empty() {
        let tip_share = checked(tip.to_decimal().checked_div(Decimal::from(active.len())))?;
        for value in running.values_mut() {
            *value = checked(value.checked_add(tip_share))?;
        }
    }

    // Step 6
    running
        .into_iter()
        .map(|(participant, value)| {
            let owed = if value > Decimal::ZERO {
                Money::ceil_from_decimal(value).ok_or(CoreError::AmountOverflow)?
            } else {
                Money::zero()
            };
            Ok((participant.clone(), owed))
        })
        .collect()
}

fn ensure_splittable(receipt: &Receipt) -> CoreResult<()> {
    let total = receipt.total()?;
    let mut missing = Vec::new();

    if receipt.subject().trim().is_empty() {
        missing.push("subject".to_string());
    }
    if receipt.payer().is_none() {
        missing.push("payer".to_string());
    }
    if !total.is_positive() {
        missing.push("total".to_string());
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing }.into());
    }

    if let Some(payer) = receipt.payer() {
        if !receipt.is_active(payer) {
            return Err(CoreError::ParticipantNotActive(payer.clone()));
        }
    }
    Ok(())
}

#[inline]
fn checked(value: Option<Decimal>) -> CoreResult<Decimal> {
    value.ok_or(CoreError::AmountOverflow)
}

// =============================================================================
// Unit Tests
// =============================================================================
