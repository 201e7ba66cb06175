//! # Balance Consolidator
//!
//! Aggregates completed receipts into net balances and a minimal set of
//! pairwise debts.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Balance Consolidation                               │
//! │                                                                         │
//! │  receipts ──► filter(is_completed)                                      │
//! │                     │                                                   │
//! │       ┌─────────────┴──────────────┐                                    │
//! │       ▼                            ▼                                    │
//! │  compute_net_balances         consolidate_debts                         │
//! │  payer  += total - split      raw[(member, payer)] += split             │
//! │  others -= split                   │                                    │
//! │       │                            ▼                                    │
//! │       │                       net = raw[A→B] - raw[B→A]                 │
//! │       │                       one edge per pair, from larger debtor     │
//! │       ▼                            ▼                                    │
//! │  IndexMap (roster order)      Vec<Debt> (first-seen pair order)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts at or below [`SETTLEMENT_EPSILON`] count as settled; every
//! comparison against it is strict (`> ε`).
//!
//! Only roster members are tracked. A stored payer who has since left the
//! roster is not credited.
//!
//! Sums use checked arithmetic; an overflow surfaces as `AmountOverflow`.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::receipt::Receipt;
use crate::types::{Debt, Participant, Roster};
use crate::SETTLEMENT_EPSILON;

/// True when `amount` is within one cent of zero.
#[inline]
pub fn is_settled(amount: Money) -> bool {
    amount.abs() <= SETTLEMENT_EPSILON
}

fn completed<'a, I>(receipts: I) -> impl Iterator<Item = &'a Receipt>
where
    I: IntoIterator<Item = &'a Receipt>,
{
    receipts.into_iter().filter(|r| r.is_completed())
}

// =============================================================================
// Net Balances
// =============================================================================

/// Net position of every roster member across the completed receipts.
///
/// Positive means the group owes them; negative means they owe the group.
///
/// ## Example
/// ```rust
/// use splitstack_core::{compute_net_balances, Roster};
///
/// let roster = Roster::new(["ana", "ben"]).unwrap();
/// let balances = compute_net_balances(&[], &roster).unwrap();
/// assert!(balances.values().all(|b| b.is_zero()));
/// assert_eq!(balances.len(), 2);
/// ```
pub fn compute_net_balances<'a, I>(receipts: I, roster: &Roster) -> CoreResult<IndexMap<Participant, Money>>
where
    I: IntoIterator<Item = &'a Receipt>,
{
    let mut balances: IndexMap<Participant, Money> =
        roster.iter().map(|p| (p.clone(), Money::zero())).collect();

    for receipt in completed(receipts) {
        let Some(payer) = receipt.payer() else {
            continue;
        };
        let total = receipt.total()?;

        for (member, balance) in balances.iter_mut() {
            let split = receipt.split_for(member);
            let updated = if member == payer {
                total.checked_sub(split).and_then(|credit| balance.checked_add(credit))
            } else {
                balance.checked_sub(split)
            };
            *balance = updated.ok_or(CoreError::AmountOverflow)?;
        }
    }

    Ok(balances)
}

// =============================================================================
// Debt Consolidation
// =============================================================================

/// Minimal set of directed debts between pairs of roster members.
///
/// Raw debts are summed per ordered pair `(debtor, payer)`, then each
/// unordered pair is netted once. At most one edge exists between any two
/// participants.
pub fn consolidate_debts<'a, I>(receipts: I, roster: &Roster) -> CoreResult<Vec<Debt>>
where
    I: IntoIterator<Item = &'a Receipt>,
{
    let mut raw: IndexMap<(Participant, Participant), Money> = IndexMap::new();

    for receipt in completed(receipts) {
        let Some(payer) = receipt.payer() else {
            continue;
        };
        for member in roster.iter().filter(|m| *m != payer) {
            let owed = receipt.split_for(member);
            if owed > SETTLEMENT_EPSILON {
                let entry = raw.entry((member.clone(), payer.clone())).or_default();
                *entry = entry.checked_add(owed).ok_or(CoreError::AmountOverflow)?;
            }
        }
    }

    let mut processed: HashSet<(&Participant, &Participant)> = HashSet::new();
    let mut debts = Vec::new();

    for ((from, to), forward) in &raw {
        if processed.contains(&(from, to)) {
            continue;
        }
        processed.insert((from, to));
        processed.insert((to, from));

        let backward = raw
            .get(&(to.clone(), from.clone()))
            .copied()
            .unwrap_or_default();
        let net = forward.checked_sub(backward).ok_or(CoreError::AmountOverflow)?;

        if net.abs() > SETTLEMENT_EPSILON {
            let (from, to) = if net.is_positive() { (from, to) } else { (to, from) };
            debts.push(Debt {
                from: from.clone(),
                to: to.clone(),
                amount: net.abs(),
            });
        }
    }

    Ok(debts)
}

// =============================================================================
// Summary
// =============================================================================

/// Everything the balances view shows for one stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BalanceSummary {
    #[ts(as = "std::collections::HashMap<Participant, Money>")]
    pub balances: IndexMap<Participant, Money>,
    pub debts: Vec<Debt>,
    pub completed_count: usize,
    /// Roster members whose balance is not settled.
    pub participating: Vec<Participant>,
}

impl BalanceSummary {
    /// True when nobody owes anybody.
    pub fn is_all_settled(&self) -> bool {
        self.debts.is_empty()
    }
}

/// Balances and debts over `receipts`, or `None` when none is completed.
pub fn summarize<'a, I>(receipts: I, roster: &Roster) -> CoreResult<Option<BalanceSummary>>
where
    I: IntoIterator<Item = &'a Receipt>,
{
    let finished: Vec<&Receipt> = completed(receipts).collect();
    if finished.is_empty() {
        return Ok(None);
    }

    let balances = compute_net_balances(finished.iter().copied(), roster)?;
    let debts = consolidate_debts(finished.iter().copied(), roster)?;
    let participating = balances
        .iter()
        .filter(|(_, balance)| !is_settled(**balance))
        .map(|(p, _)| p.clone())
        .collect();

    Ok(Some(BalanceSummary {
        balances,
        debts,
        completed_count: finished.len(),
        participating,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================
