//! # Browser Receipt Import
//!
//! Converts the receipt list kept by the browser version of the app
//! (a JSON array in local storage) into a [`Stack`].
//!
//! ## Format Differences
//! ```text
//! ┌──────────────────┬──────────────────────────────┬─────────────────────────┐
//! │ field            │ browser export               │ SplitStack document     │
//! ├──────────────────┼──────────────────────────────┼─────────────────────────┤
//! │ id               │ number (epoch millis)        │ string                  │
//! │ prices, splits   │ dollars as JS numbers (3.5)  │ integer cents (350)     │
//! │ taxes, tip       │ dollars, may be missing      │ integer cents           │
//! │ active set       │ activeFriends                │ activeParticipants      │
//! │ no payer         │ ""                           │ absent                  │
//! │ subtotal, total  │ stored                       │ derived, not stored     │
//! └──────────────────┴──────────────────────────────┴─────────────────────────┘
//! ```
//!
//! Dollar amounts are rounded to the nearest cent, which absorbs float
//! noise such as `0.30000000000000004`. Every converted receipt is
//! normalized and validated like any other loaded document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::receipt::Receipt;
use crate::split::Splits;
use crate::stack::Stack;
use crate::types::{LineItem, Participant, Roster, SharedLineItem};
use crate::validation::ValidationResult;

/// Receipt ids were epoch milliseconds; hand-edited files may use strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum WebId {
    Number(u64),
    Text(String),
}

impl WebId {
    fn into_string(self) -> String {
        match self {
            WebId::Number(n) => n.to_string(),
            WebId::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct WebItem {
    name: String,
    price: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct WebSharedItem {
    name: String,
    price: f64,
    #[serde(default)]
    participants: Vec<Participant>,
}

/// One receipt as the browser app stored it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebReceipt {
    id: WebId,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    active_friends: Vec<Participant>,
    #[serde(default)]
    individual_items: BTreeMap<Participant, Vec<WebItem>>,
    #[serde(default)]
    shared_items: Vec<WebSharedItem>,
    #[serde(default)]
    taxes: Option<f64>,
    #[serde(default)]
    tip: Option<f64>,
    #[serde(default)]
    payer: Option<String>,
    #[serde(default)]
    splits: BTreeMap<Participant, f64>,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// Dollars as a JSON number to cents, rounded to the nearest cent.
fn dollars_to_money(field: &str, dollars: f64) -> ValidationResult<Money> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    Decimal::from_f64(dollars)
        .ok_or_else(|| invalid("is not a finite dollar amount"))?
        .round_dp(2)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .map(Money::from_cents)
        .ok_or_else(|| invalid("is too large"))
}

impl WebReceipt {
    fn into_receipt(self, roster: &Roster, now: DateTime<Utc>) -> CoreResult<Receipt> {
        let mut individual_items = BTreeMap::new();
        for (participant, items) in self.individual_items {
            let items = items
                .into_iter()
                .map(|item| {
                    Ok(LineItem {
                        name: item.name,
                        price: dollars_to_money("price", item.price)?,
                    })
                })
                .collect::<ValidationResult<Vec<_>>>()?;
            individual_items.insert(participant, items);
        }

        let shared_items = self
            .shared_items
            .into_iter()
            .map(|item| {
                Ok(SharedLineItem {
                    name: item.name,
                    price: dollars_to_money("price", item.price)?,
                    participants: item.participants.into_iter().collect(),
                })
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        let splits: Splits = self
            .splits
            .into_iter()
            .map(|(participant, dollars)| Ok((participant, dollars_to_money("split", dollars)?)))
            .collect::<ValidationResult<Splits>>()?;

        let mut receipt = Receipt {
            id: self.id.into_string(),
            subject: self.subject,
            active_participants: self.active_friends,
            individual_items,
            shared_items,
            taxes: dollars_to_money("taxes", self.taxes.unwrap_or_default())?,
            tip: dollars_to_money("tip", self.tip.unwrap_or_default())?,
            payer: self.payer.map(Participant::new),
            splits,
            is_completed: self.is_completed,
            settled: Default::default(),
            timestamp: self.timestamp.unwrap_or(now),
        };

        receipt.normalize(roster);
        receipt.validate()?;
        Ok(receipt)
    }
}

/// Builds a stack from a browser export.
///
/// The stack is dated by its earliest receipt (or `now` when the export is
/// empty). An empty export yields a stack with one blank receipt.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use splitstack_core::{stack_from_web_receipts, Participant, Roster, WebReceipt};
///
/// let json = r#"[{
///     "id": 1691834400000,
///     "subject": "Coffee",
///     "activeFriends": ["ana", "ben"],
///     "individualItems": { "ana": [], "ben": [{ "name": "Latte", "price": 4.5 }] },
///     "sharedItems": [],
///     "tip": 0,
///     "payer": "ana",
///     "splits": { "ana": 0, "ben": 4.5 },
///     "isCompleted": true,
///     "timestamp": "2023-08-12T09:20:00.000Z"
/// }]"#;
///
/// let roster = Roster::new(["ana", "ben"]).unwrap();
/// let receipts: Vec<WebReceipt> = serde_json::from_str(json).unwrap();
/// let stack = stack_from_web_receipts("Cafe", receipts, &roster, Utc::now()).unwrap();
///
/// let receipt = &stack.receipts()[0];
/// assert_eq!(receipt.id(), "1691834400000");
/// assert_eq!(receipt.split_for(&Participant::new("ben")).cents(), 450);
/// assert_eq!(stack.date().to_string(), "2023-08-12");
/// ```
pub fn stack_from_web_receipts(
    name: &str,
    receipts: Vec<WebReceipt>,
    roster: &Roster,
    now: DateTime<Utc>,
) -> CoreResult<Stack> {
    let receipts = receipts
        .into_iter()
        .map(|receipt| receipt.into_receipt(roster, now))
        .collect::<CoreResult<Vec<_>>>()?;

    let date = receipts
        .iter()
        .map(Receipt::timestamp)
        .min()
        .unwrap_or(now)
        .date_naive();

    Ok(Stack::from_receipts(name, date, receipts, roster, now)?)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn roster() -> Roster {
        Roster::new(["ana", "ben", "cleo"]).unwrap()
    }

    fn p(name: &str) -> Participant {
        Participant::new(name)
    }

    /// Shape written by the browser app: numeric id, dollar floats,
    /// stored subtotal/total, blank payer on drafts.
    const EXPORT: &str = r#"[
        {
            "id": 1691834400000,
            "subject": "Snacks",
            "activeFriends": ["ana", "ben"],
            "individualItems": {
                "ana": [],
                "ben": [{ "name": "Chips", "price": 3.5 }],
                "cleo": []
            },
            "sharedItems": [
                { "name": "Melon", "price": 6, "participants": ["ana", "ben"] }
            ],
            "subtotal": 9.5,
            "tip": 0,
            "total": 9.5,
            "payer": "ana",
            "splits": { "ana": 3, "ben": 6.5 },
            "timestamp": "2023-08-12T11:00:00.000Z",
            "isCompleted": true
        },
        {
            "id": 1691841600000,
            "subject": "",
            "activeFriends": ["ana", "ben", "cleo"],
            "individualItems": { "ana": [], "ben": [], "cleo": [{ "name": "Soda", "price": 0.1 }] },
            "sharedItems": [],
            "subtotal": 0,
            "taxes": 0.2,
            "tip": 0,
            "total": 0,
            "payer": "",
            "splits": {},
            "timestamp": "2023-08-12T13:00:00.000Z",
            "isCompleted": false
        }
    ]"#;

    fn import(json: &str) -> CoreResult<Stack> {
        let receipts: Vec<WebReceipt> = serde_json::from_str(json).unwrap();
        stack_from_web_receipts("Beach day", receipts, &roster(), Utc::now())
    }

    #[test]
    fn test_browser_export_converts_to_cents() {
        let stack = import(EXPORT).unwrap();

        assert_eq!(stack.name(), "Beach day");
        assert_eq!(stack.date().to_string(), "2023-08-12");
        assert_eq!(stack.receipts().len(), 2);

        let snacks = &stack.receipts()[0];
        assert_eq!(snacks.id(), "1691834400000");
        assert!(snacks.is_completed());
        assert_eq!(snacks.active_participants(), [p("ana"), p("ben")]);
        assert_eq!(snacks.individual_items(&p("ben"))[0].price, Money::from_cents(350));
        assert_eq!(snacks.shared_items()[0].price, Money::from_cents(600));
        assert_eq!(snacks.total().unwrap(), Money::from_cents(950));
        assert_eq!(snacks.split_for(&p("ben")), Money::from_cents(650));

        let draft = &stack.receipts()[1];
        assert!(draft.payer().is_none());
        assert_eq!(draft.individual_items(&p("cleo"))[0].price, Money::from_cents(10));
        assert_eq!(draft.taxes(), Money::from_cents(20));

        let summary = stack.summary(&roster()).unwrap().unwrap();
        assert_eq!(summary.debts.len(), 1);
        assert_eq!(summary.debts[0].from, p("ben"));
        assert_eq!(summary.debts[0].amount, Money::from_cents(650));
    }

    #[test]
    fn test_whole_dollar_amounts_are_not_read_as_cents() {
        let json = r#"[{
            "id": 1, "subject": "Pizza", "payer": "ana",
            "individualItems": { "ben": [{ "name": "Slice", "price": 12 }] },
            "tip": 5
        }]"#;
        let stack = import(json).unwrap();
        let receipt = &stack.receipts()[0];

        assert_eq!(receipt.individual_items(&p("ben"))[0].price, Money::from_cents(1200));
        assert_eq!(receipt.tip(), Money::from_cents(500));
    }

    #[test]
    fn test_float_noise_is_rounded_away() {
        assert_eq!(dollars_to_money("split", 0.1 + 0.2).unwrap(), Money::from_cents(30));
        assert_eq!(dollars_to_money("split", 3.34).unwrap(), Money::from_cents(334));
        assert!(dollars_to_money("price", 1e30).is_err());
    }

    #[test]
    fn test_string_ids_are_accepted() {
        let json = r#"[{ "id": "custom-1", "subject": "Tea" }]"#;
        assert_eq!(import(json).unwrap().receipts()[0].id(), "custom-1");
    }

    #[test]
    fn test_invalid_amounts_are_rejected() {
        let json = r#"[{ "id": 1, "subject": "Refund", "taxes": -2.5 }]"#;
        assert!(matches!(
            import(json),
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));
    }

    #[test]
    fn test_empty_export_gets_one_receipt() {
        let stack = import("[]").unwrap();
        assert_eq!(stack.receipts().len(), 1);
        assert!(!stack.receipts()[0].is_completed());
    }
}
