//! # Domain Types
//!
//! Core value types shared by receipts, stacks and the balance engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │     Roster      │   │    LineItem     │   │   SharedLineItem    │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  ordered names  │   │  name           │   │  name               │   │
//! │  │  (config)       │   │  price (Money)  │   │  price (Money)      │   │
//! │  └─────────────────┘   └─────────────────┘   │  participants (set) │   │
//! │                                              └─────────────────────┘   │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   Participant   │   │      Debt       │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  roster name    │   │  from → to      │                             │
//! │  └─────────────────┘   │  amount         │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_item_name, validate_item_price, validate_participant_name, ValidationResult};

// =============================================================================
// Participant
// =============================================================================

/// A participant identifier, drawn from the configured roster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Participant(String);

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Participant(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name with the first letter upper-cased, as shown in listings.
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Participant {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Participant {
    fn from(name: &str) -> Self {
        Participant::new(name)
    }
}

// =============================================================================
// Roster
// =============================================================================

/// The fixed, ordered list of participants, supplied as configuration.
///
/// ## Invariants
/// - At least one member
/// - Names are trimmed, non-blank and unique
///
/// The roster is never inferred from documents; every operation that needs
/// it takes it as an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    members: Vec<Participant>,
}

impl Roster {
    /// Builds a roster from names, in the given order.
    ///
    /// ## Example
    /// ```rust
    /// use splitstack_core::Roster;
    ///
    /// let roster = Roster::new(["ana", "ben", "cleo"]).unwrap();
    /// assert_eq!(roster.len(), 3);
    /// assert!(Roster::new(["ana", "ana"]).is_err());
    /// assert!(Roster::new(Vec::<String>::new()).is_err());
    /// ```
    pub fn new<I, S>(names: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut members: Vec<Participant> = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            validate_participant_name(name)?;

            if members.iter().any(|m| m.as_str() == name) {
                return Err(ValidationError::Duplicate {
                    field: "roster".to_string(),
                    value: name.to_string(),
                });
            }
            members.push(Participant::new(name));
        }

        if members.is_empty() {
            return Err(ValidationError::Required {
                field: "roster".to_string(),
            });
        }

        Ok(Roster { members })
    }

    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, participant: &Participant) -> bool {
        self.members.contains(participant)
    }

    /// Looks up a member by name.
    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.members.iter().find(|m| m.as_str() == name)
    }

    /// Roster position, used to keep active sets in roster order.
    pub fn position(&self, participant: &Participant) -> Option<usize> {
        self.members.iter().position(|m| m == participant)
    }

    /// Fails with `UnknownParticipant` when `participant` is not a member.
    pub fn require(&self, participant: &Participant) -> CoreResult<()> {
        if self.contains(participant) {
            Ok(())
        } else {
            Err(CoreError::UnknownParticipant(participant.clone()))
        }
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// An item bought by a single participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub name: String,
    pub price: Money,
}

impl LineItem {
    /// Creates a validated item: name is trimmed and non-blank, price > 0.
    pub fn new(name: impl AsRef<str>, price: Money) -> ValidationResult<Self> {
        let name = name.as_ref().trim();
        validate_item_name(name)?;
        validate_item_price(price)?;

        Ok(LineItem {
            name: name.to_string(),
            price,
        })
    }
}

/// An item whose price is split evenly between its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SharedLineItem {
    pub name: String,
    pub price: Money,
    pub participants: BTreeSet<Participant>,
}

impl SharedLineItem {
    /// Creates a validated shared item with at least one participant.
    pub fn new<I>(name: impl AsRef<str>, price: Money, participants: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = Participant>,
    {
        let name = name.as_ref().trim();
        validate_item_name(name)?;
        validate_item_price(price)?;

        let participants: BTreeSet<Participant> = participants.into_iter().collect();
        if participants.is_empty() {
            return Err(ValidationError::Required {
                field: "participants".to_string(),
            });
        }

        Ok(SharedLineItem {
            name: name.to_string(),
            price,
            participants,
        })
    }

    /// Exact per-person share: `price / |participants|`, not rounded.
    ///
    /// An item with no participants has no share.
    pub fn share(&self) -> Decimal {
        if self.participants.is_empty() {
            return Decimal::ZERO;
        }
        self.price.to_decimal() / Decimal::from(self.participants.len())
    }
}

// =============================================================================
// Debt
// =============================================================================

/// A directed settlement instruction: `from` should pay `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Debt {
    pub from: Participant,
    pub to: Participant,
    pub amount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_keeps_order_and_trims() {
        let roster = Roster::new([" ana ", "ben", "cleo"]).unwrap();
        let names: Vec<&str> = roster.iter().map(Participant::as_str).collect();
        assert_eq!(names, ["ana", "ben", "cleo"]);
        assert_eq!(roster.position(&Participant::new("cleo")), Some(2));
        assert!(roster.get("ben").is_some());
        assert!(roster.get("dan").is_none());
    }

    #[test]
    fn test_roster_rejects_bad_input() {
        assert!(matches!(
            Roster::new(["ana", "ana"]),
            Err(ValidationError::Duplicate { .. })
        ));
        assert!(matches!(
            Roster::new(["ana", "  "]),
            Err(ValidationError::Required { .. })
        ));
        assert!(Roster::new(Vec::<&str>::new()).is_err());
    }

    #[test]
    fn test_roster_require() {
        let roster = Roster::new(["ana"]).unwrap();
        assert!(roster.require(&Participant::new("ana")).is_ok());
        assert!(matches!(
            roster.require(&Participant::new("zed")),
            Err(CoreError::UnknownParticipant(_))
        ));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Participant::new("beatrice").display_name(), "Beatrice");
        assert_eq!(Participant::new("").display_name(), "");
    }

    #[test]
    fn test_line_item_validation() {
        let item = LineItem::new("  Ramen ", Money::from_cents(1450)).unwrap();
        assert_eq!(item.name, "Ramen");

        assert!(LineItem::new("", Money::from_cents(100)).is_err());
        assert!(LineItem::new("Tea", Money::zero()).is_err());
        assert!(LineItem::new("Tea", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_shared_item_share_is_exact() {
        let item = SharedLineItem::new(
            "Nachos",
            Money::from_cents(1000),
            [Participant::new("a"), Participant::new("b"), Participant::new("c")],
        )
        .unwrap();

        let share = item.share();
        assert!(share > Decimal::new(333, 2) && share < Decimal::new(334, 2));
        assert_eq!(share.round_dp(9), Decimal::new(3_333_333_333, 9));
    }

    #[test]
    fn test_shared_item_requires_participants() {
        let result = SharedLineItem::new("Nachos", Money::from_cents(1000), Vec::new());
        assert!(matches!(result, Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_participant_serializes_as_string() {
        let json = serde_json::to_string(&Participant::new("ana")).unwrap();
        assert_eq!(json, "\"ana\"");
    }
}
