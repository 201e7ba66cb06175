//! # Share Links
//!
//! Read-only snapshots of a stack's completed receipts, addressed by a
//! short identifier.
//!
//! ```text
//! Stack ──prepare_share()──► (ShareId "K7Q2ZD", ShareSnapshot)
//!                                    │
//!                                    ▼
//!                        ShareStore::set(id, snapshot)     (splitstack-db)
//!                                    │
//!            viewer opens link       ▼
//!                        ShareStore::get(id) ──► snapshot.summary(roster)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::balance::{summarize, BalanceSummary};
use crate::error::{CoreResult, ValidationError};
use crate::receipt::Receipt;
use crate::types::Roster;
use crate::validation::ValidationResult;
use crate::{SHARE_ID_ALPHABET, SHARE_ID_LEN};

// =============================================================================
// ShareId
// =============================================================================

/// Six characters from `[A-Z0-9]`.
///
/// Generated identifiers are not checked for uniqueness; with 36^6
/// combinations a collision simply overwrites the older snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShareId(String);

/// Bytes at or above this are skipped so `byte % 36` stays uniform.
const UNBIASED_LIMIT: u8 = (256 / SHARE_ID_ALPHABET.len() * SHARE_ID_ALPHABET.len()) as u8;

impl ShareId {
    /// Generates a fresh identifier from UUID v4 entropy.
    pub fn generate() -> Self {
        loop {
            if let Some(id) = Self::from_entropy(Uuid::new_v4().as_bytes()) {
                return id;
            }
        }
    }

    /// Maps bytes onto the alphabet by rejection sampling: bytes `>= 252`
    /// are skipped. `None` when fewer than [`SHARE_ID_LEN`] bytes are usable.
    pub fn from_entropy(bytes: &[u8]) -> Option<Self> {
        let id: String = bytes
            .iter()
            .filter(|b| **b < UNBIASED_LIMIT)
            .take(SHARE_ID_LEN)
            .map(|b| SHARE_ID_ALPHABET[usize::from(*b) % SHARE_ID_ALPHABET.len()] as char)
            .collect();
        (id.len() == SHARE_ID_LEN).then_some(ShareId(id))
    }

    /// Parses user input. Lowercase letters are accepted and upper-cased.
    ///
    /// ## Example
    /// ```rust
    /// use splitstack_core::ShareId;
    ///
    /// assert_eq!(ShareId::parse("k7q2zd").unwrap().as_str(), "K7Q2ZD");
    /// assert!(ShareId::parse("K7Q2").is_err());
    /// assert!(ShareId::parse("K7Q2Z!").is_err());
    /// ```
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let id = input.trim().to_ascii_uppercase();
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "share id".to_string(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(ValidationError::Required {
                field: "share id".to_string(),
            });
        }
        if id.len() != SHARE_ID_LEN {
            return Err(invalid("must be exactly 6 characters"));
        }
        if !id.bytes().all(|b| SHARE_ID_ALPHABET.contains(&b)) {
            return Err(invalid("may only contain letters and digits"));
        }

        Ok(ShareId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShareId::parse(s)
    }
}

// =============================================================================
// ShareSnapshot
// =============================================================================

/// What a share link resolves to.
///
/// Only completed receipts are included; drafts never leave the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShareSnapshot {
    pub stack_name: String,
    #[ts(as = "String")]
    pub stack_date: NaiveDate,
    pub receipts: Vec<Receipt>,
    #[ts(as = "String")]
    pub shared_at: DateTime<Utc>,
}

impl ShareSnapshot {
    /// Restores receipt invariants after loading from the store.
    pub fn normalize(&mut self, roster: &Roster) {
        for receipt in &mut self.receipts {
            receipt.normalize(roster);
        }
    }

    /// Rejects snapshots whose receipts break the document invariants.
    pub fn validate(&self) -> CoreResult<()> {
        self.receipts.iter().try_for_each(Receipt::validate)
    }

    /// Balances for the read-only view.
    pub fn summary(&self, roster: &Roster) -> CoreResult<Option<BalanceSummary>> {
        summarize(&self.receipts, roster)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entropy_is_deterministic() {
        let bytes = [0u8, 1, 25, 26, 35, 36, 200, 7, 8, 9, 10, 11, 12, 13, 14, 15];
        let id = ShareId::from_entropy(&bytes).unwrap();
        assert_eq!(id.as_str(), "ABZ09A");
    }

    #[test]
    fn test_from_entropy_skips_biased_bytes() {
        let bytes = [252u8, 255, 0, 253, 1, 2, 254, 3, 4, 251];
        let id = ShareId::from_entropy(&bytes).unwrap();
        assert_eq!(id.as_str(), "ABCDE9");

        assert!(ShareId::from_entropy(&[255u8; 16]).is_none());
        assert!(ShareId::from_entropy(&[0u8, 1, 2]).is_none());
    }

    #[test]
    fn test_every_accepted_byte_value_hits_each_character_equally() {
        let mut counts = [0usize; 36];
        for byte in 0..=u8::MAX {
            let bytes = [byte; SHARE_ID_LEN];
            if let Some(id) = ShareId::from_entropy(&bytes) {
                let first = id.as_str().as_bytes()[0];
                let slot = SHARE_ID_ALPHABET.iter().position(|c| *c == first).unwrap();
                counts[slot] += 1;
            }
        }
        assert!(counts.iter().all(|c| *c == 7));
    }

    #[test]
    fn test_generate_has_valid_shape() {
        for _ in 0..50 {
            let id = ShareId::generate();
            assert_eq!(id.as_str().len(), SHARE_ID_LEN);
            assert!(ShareId::parse(id.as_str()).is_ok());
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ShareId::parse("  "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            ShareId::parse("ABCDEFG"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            "AB-DEF".parse::<ShareId>(),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_snapshot_serde_shape() {
        let snapshot = ShareSnapshot {
            stack_name: "Lisbon".to_string(),
            stack_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            receipts: Vec::new(),
            shared_at: Utc::now(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["stackName"], "Lisbon");
        assert_eq!(json["stackDate"], "2024-06-01");
        assert!(json.get("sharedAt").is_some());
    }
}
