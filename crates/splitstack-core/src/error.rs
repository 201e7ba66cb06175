//! # Error Types
//!
//! Domain-specific error types for splitstack-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  splitstack-core errors (this file)                                    │
//! │  ├── CoreError        - Rejected mutations, invariant guards           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  splitstack-db errors (separate crate)                                 │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── CliError         - What the user sees                             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CliError → stderr       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invariant violations are never detected after the fact: the mutation
//! that would cause one is rejected and the aggregate is left untouched.

use thiserror::Error;

use crate::money::Money;
use crate::types::Participant;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Participant is not part of the configured roster.
    #[error("Unknown participant: {0}")]
    UnknownParticipant(Participant),

    /// Removing this participant would leave the receipt with nobody active.
    ///
    /// ## User Workflow
    /// ```text
    /// Active: [ana]
    ///      │
    ///      ▼
    /// deactivate_participant(ana)
    ///      │
    ///      ▼
    /// LastActiveParticipant { participant: "ana" }
    ///      │
    ///      ▼
    /// UI shows: "At least one participant must be active for the receipt"
    /// ```
    #[error("At least one participant must be active for the receipt (cannot remove {participant})")]
    LastActiveParticipant { participant: Participant },

    /// Participant exists in the roster but is not active on this receipt.
    #[error("{0} is not active on this receipt")]
    ParticipantNotActive(Participant),

    /// Receipt is finalized; edits require reopening it first.
    #[error("Receipt {receipt_id} is completed and cannot be edited")]
    ReceiptCompleted { receipt_id: String },

    /// Operation only makes sense on a finalized receipt.
    #[error("Receipt {receipt_id} has not been completed yet")]
    ReceiptNotCompleted { receipt_id: String },

    /// Item index out of range.
    #[error("No {kind} item at position {index}")]
    ItemNotFound { kind: &'static str, index: usize },

    /// Receipt index out of range.
    #[error("No receipt at position {0}")]
    ReceiptNotFound(usize),

    /// A stack must always keep at least one receipt.
    #[error("A stack must keep at least one receipt")]
    LastReceipt,

    /// Sharing requires at least one completed receipt.
    #[error("Complete at least one receipt before sharing")]
    NothingToShare,

    /// Participant owes nothing on this receipt, so there is no payment to track.
    #[error("{0} does not owe anything on this receipt")]
    NothingOwed(Participant),

    /// A computed amount does not fit in i64 cents.
    #[error("Amount is too large to represent")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more fields required to split a receipt are missing.
    ///
    /// Fields are reported in a fixed order: subject, payer, total.
    #[error("Please fill in all required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is above the accepted maximum.
    #[error("{field} cannot exceed {max}")]
    TooLarge { field: String, max: Money },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed share id, unparsable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same name twice in the roster).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Names of the missing fields, if this is a `MissingFields` error.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            ValidationError::MissingFields { fields } => fields,
            _ => &[],
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
