//! # Validation Module
//!
//! Input validation utilities for SplitStack.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input parsing                                                │
//! │  ├── Money::from_str (amount format)                                   │
//! │  └── ShareId::parse (link format)                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Item names and prices                                             │
//! │  ├── Taxes / tip non-negative, every amount ≤ MAX_AMOUNT               │
//! │  └── Roster and stack names                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Aggregate invariants (Receipt / Stack methods)               │
//! │  ├── At least one active participant                                   │
//! │  └── Payer must be active                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_ITEM_NAME_LEN, MAX_NAME_LEN, MAX_SUBJECT_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an item name (individual or shared).
///
/// ## Example
/// ```rust
/// use splitstack_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Pad thai").is_ok());
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    validate_text("item name", name, MAX_ITEM_NAME_LEN)
}

/// Validates a roster participant name.
pub fn validate_participant_name(name: &str) -> ValidationResult<()> {
    validate_text("participant", name, MAX_NAME_LEN)
}

/// Validates a stack (hangout) name.
pub fn validate_stack_name(name: &str) -> ValidationResult<()> {
    validate_text("stack name", name, MAX_NAME_LEN)
}

/// Validates a receipt subject. Blank subjects are allowed while editing;
/// only the length is checked here. Presence is enforced when splitting.
pub fn validate_subject(subject: &str) -> ValidationResult<()> {
    if subject.trim().chars().count() > MAX_SUBJECT_LEN {
        return Err(ValidationError::TooLong {
            field: "subject".to_string(),
            max: MAX_SUBJECT_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn validate_at_most_max(field: &str, amount: Money) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

/// Validates an item price: strictly positive and at most [`MAX_AMOUNT`].
///
/// ## Example
/// ```rust
/// use splitstack_core::money::Money;
/// use splitstack_core::validation::validate_item_price;
///
/// assert!(validate_item_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_item_price(Money::zero()).is_err());
/// ```
pub fn validate_item_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    validate_at_most_max("price", price)
}

/// Validates taxes or tip: zero is allowed, negative is not.
pub fn validate_surcharge(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    validate_at_most_max(field, amount)
}

/// Validates a stored split: non-negative and at most [`MAX_AMOUNT`].
pub fn validate_split(amount: Money) -> ValidationResult<()> {
    validate_surcharge("split", amount)
}

// =============================================================================
// Unit Tests
// =============================================================================
