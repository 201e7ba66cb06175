//! # splitstack-core: Pure Business Logic for SplitStack
//!
//! This crate is the **heart** of SplitStack. It turns itemized receipts
//! into per-person shares and aggregates many receipts into who owes whom.
//! It performs no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SplitStack Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/cli (`splitstack`)                      │   │
//! │  │    import ──► show ──► balances ──► share ──► shared            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ splitstack-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  receipt  │  │   split   │  │  balance  │  │   stack   │  │   │
//! │  │   │  Receipt  │  │ compute_  │  │ net +     │  │  Stack    │  │   │
//! │  │   │  items    │  │  split    │  │ debts     │  │  share    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 splitstack-db (Database Layer)                  │   │
//! │  │         stack documents, share snapshots, migrations            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Participant, Roster, line items, Debt
//! - [`money`] - Money in integer cents, ceiling from exact decimals
//! - [`receipt`] - Receipt aggregate and its editing lifecycle
//! - [`split`] - Receipt Splitter
//! - [`balance`] - Balance Consolidator
//! - [`stack`] - Stack aggregate
//! - [`share`] - Share ids and snapshots
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`web_import`] - Receipts exported by the browser app
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same receipts and roster in, same balances out
//! 2. **No I/O**: storage and sharing live in `splitstack-db`
//! 3. **Integer Money**: persisted amounts are cents (i64); split math is exact decimal
//! 4. **Explicit Roster**: every operation that needs participants takes the roster
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use splitstack_core::{consolidate_debts, LineItem, Money, Participant, Receipt, Roster};
//!
//! let roster = Roster::new(["ana", "ben"]).unwrap();
//! let ana = Participant::new("ana");
//! let ben = Participant::new("ben");
//!
//! let mut receipt = Receipt::new(&roster, Utc::now());
//! receipt.set_subject("Coffee").unwrap();
//! receipt.add_individual_item(&ben, LineItem::new("Latte", Money::from_cents(450)).unwrap()).unwrap();
//! receipt.set_payer(Some(ana.clone())).unwrap();
//! receipt.finalize(Utc::now()).unwrap();
//!
//! let debts = consolidate_debts([&receipt], &roster).unwrap();
//! assert_eq!(debts.len(), 1);
//! assert_eq!(debts[0].from, ben);
//! assert_eq!(debts[0].amount.cents(), 450);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod balance;
pub mod error;
pub mod money;
pub mod receipt;
pub mod share;
pub mod split;
pub mod stack;
pub mod types;
pub mod validation;
pub mod web_import;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use balance::{compute_net_balances, consolidate_debts, is_settled, summarize, BalanceSummary};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use receipt::{PaymentStatus, Receipt};
pub use share::{ShareId, ShareSnapshot};
pub use split::{compute_split, Splits};
pub use stack::Stack;
pub use types::*;
pub use web_import::{stack_from_web_receipts, WebReceipt};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Amounts at or below one cent count as settled.
///
/// Compared strictly: a debt is reported only when it is `> SETTLEMENT_EPSILON`.
pub const SETTLEMENT_EPSILON: Money = Money::from_cents(1);

/// Largest accepted price, tax or tip: $10,000,000,000.00.
///
/// Keeps every receipt total far inside i64 cents.
pub const MAX_AMOUNT: Money = Money::from_cents(1_000_000_000_000);

/// Maximum length of an item name, in characters.
pub const MAX_ITEM_NAME_LEN: usize = 100;

/// Maximum length of a participant or stack name, in characters.
pub const MAX_NAME_LEN: usize = 60;

/// Maximum length of a receipt subject, in characters.
pub const MAX_SUBJECT_LEN: usize = 200;

/// Length of a share link identifier.
pub const SHARE_ID_LEN: usize = 6;

/// Characters a share identifier is drawn from.
pub const SHARE_ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
