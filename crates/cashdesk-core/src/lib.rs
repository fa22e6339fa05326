//! # cashdesk-core: Pure Cash Register Logic
//!
//! The rules of the cash register engine: how a session's ledger folds into
//! an expected cash balance, how a physical count is reconciled against it,
//! and how many branches roll up into one dashboard. No I/O lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cash Register Engine                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Callers (sale subsystem, admin console, dashboards)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                cashdesk-db (repositories)                       │   │
//! │  │      open / record / close / reports, SQLite transactions       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ cashdesk-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌──────────────┐ ┌──────────┐  │   │
//! │  │   │  catalog  │  │  balance  │  │reconciliation│ │aggregator│  │   │
//! │  │   │ types and │─►│  ledger   │─►│ expected vs  │ │  fleet   │  │   │
//! │  │   │  methods  │  │   fold    │  │   counted    │ │  totals  │  │   │
//! │  │   └───────────┘  └───────────┘  └──────────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Sessions, movements, movement types, payment methods
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Reference data lookups
//! - [`balance`] - Per-session balance calculation
//! - [`reconciliation`] - Expected vs counted classification
//! - [`aggregator`] - Multi-branch summaries
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use cashdesk_core::balance::BalanceCalculator;
//! use cashdesk_core::catalog::Catalog;
//! use cashdesk_core::reconciliation::{ReconciliationPolicy, ReconciliationStatus};
//! use cashdesk_core::{Money, NewMovement};
//! use chrono::Utc;
//!
//! let catalog = Catalog::standard();
//! let sale = NewMovement::new(1, 1, Money::from_cents(50_000), "Ticket 0001")
//!     .into_movement("m1".into(), "s1".into(), Utc::now());
//!
//! let balance = BalanceCalculator::new(&catalog)
//!     .summarize(Money::from_cents(10_000), &[sale])
//!     .unwrap();
//! let rec = ReconciliationPolicy::default()
//!     .reconcile(balance.expected_cash_balance, Money::from_cents(59_000));
//!
//! assert_eq!(rec.difference.cents(), -1_000);
//! assert_eq!(rec.status, ReconciliationStatus::Shortfall);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod balance;
pub mod catalog;
pub mod error;
pub mod money;
pub mod reconciliation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::{AggregateFilter, BranchSummary, FleetAggregator, FleetSummary, SessionLedger};
pub use balance::{BalanceCalculator, MethodBalance, SessionBalance};
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use reconciliation::{Reconciliation, ReconciliationPolicy, ReconciliationStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a movement description.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Maximum length of closing notes.
pub const MAX_NOTES_LEN: usize = 1000;

/// Largest single amount a register accepts (1,000,000,000.00).
///
/// Keeps opening floats, movements and counted cash far enough from the
/// i64 limit that a session's totals stay exact.
pub const MAX_AMOUNT: Money = Money::from_cents(100_000_000_000);
