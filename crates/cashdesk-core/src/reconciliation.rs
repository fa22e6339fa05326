//! # Reconciliation
//!
//! Compares the physically counted cash against the expected cash balance.
//!
//! ## The Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  expected ≥ 0:  difference = counted − expected                         │
//! │  expected < 0:  difference = counted − |expected|                       │
//! │                 (the cash found is measured against the deficit it      │
//! │                  has to cover)                                          │
//! │                                                                         │
//! │  |difference| < tolerance  → Matched                                    │
//! │   difference  > 0          → Surplus                                    │
//! │   difference  < 0          → Shortfall                                  │
//! │                                                                         │
//! │  Default tolerance: 1 cent. With integer cents that means only an      │
//! │  exact match is Matched; a one-cent gap is a real surplus/shortfall.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use cashdesk_core::money::Money;
//! use cashdesk_core::reconciliation::{ReconciliationPolicy, ReconciliationStatus};
//!
//! let policy = ReconciliationPolicy::default();
//! let rec = policy.reconcile(Money::from_cents(-15_000), Money::from_cents(15_000));
//! assert_eq!(rec.difference, Money::zero());
//! assert_eq!(rec.status, ReconciliationStatus::Matched);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// One cent.
pub const DEFAULT_TOLERANCE: Money = Money::from_cents(1);

/// Outcome of a cash count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Matched,
    Surplus,
    Shortfall,
}

impl std::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciliationStatus::Matched => write!(f, "matched"),
            ReconciliationStatus::Surplus => write!(f, "surplus"),
            ReconciliationStatus::Shortfall => write!(f, "shortfall"),
        }
    }
}

/// Full result of reconciling one count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub expected_cash: Money,
    pub counted_cash: Money,
    /// Signed: positive means more cash than expected.
    pub difference: Money,
    pub status: ReconciliationStatus,
}

/// Reconciliation rule with its matching tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationPolicy {
    tolerance: Money,
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        ReconciliationPolicy {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ReconciliationPolicy {
    /// Creates a policy with a custom tolerance.
    ///
    /// A tolerance of zero or less behaves like the default one cent: there
    /// is no amount smaller than a cent to absorb.
    pub fn with_tolerance(tolerance: Money) -> Self {
        let tolerance = if tolerance.is_positive() {
            tolerance
        } else {
            DEFAULT_TOLERANCE
        };
        ReconciliationPolicy { tolerance }
    }

    pub fn tolerance(&self) -> Money {
        self.tolerance
    }

    /// Reconciles a counted figure against the expected cash balance.
    ///
    /// Pure and deterministic: the same pair always yields the same result.
    /// The difference saturates at the i64 bounds rather than wrapping.
    pub fn reconcile(&self, expected_cash: Money, counted_cash: Money) -> Reconciliation {
        let difference = counted_cash.saturating_sub(expected_cash.saturating_abs());

        Reconciliation {
            expected_cash,
            counted_cash,
            difference,
            status: self.classify(difference),
        }
    }

    /// Classifies a signed difference.
    pub fn classify(&self, difference: Money) -> ReconciliationStatus {
        if difference.saturating_abs() < self.tolerance {
            ReconciliationStatus::Matched
        } else if difference.is_positive() {
            ReconciliationStatus::Surplus
        } else {
            ReconciliationStatus::Shortfall
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn exact_count_is_matched_with_zero_difference() {
        let rec = ReconciliationPolicy::default().reconcile(m(130_000), m(130_000));
        assert_eq!(rec.difference, Money::zero());
        assert_eq!(rec.status, ReconciliationStatus::Matched);
    }

    #[test]
    fn negative_expected_compares_against_magnitude() {
        let policy = ReconciliationPolicy::default();

        let rec = policy.reconcile(m(-15_000), m(15_000));
        assert_eq!(rec.difference, Money::zero());
        assert_eq!(rec.status, ReconciliationStatus::Matched);

        let rec = policy.reconcile(m(-15_000), m(10_000));
        assert_eq!(rec.difference, m(-5_000));
        assert_eq!(rec.status, ReconciliationStatus::Shortfall);
    }

    #[test]
    fn one_cent_boundaries() {
        let policy = ReconciliationPolicy::default();
        assert_eq!(
            policy.reconcile(m(1000), m(1001)).status,
            ReconciliationStatus::Surplus
        );
        assert_eq!(
            policy.reconcile(m(1000), m(999)).status,
            ReconciliationStatus::Shortfall
        );
        assert_eq!(
            policy.reconcile(m(1000), m(1002)).difference,
            m(2)
        );
    }

    #[test]
    fn wider_tolerance_absorbs_small_gaps() {
        let policy = ReconciliationPolicy::with_tolerance(m(50));
        assert_eq!(policy.classify(m(49)), ReconciliationStatus::Matched);
        assert_eq!(policy.classify(m(-49)), ReconciliationStatus::Matched);
        assert_eq!(policy.classify(m(50)), ReconciliationStatus::Surplus);
        assert_eq!(policy.classify(m(-50)), ReconciliationStatus::Shortfall);
    }

    #[test]
    fn non_positive_tolerance_falls_back_to_one_cent() {
        assert_eq!(
            ReconciliationPolicy::with_tolerance(Money::zero()).tolerance(),
            DEFAULT_TOLERANCE
        );
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let policy = ReconciliationPolicy::default();
        let first = policy.reconcile(m(-2_550), m(3_000));
        let second = policy.reconcile(m(-2_550), m(3_000));
        assert_eq!(first, second);
        assert_eq!(first.difference, m(450));
    }

    #[test]
    fn extreme_figures_saturate_instead_of_wrapping() {
        let policy = ReconciliationPolicy::default();
        let rec = policy.reconcile(m(i64::MIN), m(0));
        assert_eq!(rec.difference, m(-i64::MAX));
        assert_eq!(rec.status, ReconciliationStatus::Shortfall);

        let rec = policy.reconcile(m(i64::MAX), m(-10));
        assert_eq!(rec.difference, m(i64::MIN));
        assert_eq!(rec.status, ReconciliationStatus::Shortfall);
    }
}
