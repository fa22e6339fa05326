//! # Balance Calculator
//!
//! The single fold that turns a session's ledger into totals. The closing
//! dialog, historical reports and the multi-branch dashboard all go through
//! [`BalanceCalculator::summarize`], so they cannot disagree.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  movements ──► skip affects_balance = false                             │
//! │            ──► skip types that never touch a register                   │
//! │            ──► group by payment method                                  │
//! │                   income  = Σ entrada                                   │
//! │                   expense = Σ salida                                    │
//! │                   net     = income − expense                            │
//! │            ──► cash method net += initial_amount                        │
//! │            ──► expected_cash_balance = cash method net                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A negative expected balance is a legitimate state (more went out than
//! came in) and is reported as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CashMovement, OperationType};

/// Totals for one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodBalance {
    pub payment_method_id: i64,
    pub name: String,
    pub is_cash: bool,
    pub income: Money,
    pub expense: Money,
    /// `income − expense`, plus the opening amount for the cash method.
    pub net: Money,
}

/// Result of folding a session's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionBalance {
    pub initial_amount: Money,
    /// One entry per payment method that saw movements, ordered by id. The
    /// cash method is always present when the catalog defines one.
    pub methods: Vec<MethodBalance>,
    pub expected_cash_balance: Money,
    /// Entrada totals across every payment method.
    pub total_income: Money,
    /// Salida totals across every payment method.
    pub total_expense: Money,
    /// Ledger entries supplied for the session, informational ones included.
    pub movement_count: usize,
    /// Entries that actually moved a total.
    pub counted_movements: usize,
}

impl SessionBalance {
    /// Looks up a method's totals by display name.
    pub fn method(&self, name: &str) -> Option<&MethodBalance> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Folds ledgers against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct BalanceCalculator<'a> {
    catalog: &'a Catalog,
}

impl<'a> BalanceCalculator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        BalanceCalculator { catalog }
    }

    /// Aggregates a session's movements.
    ///
    /// ## Errors
    /// `NotFound` if a movement references a movement type or payment method
    /// the catalog does not know. That is a data inconsistency, and silently
    /// skipping the entry would hide money.
    ///
    /// `Validation` (`Overflow`) if a total leaves the i64 cents range.
    ///
    /// ## Example
    /// ```rust
    /// use cashdesk_core::balance::BalanceCalculator;
    /// use cashdesk_core::catalog::Catalog;
    /// use cashdesk_core::{Money, NewMovement};
    /// use chrono::Utc;
    ///
    /// let catalog = Catalog::standard();
    /// let sale = NewMovement::new(1, 1, Money::from_cents(50_000), "sale")
    ///     .into_movement("m1".into(), "s1".into(), Utc::now());
    /// let expense = NewMovement::new(5, 1, Money::from_cents(20_000), "supplies")
    ///     .into_movement("m2".into(), "s1".into(), Utc::now());
    ///
    /// let balance = BalanceCalculator::new(&catalog)
    ///     .summarize(Money::from_cents(100_000), &[sale, expense])
    ///     .unwrap();
    /// assert_eq!(balance.expected_cash_balance, Money::from_cents(130_000));
    /// ```
    pub fn summarize(
        &self,
        initial_amount: Money,
        movements: &[CashMovement],
    ) -> CoreResult<SessionBalance> {
        let mut groups: BTreeMap<i64, (Money, Money)> = BTreeMap::new();
        let mut counted_movements = 0;

        for movement in movements {
            let kind = self
                .catalog
                .movement_type(movement.movement_type_id)
                .ok_or_else(|| CoreError::not_found("Movement type", movement.movement_type_id))?;
            if self.catalog.payment_method(movement.payment_method_id).is_none() {
                return Err(CoreError::not_found(
                    "Payment method",
                    movement.payment_method_id,
                ));
            }

            if !movement.affects_balance || !kind.is_cash_movement {
                continue;
            }

            let (income, expense) = groups.entry(movement.payment_method_id).or_default();
            match kind.operation_type {
                OperationType::Entrada => *income = add(*income, movement.amount, "income")?,
                OperationType::Salida => *expense = add(*expense, movement.amount, "expense")?,
            }
            counted_movements += 1;
        }

        let cash_method = self.catalog.cash_method();
        if let Some(cash) = cash_method {
            groups.entry(cash.id).or_default();
        }

        let mut methods = Vec::with_capacity(groups.len());
        let mut expected_cash_balance = initial_amount;
        for (id, (income, expense)) in groups {
            // Presence was checked in the fold above.
            let Some(method) = self.catalog.payment_method(id) else {
                continue;
            };
            let mut net = income
                .checked_sub(expense)
                .ok_or_else(|| overflow("net"))?;
            if method.is_cash {
                net = add(net, initial_amount, "expected_cash_balance")?;
                expected_cash_balance = net;
            }
            methods.push(MethodBalance {
                payment_method_id: id,
                name: method.name.clone(),
                is_cash: method.is_cash,
                income,
                expense,
                net,
            });
        }

        let total_income = checked_total(methods.iter().map(|m| m.income), "total_income")?;
        let total_expense = checked_total(methods.iter().map(|m| m.expense), "total_expense")?;

        Ok(SessionBalance {
            initial_amount,
            total_income,
            total_expense,
            methods,
            expected_cash_balance,
            movement_count: movements.len(),
            counted_movements,
        })
    }
}

pub(crate) fn overflow(field: &str) -> CoreError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
    .into()
}

pub(crate) fn add(a: Money, b: Money, field: &str) -> CoreResult<Money> {
    a.checked_add(b).ok_or_else(|| overflow(field))
}

pub(crate) fn checked_total<I>(amounts: I, field: &str) -> CoreResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    amounts
        .into_iter()
        .try_fold(Money::zero(), |acc, amount| add(acc, amount, field))
}

// =============================================================================
// Unit Tests
// =============================================================================
