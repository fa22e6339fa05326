//! # Multi-Branch Aggregator
//!
//! Rolls several sessions (one per branch, open or historical) into
//! fleet-wide totals for dashboards.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionLedger(branch A, session 1, movements…) ──┐                     │
//! │  SessionLedger(branch A, session 2, movements…) ──┼─► filter ─► fold    │
//! │  SessionLedger(branch B, session 3, movements…) ──┘      │        │     │
//! │                                                          │        ▼     │
//! │                         branch ids / date range ─────────┘  BranchSummary│
//! │                                                              per branch  │
//! │                                                                 │       │
//! │                                                                 ▼       │
//! │                                                           FleetSummary  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every session goes through the same [`BalanceCalculator`] the closing
//! dialog uses. A movement is only counted under the session it belongs to,
//! and a session supplied twice is counted once.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::balance::{add, checked_total, BalanceCalculator};
use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{CashMovement, CashRegisterSession};

/// A session together with its ledger entries.
#[derive(Debug, Clone)]
pub struct SessionLedger {
    pub session: CashRegisterSession,
    pub movements: Vec<CashMovement>,
}

/// Which sessions and movements a summary covers.
#[derive(Debug, Clone, Default)]
pub struct AggregateFilter {
    /// Branches to report. `None` reports every branch present in the input.
    /// Requested branches without sessions are reported with zero totals.
    pub branch_ids: Option<Vec<String>>,
    /// Inclusive lower bound on session `opened_at` and movement `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on session `opened_at` and movement `created_at`.
    pub to: Option<DateTime<Utc>>,
}

impl AggregateFilter {
    /// Reports only the given branches.
    pub fn branches<I, S>(branch_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AggregateFilter {
            branch_ids: Some(branch_ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Restricts the summary to `[from, to)`.
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    fn in_range(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at < to)
    }

    fn wants_branch(&self, branch_id: &str) -> bool {
        self.branch_ids
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|id| id == branch_id))
    }
}

/// Totals for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BranchSummary {
    pub branch_id: String,
    pub session_count: usize,
    pub open_sessions: usize,
    pub expected_cash: Money,
    pub income: Money,
    pub expense: Money,
    pub movement_count: usize,
}

/// Fleet-wide totals with a per-branch breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FleetSummary {
    /// Σ expected cash balance of every included session.
    pub total_balance: Money,
    pub total_income: Money,
    pub total_expenses: Money,
    pub movement_count: usize,
    pub session_count: usize,
    /// Ordered by branch id.
    pub branches: Vec<BranchSummary>,
}

impl FleetSummary {
    pub fn branch(&self, branch_id: &str) -> Option<&BranchSummary> {
        self.branches.iter().find(|b| b.branch_id == branch_id)
    }
}

/// Builds fleet summaries.
#[derive(Debug, Clone, Copy)]
pub struct FleetAggregator<'a> {
    calculator: BalanceCalculator<'a>,
}

impl<'a> FleetAggregator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        FleetAggregator {
            calculator: BalanceCalculator::new(catalog),
        }
    }

    /// Aggregates the given sessions. Pure: no side effects.
    ///
    /// Fails with `Validation` (`Overflow`) if a fleet total leaves the i64
    /// cents range.
    pub fn summarize(
        &self,
        ledgers: &[SessionLedger],
        filter: &AggregateFilter,
    ) -> CoreResult<FleetSummary> {
        let mut branches: BTreeMap<String, BranchSummary> = BTreeMap::new();
        if let Some(ids) = &filter.branch_ids {
            for id in ids {
                branches.entry(id.clone()).or_insert_with(|| BranchSummary {
                    branch_id: id.clone(),
                    ..Default::default()
                });
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for ledger in ledgers {
            let session = &ledger.session;
            if !filter.wants_branch(&session.branch_id) || !filter.in_range(session.opened_at) {
                continue;
            }
            if !seen.insert(session.id.as_str()) {
                continue;
            }

            let movements: Vec<CashMovement> = ledger
                .movements
                .iter()
                .filter(|m| m.cash_register_id == session.id && filter.in_range(m.created_at))
                .cloned()
                .collect();
            let balance = self.calculator.summarize(session.initial_amount, &movements)?;

            let branch = branches
                .entry(session.branch_id.clone())
                .or_insert_with(|| BranchSummary {
                    branch_id: session.branch_id.clone(),
                    ..Default::default()
                });
            branch.session_count += 1;
            if session.is_open() {
                branch.open_sessions += 1;
            }
            branch.expected_cash = add(branch.expected_cash, balance.expected_cash_balance, "expected_cash")?;
            branch.income = add(branch.income, balance.total_income, "income")?;
            branch.expense = add(branch.expense, balance.total_expense, "expense")?;
            branch.movement_count += balance.movement_count;
        }

        let branches: Vec<BranchSummary> = branches.into_values().collect();
        Ok(FleetSummary {
            total_balance: checked_total(branches.iter().map(|b| b.expected_cash), "total_balance")?,
            total_income: checked_total(branches.iter().map(|b| b.income), "total_income")?,
            total_expenses: checked_total(branches.iter().map(|b| b.expense), "total_expenses")?,
            movement_count: branches.iter().map(|b| b.movement_count).sum(),
            session_count: branches.iter().map(|b| b.session_count).sum(),
            branches,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewMovement, SessionState};
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    fn session(id: &str, branch: &str, initial: i64, opened: DateTime<Utc>) -> CashRegisterSession {
        CashRegisterSession {
            id: id.to_string(),
            branch_id: branch.to_string(),
            user_id: "op".to_string(),
            initial_amount: Money::from_cents(initial),
            opened_at: opened,
            state: SessionState::Open,
        }
    }

    fn mv(session_id: &str, kind: i64, cents: i64, created: DateTime<Utc>) -> CashMovement {
        NewMovement::new(kind, 1, Money::from_cents(cents), "t").into_movement(
            format!("{session_id}-{kind}-{cents}"),
            session_id.to_string(),
            created,
        )
    }

    /// Branch A: 500.00 over 3 movements, branch B: 300.00 over 1.
    fn scenario_c() -> Vec<SessionLedger> {
        vec![
            SessionLedger {
                session: session("a1", "A", 10_000, at(2)),
                movements: vec![
                    mv("a1", 1, 30_000, at(2)),
                    mv("a1", 3, 20_000, at(2)),
                    mv("a1", 5, 10_000, at(2)),
                ],
            },
            SessionLedger {
                session: session("b1", "B", 0, at(2)),
                movements: vec![mv("b1", 1, 30_000, at(2))],
            },
        ]
    }

    #[test]
    fn two_branch_totals() {
        let catalog = Catalog::standard();
        let summary = FleetAggregator::new(&catalog)
            .summarize(&scenario_c(), &AggregateFilter::default())
            .unwrap();

        assert_eq!(summary.total_balance, Money::from_cents(80_000));
        assert_eq!(summary.movement_count, 4);
        assert_eq!(summary.branch("A").unwrap().expected_cash, Money::from_cents(50_000));
        assert_eq!(summary.branch("B").unwrap().expected_cash, Money::from_cents(30_000));
        assert_eq!(summary.total_income, Money::from_cents(80_000));
        assert_eq!(summary.total_expenses, Money::from_cents(10_000));
    }

    #[test]
    fn requested_branch_without_sessions_reports_zero() {
        let catalog = Catalog::standard();
        let summary = FleetAggregator::new(&catalog)
            .summarize(&scenario_c(), &AggregateFilter::branches(["A", "C"]))
            .unwrap();

        assert_eq!(summary.branches.len(), 2);
        let c = summary.branch("C").unwrap();
        assert_eq!(c.session_count, 0);
        assert_eq!(c.expected_cash, Money::zero());
        assert_eq!(summary.total_balance, Money::from_cents(50_000));
        assert!(summary.branch("B").is_none());
    }

    #[test]
    fn foreign_and_duplicate_entries_are_not_double_counted() {
        let mut ledgers = scenario_c();
        // A movement of b1 accidentally supplied with a1
        ledgers[0].movements.push(mv("b1", 1, 99_900, at(2)));
        // The same session supplied twice
        ledgers.push(ledgers[1].clone());

        let catalog = Catalog::standard();
        let summary = FleetAggregator::new(&catalog)
            .summarize(&ledgers, &AggregateFilter::default())
            .unwrap();
        assert_eq!(summary.total_balance, Money::from_cents(80_000));
        assert_eq!(summary.movement_count, 4);
        assert_eq!(summary.session_count, 2);
    }

    #[test]
    fn date_range_filters_sessions_and_movements() {
        let mut ledgers = scenario_c();
        ledgers[1].session.opened_at = at(10);
        ledgers[1].movements[0].created_at = at(10);
        ledgers[0].movements[2].created_at = at(2) + Duration::days(3);

        let filter = AggregateFilter::default().between(at(1), at(4));
        let catalog = Catalog::standard();
        let summary = FleetAggregator::new(&catalog)
            .summarize(&ledgers, &filter)
            .unwrap();

        // a1 without its expense (outside range), b1 excluded entirely
        assert_eq!(summary.total_balance, Money::from_cents(60_000));
        assert_eq!(summary.movement_count, 2);
        assert!(summary.branch("B").is_none());
    }

    #[test]
    fn fleet_totals_past_the_i64_range_are_an_error() {
        let half = i64::MAX / 2 + 1;
        let ledgers = vec![
            SessionLedger {
                session: session("a1", "A", half, at(2)),
                movements: vec![],
            },
            SessionLedger {
                session: session("b1", "B", half, at(2)),
                movements: vec![],
            },
        ];

        let catalog = Catalog::standard();
        let err = FleetAggregator::new(&catalog)
            .summarize(&ledgers, &AggregateFilter::default())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Validation(crate::error::ValidationError::Overflow { .. })
        ));
    }
}
