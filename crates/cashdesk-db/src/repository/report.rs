//! # Report Repository
//!
//! Read paths for the reporting console. Nothing here writes.
//!
//! Every figure is recomputed from the stored ledger through the same
//! [`BalanceCalculator`] the close uses; the snapshot written at close time
//! is returned alongside for comparison, never trusted on its own.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use cashdesk_core::{
    AggregateFilter, BalanceCalculator, CashRegisterSession, FleetAggregator, FleetSummary,
    Reconciliation, ReconciliationPolicy, SessionBalance, SessionLedger,
};

use crate::error::{DbError, DbResult};
use crate::repository::catalog::load_catalog;
use crate::repository::movement::fetch_for_session;
use crate::repository::session::{fetch_for_branches, fetch_session};

/// A session's figures, recomputed from its ledger.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session: CashRegisterSession,
    pub balance: SessionBalance,
    /// Counted cash against the recomputed expectation. `None` while open.
    pub reconciliation: Option<Reconciliation>,
}

impl SessionReport {
    /// Whether the ledger no longer agrees with what was stored at close
    /// (e.g. a movement was deleted afterwards).
    pub fn differs_from_snapshot(&self) -> bool {
        match (self.session.closure(), &self.reconciliation) {
            (Some(closure), Some(rec)) => {
                closure.expected_cash != rec.expected_cash
                    || closure.difference != rec.difference
                    || closure.classification != rec.status
            }
            _ => false,
        }
    }
}

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    policy: ReconciliationPolicy,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool, policy: ReconciliationPolicy) -> Self {
        ReportRepository { pool, policy }
    }

    /// Balance (and, once closed, reconciliation) of one session.
    pub async fn session_report(&self, session_id: &str) -> DbResult<SessionReport> {
        // One read transaction so session and ledger come from the same state
        let mut tx = self.pool.begin().await?;

        let session = fetch_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cash register session", session_id))?;
        let catalog = load_catalog(&mut tx).await?;
        let movements = fetch_for_session(&mut tx, session_id).await?;

        tx.commit().await?;

        let balance = BalanceCalculator::new(&catalog).summarize(session.initial_amount, &movements)?;
        let reconciliation = session
            .closure()
            .map(|closure| self.policy.reconcile(balance.expected_cash_balance, closure.final_amount));

        Ok(SessionReport {
            session,
            balance,
            reconciliation,
        })
    }

    /// Fleet-wide totals for the dashboard.
    ///
    /// Sessions are restricted by branch in SQL; the date range and the
    /// per-session movement filtering happen in [`FleetAggregator`].
    pub async fn fleet_summary(&self, filter: &AggregateFilter) -> DbResult<FleetSummary> {
        let mut tx = self.pool.begin().await?;

        let catalog = load_catalog(&mut tx).await?;
        let sessions = fetch_for_branches(&mut tx, filter.branch_ids.as_deref()).await?;

        let mut ledgers = Vec::with_capacity(sessions.len());
        for session in sessions {
            let movements = fetch_for_session(&mut tx, &session.id).await?;
            ledgers.push(SessionLedger { session, movements });
        }

        tx.commit().await?;

        debug!(sessions = ledgers.len(), "Building fleet summary");
        Ok(FleetAggregator::new(&catalog).summarize(&ledgers, filter)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use cashdesk_core::{AggregateFilter, ErrorKind, Money, NewMovement, ReconciliationStatus};
    use chrono::{Duration, Utc};

    const SALE: i64 = 1;
    const CASH_IN: i64 = 3;
    const EXPENSE: i64 = 5;
    const CASH: i64 = 1;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().seed_standard("Efectivo").await.unwrap();
        db
    }

    fn cash(kind: i64, cents: i64) -> NewMovement {
        NewMovement::new(kind, CASH, Money::from_cents(cents), "test")
    }

    #[tokio::test]
    async fn test_open_session_report() {
        let db = setup().await;
        let session = db
            .sessions()
            .open("north", "op-1", Money::from_cents(100_000))
            .await
            .unwrap();
        db.movements().record(&session.id, cash(SALE, 50_000)).await.unwrap();
        db.movements().record(&session.id, cash(EXPENSE, 20_000)).await.unwrap();
        db.movements()
            .record(&session.id, cash(CASH_IN, 7_777).informational())
            .await
            .unwrap();

        let report = db.reports().session_report(&session.id).await.unwrap();
        assert_eq!(report.balance.expected_cash_balance, Money::from_cents(130_000));
        assert_eq!(report.balance.movement_count, 3);
        assert_eq!(report.balance.counted_movements, 2);
        assert!(report.reconciliation.is_none());
        assert!(!report.differs_from_snapshot());

        let missing = db.reports().session_report("nope").await.unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_report_is_idempotent() {
        let db = setup().await;
        let session = db
            .sessions()
            .open("north", "op-1", Money::from_cents(1_000))
            .await
            .unwrap();
        db.movements().record(&session.id, cash(SALE, 2_500)).await.unwrap();
        db.sessions()
            .close(&session.id, Money::from_cents(3_400), None)
            .await
            .unwrap();

        let first = db.reports().session_report(&session.id).await.unwrap();
        let second = db.reports().session_report(&session.id).await.unwrap();
        assert_eq!(first.reconciliation, second.reconciliation);
        assert_eq!(first.balance, second.balance);

        assert!(!first.differs_from_snapshot());
        let rec = first.reconciliation.unwrap();
        assert_eq!(rec.difference, Money::from_cents(-100));
        assert_eq!(rec.status, ReconciliationStatus::Shortfall);
    }

    #[tokio::test]
    async fn test_delete_after_close_changes_recomputed_report() {
        let db = setup().await;
        let session = db
            .sessions()
            .open("north", "op-1", Money::from_cents(10_000))
            .await
            .unwrap();
        let sale = db.movements().record(&session.id, cash(SALE, 5_000)).await.unwrap();
        let closed = db
            .sessions()
            .close(&session.id, Money::from_cents(15_000), None)
            .await
            .unwrap();
        assert_eq!(closed.reconciliation.status, ReconciliationStatus::Matched);

        db.movements()
            .delete(&sale.id, "supervisor", "sale was voided")
            .await
            .unwrap();

        let report = db.reports().session_report(&session.id).await.unwrap();
        assert_eq!(report.balance.expected_cash_balance, Money::from_cents(10_000));
        let rec = report.reconciliation.clone().unwrap();
        assert_eq!(rec.difference, Money::from_cents(5_000));
        assert_eq!(rec.status, ReconciliationStatus::Surplus);
        assert!(report.differs_from_snapshot());

        // The stored snapshot is left as it was at close
        let closure = report.session.closure().unwrap();
        assert_eq!(closure.expected_cash, Money::from_cents(15_000));
        assert_eq!(closure.classification, ReconciliationStatus::Matched);
    }

    #[tokio::test]
    async fn test_fleet_summary_scenario_c() {
        let db = setup().await;
        let a = db
            .sessions()
            .open("A", "op-a", Money::from_cents(10_000))
            .await
            .unwrap();
        let b = db
            .sessions()
            .open("B", "op-b", Money::zero())
            .await
            .unwrap();

        db.movements().record(&a.id, cash(SALE, 30_000)).await.unwrap();
        db.movements().record(&a.id, cash(CASH_IN, 20_000)).await.unwrap();
        db.movements().record(&a.id, cash(EXPENSE, 10_000)).await.unwrap();
        db.movements().record(&b.id, cash(SALE, 30_000)).await.unwrap();

        let summary = db
            .reports()
            .fleet_summary(&AggregateFilter::default())
            .await
            .unwrap();
        assert_eq!(summary.total_balance, Money::from_cents(80_000));
        assert_eq!(summary.movement_count, 4);
        assert_eq!(summary.branch("A").unwrap().movement_count, 3);
        assert_eq!(summary.branch("B").unwrap().expected_cash, Money::from_cents(30_000));
        assert_eq!(summary.branch("A").unwrap().open_sessions, 1);

        let subset = db
            .reports()
            .fleet_summary(&AggregateFilter::branches(["B", "C"]))
            .await
            .unwrap();
        assert_eq!(subset.total_balance, Money::from_cents(30_000));
        assert_eq!(subset.branch("C").unwrap().session_count, 0);
        assert!(subset.branch("A").is_none());

        let future = AggregateFilter::default()
            .between(Utc::now() + Duration::days(1), Utc::now() + Duration::days(2));
        let empty = db.reports().fleet_summary(&future).await.unwrap();
        assert_eq!(empty.session_count, 0);
        assert_eq!(empty.total_balance, Money::zero());
    }

    #[tokio::test]
    async fn test_fleet_summary_includes_history() {
        let db = setup().await;
        let old = db
            .sessions()
            .open("A", "op-a", Money::from_cents(1_000))
            .await
            .unwrap();
        db.sessions().close(&old.id, Money::from_cents(1_000), None).await.unwrap();
        db.sessions()
            .open("A", "op-a", Money::from_cents(2_000))
            .await
            .unwrap();

        let summary = db
            .reports()
            .fleet_summary(&AggregateFilter::branches(["A"]))
            .await
            .unwrap();
        let a = summary.branch("A").unwrap();
        assert_eq!(a.session_count, 2);
        assert_eq!(a.open_sessions, 1);
        assert_eq!(a.expected_cash, Money::from_cents(3_000));
    }
}
