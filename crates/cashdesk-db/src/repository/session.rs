//! # Session Repository
//!
//! Opening, closing and looking up cash register sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open() → status = 'open'                                       │
//! │         partial unique index: one open session per branch              │
//! │         (a racing second open fails the index → Conflict)              │
//! │                                                                         │
//! │  2. RECORD (movement repository)                                       │
//! │     └── record() → conditional INSERT, only while open                 │
//! │                                                                         │
//! │  3. CLOSE (single transaction)                                         │
//! │     ├── UPDATE ... SET status = 'closed' WHERE status = 'open'         │
//! │     │     (takes the write lock: no movement can slip in after)        │
//! │     ├── read movements, BalanceCalculator, ReconciliationPolicy        │
//! │     └── write expected / difference / classification snapshot         │
//! │                                                                         │
//! │  Closed is terminal. Amounts are never updated in place afterwards.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use cashdesk_core::validation::{
    validate_counted_cash, validate_initial_amount, validate_notes, validate_reference,
};
use cashdesk_core::{
    BalanceCalculator, CashRegisterSession, Closure, CoreError, Money, Reconciliation,
    ReconciliationPolicy, ReconciliationStatus, RegisterStatus, SessionBalance, SessionState,
};

use crate::error::{DbError, DbResult};
use crate::repository::catalog::load_catalog;
use crate::repository::movement::fetch_for_session;
use crate::repository::BEGIN_WRITE;

/// Storage shape of a session.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SessionRow {
    id: String,
    branch_id: String,
    user_id: String,
    initial_amount_cents: i64,
    opened_at: DateTime<Utc>,
    status: RegisterStatus,
    final_amount_cents: Option<i64>,
    closed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    expected_cash_cents: Option<i64>,
    difference_cents: Option<i64>,
    classification: Option<ReconciliationStatus>,
}

impl TryFrom<SessionRow> for CashRegisterSession {
    type Error = DbError;

    fn try_from(row: SessionRow) -> DbResult<Self> {
        let state = match row.status {
            RegisterStatus::Open => SessionState::Open,
            RegisterStatus::Closed => {
                let (
                    Some(final_amount),
                    Some(closed_at),
                    Some(expected_cash),
                    Some(difference),
                    Some(classification),
                ) = (
                    row.final_amount_cents,
                    row.closed_at,
                    row.expected_cash_cents,
                    row.difference_cents,
                    row.classification,
                )
                else {
                    return Err(DbError::corrupt(
                        "cash_register_sessions",
                        format!("closed session {} without closing snapshot", row.id),
                    ));
                };
                SessionState::Closed(Closure {
                    final_amount: Money::from_cents(final_amount),
                    closed_at,
                    expected_cash: Money::from_cents(expected_cash),
                    difference: Money::from_cents(difference),
                    classification,
                    notes: row.notes,
                })
            }
        };

        Ok(CashRegisterSession {
            id: row.id,
            branch_id: row.branch_id,
            user_id: row.user_id,
            initial_amount: Money::from_cents(row.initial_amount_cents),
            opened_at: row.opened_at,
            state,
        })
    }
}

const SESSION_COLUMNS: &str = r#"
    id,
    branch_id,
    user_id,
    initial_amount_cents,
    opened_at,
    status,
    final_amount_cents,
    closed_at,
    notes,
    expected_cash_cents,
    difference_cents,
    classification
"#;

/// Everything the closing dialog shows.
#[derive(Debug, Clone, Serialize)]
pub struct SessionClose {
    /// The session, now closed.
    pub session: CashRegisterSession,
    /// Per-method breakdown the expected figure came from.
    pub balance: SessionBalance,
    pub reconciliation: Reconciliation,
}

/// Repository for session lifecycle operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
    policy: ReconciliationPolicy,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool, policy: ReconciliationPolicy) -> Self {
        SessionRepository { pool, policy }
    }

    /// Opens a register for a branch.
    ///
    /// ## Errors
    /// - `Validation` for a blank branch/operator or a negative amount
    /// - `Conflict` if the branch already has an open session
    pub async fn open(
        &self,
        branch_id: &str,
        user_id: &str,
        initial_amount: Money,
    ) -> DbResult<CashRegisterSession> {
        validate_reference("branch_id", branch_id)?;
        validate_reference("user_id", user_id)?;
        validate_initial_amount(initial_amount)?;

        let branch_id = branch_id.trim();
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        if let Some(existing) = fetch_open_for_branch(&mut tx, branch_id).await? {
            return Err(conflict(branch_id, Some(existing.id)));
        }

        let session = CashRegisterSession {
            id: Uuid::new_v4().to_string(),
            branch_id: branch_id.to_string(),
            user_id: user_id.trim().to_string(),
            initial_amount,
            opened_at: Utc::now(),
            state: SessionState::Open,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO cash_register_sessions (
                id, branch_id, user_id, initial_amount_cents, opened_at, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'open')
            "#,
        )
        .bind(&session.id)
        .bind(&session.branch_id)
        .bind(&session.user_id)
        .bind(session.initial_amount.cents())
        .bind(session.opened_at)
        .execute(&mut *tx)
        .await;

        // Another connection may have opened the branch since the check.
        if let Err(err) = inserted {
            let err = DbError::from(err);
            return Err(if err.is_open_session_conflict() {
                conflict(branch_id, None)
            } else {
                err
            });
        }

        tx.commit().await?;

        info!(
            session_id = %session.id,
            branch_id = %session.branch_id,
            user_id = %session.user_id,
            initial_amount = %session.initial_amount,
            "Cash register opened"
        );

        Ok(session)
    }

    /// Closes a session and reconciles the counted cash.
    ///
    /// ## Errors
    /// - `Validation` if `counted_cash` is negative or notes are too long
    /// - `NotFound` if the session does not exist
    /// - `InvalidState` if it is already closed
    pub async fn close(
        &self,
        session_id: &str,
        counted_cash: Money,
        notes: Option<&str>,
    ) -> DbResult<SessionClose> {
        validate_counted_cash(counted_cash)?;
        let notes = validate_notes(notes)?;

        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let mut session = fetch_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cash register session", session_id))?;
        if !session.is_open() {
            return Err(CoreError::invalid_state(session_id, session.status().to_string(), "close").into());
        }

        let closed_at = Utc::now();
        let flipped = sqlx::query(
            r#"
            UPDATE cash_register_sessions SET
                status = 'closed',
                final_amount_cents = ?2,
                closed_at = ?3,
                notes = ?4
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(session_id)
        .bind(counted_cash.cents())
        .bind(closed_at)
        .bind(&notes)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return Err(CoreError::invalid_state(session_id, "closed", "close").into());
        }

        let catalog = load_catalog(&mut tx).await?;
        let movements = fetch_for_session(&mut tx, session_id).await?;
        let balance = BalanceCalculator::new(&catalog).summarize(session.initial_amount, &movements)?;
        let reconciliation = self.policy.reconcile(balance.expected_cash_balance, counted_cash);

        sqlx::query(
            r#"
            UPDATE cash_register_sessions SET
                expected_cash_cents = ?2,
                difference_cents = ?3,
                classification = ?4
            WHERE id = ?1
            "#,
        )
        .bind(session_id)
        .bind(reconciliation.expected_cash.cents())
        .bind(reconciliation.difference.cents())
        .bind(reconciliation.status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        session.close_with(&reconciliation, closed_at, notes);

        if reconciliation.status == ReconciliationStatus::Matched {
            info!(
                session_id = %session_id,
                expected = %reconciliation.expected_cash,
                counted = %reconciliation.counted_cash,
                "Cash register closed"
            );
        } else {
            warn!(
                session_id = %session_id,
                expected = %reconciliation.expected_cash,
                counted = %reconciliation.counted_cash,
                difference = %reconciliation.difference,
                classification = %reconciliation.status,
                "Cash register closed with a difference"
            );
        }

        Ok(SessionClose {
            session,
            balance,
            reconciliation,
        })
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashRegisterSession>> {
        let mut conn = self.pool.acquire().await?;
        fetch_session(&mut conn, id).await
    }

    /// The branch's open session, if any.
    pub async fn current_for_branch(&self, branch_id: &str) -> DbResult<Option<CashRegisterSession>> {
        let mut conn = self.pool.acquire().await?;
        fetch_open_for_branch(&mut conn, branch_id.trim()).await
    }

    /// A branch's sessions, newest first.
    pub async fn list_for_branch(
        &self,
        branch_id: &str,
        limit: u32,
    ) -> DbResult<Vec<CashRegisterSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_register_sessions
             WHERE branch_id = ?1
             ORDER BY opened_at DESC, rowid DESC
             LIMIT ?2"
        );
        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(branch_id.trim())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CashRegisterSession::try_from).collect()
    }

    /// Every currently open session, ordered by branch.
    pub async fn list_open(&self) -> DbResult<Vec<CashRegisterSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_register_sessions
             WHERE status = 'open'
             ORDER BY branch_id"
        );
        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CashRegisterSession::try_from).collect()
    }
}

fn conflict(branch_id: &str, open_session_id: Option<String>) -> DbError {
    CoreError::Conflict {
        branch_id: branch_id.to_string(),
        open_session_id,
    }
    .into()
}

pub(crate) async fn fetch_session(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<CashRegisterSession>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM cash_register_sessions WHERE id = ?1");
    let row = sqlx::query_as::<_, SessionRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(CashRegisterSession::try_from).transpose()
}

async fn fetch_open_for_branch(
    conn: &mut SqliteConnection,
    branch_id: &str,
) -> DbResult<Option<CashRegisterSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM cash_register_sessions WHERE branch_id = ?1 AND status = 'open'"
    );
    let row = sqlx::query_as::<_, SessionRow>(&sql)
        .bind(branch_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(CashRegisterSession::try_from).transpose()
}

/// Loads sessions for the fleet summary, optionally restricted to branches.
pub(crate) async fn fetch_for_branches(
    conn: &mut SqliteConnection,
    branch_ids: Option<&[String]>,
) -> DbResult<Vec<CashRegisterSession>> {
    let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
        "SELECT {SESSION_COLUMNS} FROM cash_register_sessions"
    ));

    if let Some(ids) = branch_ids {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        builder.push(" WHERE branch_id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");
    }
    builder.push(" ORDER BY branch_id, opened_at");

    let rows: Vec<SessionRow> = builder.build_query_as().fetch_all(&mut *conn).await?;
    rows.into_iter().map(CashRegisterSession::try_from).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
