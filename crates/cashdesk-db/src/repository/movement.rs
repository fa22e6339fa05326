//! # Movement Repository
//!
//! The cash movement ledger: append-only, with audited deletion.
//!
//! ## Record Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record(session_id, NewMovement)                      │
//! │                                                                         │
//! │  1. validate amount / description / links        (no I/O)              │
//! │  2. BEGIN                                                              │
//! │  3. resolve movement type + payment method in the catalog              │
//! │  4. INSERT INTO cash_movements ... SELECT ...                          │
//! │       WHERE EXISTS (session id = ? AND status = 'open')                │
//! │       │                                                                 │
//! │       ├── 1 row  ──► COMMIT                                            │
//! │       └── 0 rows ──► session missing → NotFound                        │
//! │                      session closed  → InvalidState                    │
//! │                                                                         │
//! │  A close that committed first makes the EXISTS fail, so no movement    │
//! │  can land after a reconciliation snapshot.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deletion
//! Removing an entry is privileged: the deleted row is serialized to JSON
//! into `movement_audit_log` in the same transaction, with the actor and the
//! reason. Balances are never stored, so the next read simply recomputes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use cashdesk_core::validation::{validate_new_movement, validate_reference};
use cashdesk_core::{
    CashMovement, CoreError, Money, NewMovement, RegisterStatus, ValidationError, MAX_NOTES_LEN,
};

use crate::error::{DbError, DbResult};
use crate::repository::catalog::load_catalog;
use crate::repository::BEGIN_WRITE;

/// Storage shape of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MovementRow {
    id: String,
    cash_register_id: String,
    movement_type_id: i64,
    payment_method_id: i64,
    amount_cents: i64,
    description: String,
    sale_id: Option<String>,
    purchase_order_id: Option<String>,
    affects_balance: bool,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for CashMovement {
    fn from(row: MovementRow) -> Self {
        CashMovement {
            id: row.id,
            cash_register_id: row.cash_register_id,
            movement_type_id: row.movement_type_id,
            payment_method_id: row.payment_method_id,
            amount: Money::from_cents(row.amount_cents),
            description: row.description,
            sale_id: row.sale_id,
            purchase_order_id: row.purchase_order_id,
            affects_balance: row.affects_balance,
            created_at: row.created_at,
        }
    }
}

const MOVEMENT_COLUMNS: &str = r#"
    id,
    cash_register_id,
    movement_type_id,
    payment_method_id,
    amount_cents,
    description,
    sale_id,
    purchase_order_id,
    affects_balance,
    created_at
"#;

/// A deleted movement, as kept in the audit log.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovementAuditEntry {
    pub id: String,
    pub movement_id: String,
    pub cash_register_id: String,
    pub action: String,
    pub actor: String,
    pub reason: String,
    /// JSON of the movement as it was before deletion.
    pub snapshot: String,
    pub created_at: DateTime<Utc>,
}

impl MovementAuditEntry {
    /// Decodes the stored snapshot.
    pub fn movement(&self) -> DbResult<CashMovement> {
        Ok(serde_json::from_str(&self.snapshot)?)
    }
}

/// Repository for ledger operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Records a movement against an open session.
    ///
    /// ## Errors
    /// - `Validation` for a bad amount, unknown/inactive catalog reference,
    ///   or both `sale_id` and `purchase_order_id`
    /// - `NotFound` if the session does not exist
    /// - `InvalidState` if the session is closed
    pub async fn record(&self, session_id: &str, movement: NewMovement) -> DbResult<CashMovement> {
        validate_new_movement(&movement)?;

        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;
        let recorded = insert_into_open_session(&mut tx, session_id, movement).await?;
        tx.commit().await?;

        Ok(recorded)
    }

    /// Records a movement against the branch's currently open session.
    ///
    /// ## Errors
    /// Same as [`record`](Self::record), plus `InvalidState` when the branch
    /// has no open session.
    pub async fn record_for_branch(
        &self,
        branch_id: &str,
        movement: NewMovement,
    ) -> DbResult<CashMovement> {
        validate_reference("branch_id", branch_id)?;
        validate_new_movement(&movement)?;

        let branch_id = branch_id.trim();
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let session_id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM cash_register_sessions WHERE branch_id = ?1 AND status = 'open'",
        )
        .bind(branch_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(session_id) = session_id else {
            return Err(CoreError::invalid_state(
                format!("of branch {branch_id}"),
                "missing",
                "record movement",
            )
            .into());
        };

        let recorded = insert_into_open_session(&mut tx, &session_id, movement).await?;
        tx.commit().await?;

        Ok(recorded)
    }

    /// Gets a movement by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashMovement>> {
        let mut conn = self.pool.acquire().await?;
        fetch_movement(&mut conn, id).await
    }

    /// Lists a session's movements in the order they were recorded.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_session(&mut conn, session_id).await
    }

    /// Deletes a movement, keeping an audit row.
    ///
    /// Works on open and closed sessions alike. A closed session's stored
    /// snapshot is not rewritten; reports recompute from what remains.
    ///
    /// ## Returns
    /// The deleted movement.
    pub async fn delete(&self, movement_id: &str, actor: &str, reason: &str) -> DbResult<CashMovement> {
        validate_reference("actor", actor)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::Required {
                field: "reason".to_string(),
            }
            .into());
        }
        if reason.chars().count() > MAX_NOTES_LEN {
            return Err(ValidationError::TooLong {
                field: "reason".to_string(),
                max: MAX_NOTES_LEN,
            }
            .into());
        }

        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let movement = fetch_movement(&mut tx, movement_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cash movement", movement_id))?;
        let snapshot = serde_json::to_string(&movement)?;

        sqlx::query(
            r#"
            INSERT INTO movement_audit_log (
                id, movement_id, cash_register_id, action,
                actor, reason, snapshot, created_at
            ) VALUES (?1, ?2, ?3, 'delete', ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&movement.id)
        .bind(&movement.cash_register_id)
        .bind(actor)
        .bind(reason)
        .bind(&snapshot)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cash_movements WHERE id = ?1")
            .bind(&movement.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        warn!(
            movement_id = %movement.id,
            session_id = %movement.cash_register_id,
            amount = %movement.amount,
            actor = %actor,
            reason = %reason,
            "Cash movement deleted"
        );

        Ok(movement)
    }

    /// Audit rows for a session, oldest first.
    pub async fn audit_log(&self, session_id: &str) -> DbResult<Vec<MovementAuditEntry>> {
        let entries = sqlx::query_as::<_, MovementAuditEntry>(
            r#"
            SELECT id, movement_id, cash_register_id, action, actor, reason, snapshot, created_at
            FROM movement_audit_log
            WHERE cash_register_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

/// Resolves the catalog references and inserts the entry only if the session
/// is open, all on the caller's transaction.
async fn insert_into_open_session(
    conn: &mut SqliteConnection,
    session_id: &str,
    movement: NewMovement,
) -> DbResult<CashMovement> {
    let catalog = load_catalog(conn).await?;
    let (kind, method) = catalog.resolve(&movement)?;
    let (kind_name, method_name) = (kind.name.clone(), method.name.clone());

    let entry = movement.into_movement(Uuid::new_v4().to_string(), session_id.to_string(), Utc::now());

    let result = sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, cash_register_id, movement_type_id, payment_method_id,
            amount_cents, description, sale_id, purchase_order_id,
            affects_balance, created_at
        )
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
        WHERE EXISTS (
            SELECT 1 FROM cash_register_sessions WHERE id = ?2 AND status = 'open'
        )
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.cash_register_id)
    .bind(entry.movement_type_id)
    .bind(entry.payment_method_id)
    .bind(entry.amount.cents())
    .bind(&entry.description)
    .bind(&entry.sale_id)
    .bind(&entry.purchase_order_id)
    .bind(entry.affects_balance)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let status: Option<RegisterStatus> =
            sqlx::query_scalar("SELECT status FROM cash_register_sessions WHERE id = ?1")
                .bind(session_id)
                .fetch_optional(&mut *conn)
                .await?;

        return Err(match status {
            None => DbError::not_found("Cash register session", session_id),
            Some(status) => {
                CoreError::invalid_state(session_id, status.to_string(), "record movement").into()
            }
        });
    }

    info!(
        movement_id = %entry.id,
        session_id = %session_id,
        kind = %kind_name,
        method = %method_name,
        amount = %entry.amount,
        "Cash movement recorded"
    );

    Ok(entry)
}

pub(crate) async fn fetch_movement(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<CashMovement>> {
    let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM cash_movements WHERE id = ?1");
    let row = sqlx::query_as::<_, MovementRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(CashMovement::from))
}

pub(crate) async fn fetch_for_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Vec<CashMovement>> {
    let sql = format!(
        "SELECT {MOVEMENT_COLUMNS} FROM cash_movements WHERE cash_register_id = ?1 ORDER BY created_at, rowid"
    );
    let rows = sqlx::query_as::<_, MovementRow>(&sql)
        .bind(session_id)
        .fetch_all(&mut *conn)
        .await?;

    debug!(session_id = %session_id, count = rows.len(), "Movements loaded");
    Ok(rows.into_iter().map(CashMovement::from).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use cashdesk_core::{ErrorKind, Money, NewMovement};

    const SALE: i64 = 1;
    const CASH_IN: i64 = 3;
    const CASH: i64 = 1;
    const CARD: i64 = 2;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().seed_standard("Efectivo").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let db = setup().await;
        let session = db
            .sessions()
            .open("north", "op-1", Money::from_cents(10_000))
            .await
            .unwrap();

        let first = db
            .movements()
            .record(&session.id, NewMovement::new(SALE, CASH, Money::from_cents(500), "Ticket 1").with_sale("sale-1"))
            .await
            .unwrap();
        db.movements()
            .record(&session.id, NewMovement::new(SALE, CARD, Money::from_cents(700), "Ticket 2"))
            .await
            .unwrap();

        let listed = db.movements().list_for_session(&session.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].sale_id.as_deref(), Some("sale-1"));
        assert!(listed.iter().all(|m| m.affects_balance));

        let fetched = db.movements().get_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(fetched.amount, Money::from_cents(500));
    }

    #[tokio::test]
    async fn test_record_against_closed_session_is_invalid_state() {
        let db = setup().await;
        let session = db
            .sessions()
            .open("north", "op-1", Money::zero())
            .await
            .unwrap();
        db.sessions().close(&session.id, Money::zero(), None).await.unwrap();

        for cents in [1, 100, 1_000_000] {
            let err = db
                .movements()
                .record(&session.id, NewMovement::new(CASH_IN, CASH, Money::from_cents(cents), "late"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
        assert!(db.movements().list_for_session(&session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_rejections() {
        let db = setup().await;
        let session = db
            .sessions()
            .open("north", "op-1", Money::zero())
            .await
            .unwrap();
        let movements = db.movements();

        let unknown_session = movements
            .record("nope", NewMovement::new(SALE, CASH, Money::from_cents(1), "x"))
            .await
            .unwrap_err();
        assert_eq!(unknown_session.kind(), ErrorKind::NotFound);

        let zero = movements
            .record(&session.id, NewMovement::new(SALE, CASH, Money::zero(), "x"))
            .await
            .unwrap_err();
        assert_eq!(zero.kind(), ErrorKind::Validation);

        let unknown_type = movements
            .record(&session.id, NewMovement::new(99, CASH, Money::from_cents(1), "x"))
            .await
            .unwrap_err();
        assert_eq!(unknown_type.kind(), ErrorKind::Validation);

        let unknown_method = movements
            .record(&session.id, NewMovement::new(SALE, 99, Money::from_cents(1), "x"))
            .await
            .unwrap_err();
        assert_eq!(unknown_method.kind(), ErrorKind::Validation);

        let both_links = movements
            .record(
                &session.id,
                NewMovement::new(SALE, CASH, Money::from_cents(1), "x")
                    .with_sale("s-1")
                    .with_purchase_order("po-1"),
            )
            .await
            .unwrap_err();
        assert_eq!(both_links.kind(), ErrorKind::Validation);

        let oversized = movements
            .record(&session.id, NewMovement::new(SALE, CASH, Money::from_cents(i64::MAX / 2 + 1), "x"))
            .await
            .unwrap_err();
        assert_eq!(oversized.kind(), ErrorKind::Validation);

        sqlx::query("UPDATE movement_types SET active = 0 WHERE id = ?1")
            .bind(CASH_IN)
            .execute(db.pool())
            .await
            .unwrap();
        let inactive = movements
            .record(&session.id, NewMovement::new(CASH_IN, CASH, Money::from_cents(1), "x"))
            .await
            .unwrap_err();
        assert_eq!(inactive.kind(), ErrorKind::Validation);

        assert!(movements.list_for_session(&session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_for_branch_targets_open_session() {
        let db = setup().await;

        let err = db
            .movements()
            .record_for_branch("north", NewMovement::new(SALE, CASH, Money::from_cents(1), "x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let session = db
            .sessions()
            .open("north", "op-1", Money::zero())
            .await
            .unwrap();
        db.sessions()
            .open("south", "op-2", Money::zero())
            .await
            .unwrap();

        let recorded = db
            .movements()
            .record_for_branch("north", NewMovement::new(SALE, CASH, Money::from_cents(250), "x"))
            .await
            .unwrap();
        assert_eq!(recorded.cash_register_id, session.id);
    }

    #[tokio::test]
    async fn test_branch_ids_are_trimmed_on_every_path() {
        let db = setup().await;
        let session = db
            .sessions()
            .open(" north ", "op-1", Money::zero())
            .await
            .unwrap();
        assert_eq!(session.branch_id, "north");

        let recorded = db
            .movements()
            .record_for_branch(" north", NewMovement::new(SALE, CASH, Money::from_cents(100), "x"))
            .await
            .unwrap();
        assert_eq!(recorded.cash_register_id, session.id);

        let current = db.sessions().current_for_branch("north  ").await.unwrap().unwrap();
        assert_eq!(current.id, session.id);
        assert_eq!(db.sessions().list_for_branch(" north", 5).await.unwrap().len(), 1);

        let err = db
            .sessions()
            .open("north\t", "op-2", Money::zero())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_delete_writes_audit_row() {
        let db = setup().await;
        let session = db
            .sessions()
            .open("north", "op-1", Money::zero())
            .await
            .unwrap();
        let movement = db
            .movements()
            .record(&session.id, NewMovement::new(SALE, CASH, Money::from_cents(999), "typo"))
            .await
            .unwrap();

        let blank_reason = db.movements().delete(&movement.id, "admin", "  ").await.unwrap_err();
        assert_eq!(blank_reason.kind(), ErrorKind::Validation);

        let deleted = db
            .movements()
            .delete(&movement.id, "admin", "duplicated ticket")
            .await
            .unwrap();
        assert_eq!(deleted.id, movement.id);
        assert!(db.movements().get_by_id(&movement.id).await.unwrap().is_none());

        let audit = db.movements().audit_log(&session.id).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].actor, "admin");
        assert_eq!(audit[0].reason, "duplicated ticket");
        assert_eq!(audit[0].action, "delete");
        assert_eq!(audit[0].movement().unwrap(), deleted);

        let again = db
            .movements()
            .delete(&movement.id, "admin", "again")
            .await
            .unwrap_err();
        assert_eq!(again.kind(), ErrorKind::NotFound);
    }
}
