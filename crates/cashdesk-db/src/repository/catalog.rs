//! # Catalog Repository
//!
//! Movement types and payment methods.
//!
//! The tables are reference data: seeded once, read on every write and
//! report. Nothing in the engine mutates them at runtime.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use cashdesk_core::{Catalog, MovementType, PaymentMethod};

use crate::error::DbResult;
use crate::repository::BEGIN_WRITE;

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Loads the full catalog.
    pub async fn load(&self) -> DbResult<Catalog> {
        let mut conn = self.pool.acquire().await?;
        load_catalog(&mut conn).await
    }

    /// All movement types, active or not, ordered by id.
    pub async fn movement_types(&self) -> DbResult<Vec<MovementType>> {
        let mut conn = self.pool.acquire().await?;
        fetch_movement_types(&mut conn).await
    }

    /// All payment methods, ordered by id.
    pub async fn payment_methods(&self) -> DbResult<Vec<PaymentMethod>> {
        let mut conn = self.pool.acquire().await?;
        fetch_payment_methods(&mut conn).await
    }

    /// Active movement types operators may pick in manual-entry forms.
    pub async fn manual_types(&self) -> DbResult<Vec<MovementType>> {
        Ok(self
            .movement_types()
            .await?
            .into_iter()
            .filter(MovementType::is_manual)
            .collect())
    }

    /// Inserts the standard catalog, skipping rows that already exist.
    ///
    /// ## Arguments
    /// * `cash_method_name` - display name of the cash payment method
    ///   ("Efectivo", "Cash", ...)
    ///
    /// ## Returns
    /// Number of rows actually inserted (0 on a second run).
    pub async fn seed_standard(&self, cash_method_name: &str) -> DbResult<u64> {
        let standard = Catalog::standard();
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;
        let mut inserted = 0;

        for method in standard.payment_methods() {
            let name = if method.is_cash {
                cash_method_name
            } else {
                method.name.as_str()
            };
            let result = sqlx::query(
                "INSERT OR IGNORE INTO payment_methods (id, name, is_cash) VALUES (?1, ?2, ?3)",
            )
            .bind(method.id)
            .bind(name)
            .bind(method.is_cash)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        for kind in standard.movement_types() {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO movement_types (
                    id, name, operation_type, is_cash_movement,
                    is_current_account_movement, origin, active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(kind.id)
            .bind(&kind.name)
            .bind(kind.operation_type)
            .bind(kind.is_cash_movement)
            .bind(kind.is_current_account_movement)
            .bind(kind.origin)
            .bind(kind.active)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        info!(inserted, "Standard catalog seeded");
        Ok(inserted)
    }
}

/// Loads the catalog on an existing connection (or transaction).
pub(crate) async fn load_catalog(conn: &mut SqliteConnection) -> DbResult<Catalog> {
    let types = fetch_movement_types(conn).await?;
    let methods = fetch_payment_methods(conn).await?;
    debug!(
        movement_types = types.len(),
        payment_methods = methods.len(),
        "Catalog loaded"
    );
    Ok(Catalog::new(types, methods)?)
}

async fn fetch_movement_types(conn: &mut SqliteConnection) -> DbResult<Vec<MovementType>> {
    let types = sqlx::query_as::<_, MovementType>(
        r#"
        SELECT
            id,
            name,
            operation_type,
            is_cash_movement,
            is_current_account_movement,
            origin,
            active
        FROM movement_types
        ORDER BY id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(types)
}

async fn fetch_payment_methods(conn: &mut SqliteConnection) -> DbResult<Vec<PaymentMethod>> {
    let methods = sqlx::query_as::<_, PaymentMethod>(
        "SELECT id, name, is_cash FROM payment_methods ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(methods)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use cashdesk_core::OperationType;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let first = db.catalog().seed_standard("Efectivo").await.unwrap();
        assert_eq!(first, 12);
        let second = db.catalog().seed_standard("Efectivo").await.unwrap();
        assert_eq!(second, 0);

        let catalog = db.catalog().load().await.unwrap();
        assert_eq!(catalog.movement_types().count(), 8);
        assert_eq!(catalog.cash_method().unwrap().name, "Efectivo");
    }

    #[tokio::test]
    async fn test_seed_with_custom_cash_label() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().seed_standard("Cash").await.unwrap();

        let methods = db.catalog().payment_methods().await.unwrap();
        let cash: Vec<_> = methods.iter().filter(|m| m.is_cash).collect();
        assert_eq!(cash.len(), 1);
        assert_eq!(cash[0].name, "Cash");
    }

    #[tokio::test]
    async fn test_enums_round_trip_through_text_columns() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().seed_standard("Efectivo").await.unwrap();

        let types = db.catalog().movement_types().await.unwrap();
        let purchase = types.iter().find(|t| t.id == 2).unwrap();
        assert_eq!(purchase.operation_type, OperationType::Salida);
        assert!(!purchase.is_manual());

        let stored: String =
            sqlx::query_scalar("SELECT operation_type FROM movement_types WHERE id = 2")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(stored, "salida");
    }

    #[tokio::test]
    async fn test_manual_types_skip_inactive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().seed_standard("Efectivo").await.unwrap();
        sqlx::query("UPDATE movement_types SET active = 0 WHERE id = 8")
            .execute(db.pool())
            .await
            .unwrap();

        let ids: Vec<i64> = db
            .catalog()
            .manual_types()
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }
}
