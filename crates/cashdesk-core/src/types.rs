//! # Domain Types
//!
//! Core domain types of the cash register engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                     │
//! │  │ CashRegisterSession │1 N│    CashMovement     │                     │
//! │  │  ─────────────────  │──►│  ─────────────────  │                     │
//! │  │  id (UUID)          │   │  id (UUID)          │                     │
//! │  │  branch_id          │   │  cash_register_id   │                     │
//! │  │  initial_amount     │   │  amount (> 0)       │                     │
//! │  │  state: Open |      │   │  affects_balance    │                     │
//! │  │   Closed(Closure)   │   └────┬───────────┬────┘                     │
//! │  └─────────────────────┘        │N          │N                         │
//! │                                 ▼1          ▼1                         │
//! │                     ┌──────────────────┐  ┌──────────────────┐         │
//! │                     │   MovementType   │  │  PaymentMethod   │         │
//! │                     │ entrada | salida │  │  is_cash flag    │         │
//! │                     │ manual | auto    │  └──────────────────┘         │
//! │                     └──────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::reconciliation::{Reconciliation, ReconciliationStatus};

// =============================================================================
// Operation Type
// =============================================================================

/// Direction of a movement relative to the register's cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Inbound: increases the register's money.
    Entrada,
    /// Outbound: decreases the register's money.
    Salida,
}

impl OperationType {
    /// Applies the direction to an (always positive) movement amount.
    #[inline]
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            OperationType::Entrada => amount,
            OperationType::Salida => -amount,
        }
    }
}

// =============================================================================
// Movement Origin
// =============================================================================

/// Whether operators may pick a movement type by hand.
///
/// Automatic types (sale, purchase) are only written by the sale/purchase
/// subsystem and are hidden from manual-entry forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementOrigin {
    #[default]
    Manual,
    Automatic,
}

// =============================================================================
// Movement Type
// =============================================================================

/// Classification of a monetary movement. Reference data, never mutated at
/// runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementType {
    pub id: i64,
    pub name: String,
    pub operation_type: OperationType,
    /// Touches a physical register's cash at all.
    pub is_cash_movement: bool,
    /// Touches a customer's running account (orthogonal to the above).
    pub is_current_account_movement: bool,
    pub origin: MovementOrigin,
    pub active: bool,
}

impl MovementType {
    /// Whether the type can be offered in manual-entry forms.
    pub fn is_manual(&self) -> bool {
        self.active && self.origin == MovementOrigin::Manual
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// A way money changes hands (cash, card, transfer, check...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethod {
    pub id: i64,
    /// Display name, locale-specific ("Efectivo", "Cash", ...).
    pub name: String,
    /// Only the cash method feeds the physical count.
    pub is_cash: bool,
}

// =============================================================================
// Register Status
// =============================================================================

/// Persisted status column of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Open,
    Closed,
}

impl std::fmt::Display for RegisterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterStatus::Open => write!(f, "open"),
            RegisterStatus::Closed => write!(f, "closed"),
        }
    }
}

// =============================================================================
// Cash Register Session
// =============================================================================

/// Everything that exists only once a session has been closed.
///
/// `expected_cash`, `difference` and `classification` are the snapshot taken
/// at close time. Reports recompute them from the ledger instead of trusting
/// this copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Closure {
    /// Cash the operator physically counted.
    pub final_amount: Money,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    pub expected_cash: Money,
    pub difference: Money,
    pub classification: ReconciliationStatus,
    pub notes: Option<String>,
}

/// Lifecycle of a session. A closed session always carries its closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Closed(Closure),
}

/// One open-to-close lifecycle of a physical cash register at a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashRegisterSession {
    pub id: String,
    pub branch_id: String,
    /// Operator who opened the register.
    pub user_id: String,
    pub initial_amount: Money,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub state: SessionState,
}

impl CashRegisterSession {
    /// Checks if movements may still be attached.
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open)
    }

    /// Returns the persisted status.
    pub fn status(&self) -> RegisterStatus {
        match self.state {
            SessionState::Open => RegisterStatus::Open,
            SessionState::Closed(_) => RegisterStatus::Closed,
        }
    }

    /// Returns the closure if the session is closed.
    pub fn closure(&self) -> Option<&Closure> {
        match &self.state {
            SessionState::Open => None,
            SessionState::Closed(closure) => Some(closure),
        }
    }

    /// Moves the session into its terminal state.
    ///
    /// ## Returns
    /// `false` (and leaves the session untouched) if it was already closed.
    pub fn close_with(
        &mut self,
        reconciliation: &Reconciliation,
        closed_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> bool {
        if !self.is_open() {
            return false;
        }
        self.state = SessionState::Closed(Closure {
            final_amount: reconciliation.counted_cash,
            closed_at,
            expected_cash: reconciliation.expected_cash,
            difference: reconciliation.difference,
            classification: reconciliation.status,
            notes,
        });
        true
    }
}

// =============================================================================
// Cash Movement
// =============================================================================

/// An immutable monetary event recorded against a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub cash_register_id: String,
    pub movement_type_id: i64,
    pub payment_method_id: i64,
    /// Always positive; direction comes from the movement type.
    pub amount: Money,
    pub description: String,
    /// Back-reference for movements generated by a sale.
    pub sale_id: Option<String>,
    /// Back-reference for movements generated by a purchase order.
    pub purchase_order_id: Option<String>,
    /// Informational movements (notes) do not count toward any total.
    pub affects_balance: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    /// Checks if the movement was generated by another subsystem.
    pub fn is_linked(&self) -> bool {
        self.sale_id.is_some() || self.purchase_order_id.is_some()
    }
}

/// A movement to be recorded. The ledger assigns id and timestamp.
///
/// ## Example
/// ```rust
/// use cashdesk_core::{Money, NewMovement};
///
/// let movement = NewMovement::new(1, 1, Money::from_cents(50_000), "Ticket 0042")
///     .with_sale("b6c1e8f2-1111-4a2b-9c3d-000000000042");
/// assert!(movement.affects_balance);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMovement {
    pub movement_type_id: i64,
    pub payment_method_id: i64,
    pub amount: Money,
    pub description: String,
    pub sale_id: Option<String>,
    pub purchase_order_id: Option<String>,
    pub affects_balance: bool,
}

impl NewMovement {
    pub fn new(
        movement_type_id: i64,
        payment_method_id: i64,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        NewMovement {
            movement_type_id,
            payment_method_id,
            amount,
            description: description.into(),
            sale_id: None,
            purchase_order_id: None,
            affects_balance: true,
        }
    }

    pub fn with_sale(mut self, sale_id: impl Into<String>) -> Self {
        self.sale_id = Some(sale_id.into());
        self
    }

    pub fn with_purchase_order(mut self, purchase_order_id: impl Into<String>) -> Self {
        self.purchase_order_id = Some(purchase_order_id.into());
        self
    }

    /// Marks the movement as a note that does not count toward totals.
    pub fn informational(mut self) -> Self {
        self.affects_balance = false;
        self
    }

    /// Materializes the request into a ledger entry.
    pub fn into_movement(
        self,
        id: String,
        cash_register_id: String,
        created_at: DateTime<Utc>,
    ) -> CashMovement {
        CashMovement {
            id,
            cash_register_id,
            movement_type_id: self.movement_type_id,
            payment_method_id: self.payment_method_id,
            amount: self.amount,
            description: self.description,
            sale_id: self.sale_id,
            purchase_order_id: self.purchase_order_id,
            affects_balance: self.affects_balance,
            created_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
