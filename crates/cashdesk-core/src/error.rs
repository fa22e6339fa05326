//! # Error Types
//!
//! Domain-specific error types for cashdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cashdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Violated cash-register invariants              │
//! │  │   ├── Conflict       (second open session for a branch)             │
//! │  │   ├── InvalidState   (write/close on a session that is not open)    │
//! │  │   ├── Validation     (bad amount, unknown catalog entry, ...)       │
//! │  │   └── NotFound       (unknown session / movement id)                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cashdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are retried automatically: each one names the invariant the
//! operator's action violated.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Cash engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A register for this branch is already open.
    ///
    /// ## User Workflow
    /// ```text
    /// Operator B clicks "Open register" at Branch 7
    ///      │
    ///      ▼
    /// Branch 7 already has session 3f2a… (opened by Operator A)
    ///      │
    ///      ▼
    /// Conflict { branch_id: "7", open_session_id: Some("3f2a…") }
    /// ```
    #[error("Branch {branch_id} already has an open cash register session")]
    Conflict {
        branch_id: String,
        open_session_id: Option<String>,
    },

    /// The session is not in a state that allows the operation.
    ///
    /// ## When This Occurs
    /// - Recording a movement against a closed session
    /// - Closing an already closed session
    /// - Recording "for branch" when the branch has no open session
    #[error("Cash register session {session_id} is {status}, cannot {operation}")]
    InvalidState {
        session_id: String,
        status: String,
        operation: String,
    },

    /// An entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(
        session_id: impl Into<String>,
        status: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidState {
            session_id: session_id.into(),
            status: status.into(),
            operation: operation.into(),
        }
    }

    /// Machine-readable category of the violated invariant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Conflict { .. } => ErrorKind::Conflict,
            CoreError::InvalidState { .. } => ErrorKind::InvalidState,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

/// Error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conflict,
    InvalidState,
    Validation,
    NotFound,
    /// Storage or infrastructure failure (only produced by cashdesk-db).
    Internal,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input or a collaborator's request does
/// not meet requirements. Checked before anything is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Amount above the largest figure a register accepts.
    #[error("{field} must not exceed {max}")]
    TooLarge { field: String, max: Money },

    /// A ledger total left the representable range.
    #[error("{field} is out of range")]
    Overflow { field: String },

    /// Invalid format (e.g., an unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Reference to a catalog entry that does not exist.
    #[error("unknown {field}: {value}")]
    UnknownReference { field: String, value: String },

    /// Reference to a catalog entry that exists but is disabled.
    #[error("{field} {value} is inactive")]
    Inactive { field: String, value: String },

    /// Two fields that cannot be combined were both supplied.
    #[error("{first} and {second} cannot both be set")]
    MutuallyExclusive { first: String, second: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
