//! # cashdesk-db: Persistence for the Cash Register Engine
//!
//! SQLite storage for register sessions, the movement ledger and the
//! deletion audit log, with sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cashdesk Data Flow                               │
//! │                                                                         │
//! │  Sale subsystem / admin console / dashboard                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   cashdesk-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SessionRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ MovementRepo  │    │ 001_initial_ │  │   │
//! │  │   │ Reconciliation│    │ ReportRepo    │    │   schema.sql │  │   │
//! │  │   │   policy      │    │ CatalogRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  └────────────────────────────────┼───────────────────────────────┘   │
//! │                                   ▼                                    │
//! │                 cashdesk-core (balance, reconciliation)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-based configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cashdesk_db::{CashdeskConfig, Database};
//!
//! let config = CashdeskConfig::from_env()?;
//! let db = Database::new(config.db_config()).await?;
//! db.catalog().seed_standard(&config.cash_method_name).await?;
//!
//! let session = db.sessions().open("north", "op-7", Money::from_cents(100_000)).await?;
//! let report = db.reports().session_report(&session.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{CashdeskConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::movement::{MovementAuditEntry, MovementRepository};
pub use repository::report::{ReportRepository, SessionReport};
pub use repository::session::{SessionClose, SessionRepository};
