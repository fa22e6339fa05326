//! # Repository Module
//!
//! Database repositories for the cash register engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.sessions().close(id, counted, notes)                       │
//! │       ▼                                                                 │
//! │  SessionRepository ──┐                                                 │
//! │  MovementRepository ─┼──► shared fetch helpers (work on a connection   │
//! │  ReportRepository ───┤     or on an open transaction)                  │
//! │  CatalogRepository ──┘                                                 │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Rules live in cashdesk-core; repositories only load, call the core    │
//! │  and persist, each write in one transaction.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Movement types and payment methods
//! - [`session::SessionRepository`] - Open / close / lookup
//! - [`movement::MovementRepository`] - Ledger writes and audited deletion
//! - [`report::ReportRepository`] - Session reports and fleet summaries

pub mod catalog;
pub mod movement;
pub mod report;
pub mod session;

/// Opening statement for write transactions.
///
/// Takes SQLite's write lock up front, so a contended writer waits on the
/// busy timeout instead of failing a read-to-write upgrade with `SQLITE_BUSY`.
pub(crate) const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";
