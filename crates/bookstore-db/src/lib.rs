//! # bookstore-db: Storage Adapter for the Bookstore Order Engine
//!
//! This crate provides database access for the order engine.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Engine Data Flow                           │
//! │                                                                         │
//! │  OrderLedger::create_order                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   bookstore-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo      │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ StoreRepo     │    │ 002_orders   │  │   │
//! │  │   │               │    │ OrderRepo     │    │              │  │   │
//! │  │   │               │    │ SearchRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Primitive
//!
//! The only cross-request safety this crate offers is the guarded update:
//! a single `UPDATE ... WHERE <key> AND <guard>` statement. SQLite applies
//! the guard and the delta atomically; `rows_affected() == 0` reports that
//! the guard did not hold. Multi-statement sequences are NOT atomic.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bookstore_db::{Database, DbConfig, GuardOutcome};
//!
//! let db = Database::new(DbConfig::new("bookstore.db")).await?;
//!
//! match db.stores().try_decrement_stock("s-1", "b-1", 3).await? {
//!     GuardOutcome::Applied => { /* reserved */ }
//!     GuardOutcome::Rejected => { /* not enough stock */ }
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::order::{generate_order_id, OrderRepository};
pub use repository::search::SearchRepository;
pub use repository::store::StoreRepository;
pub use repository::user::UserRepository;
pub use repository::GuardOutcome;
