//! # bookstore-orders: Order Processing Services
//!
//! The operations a request handler calls: order lifecycle, inventory
//! reservation, account balance and catalog search.
//!
//! ## Module Organization
//! ```text
//! bookstore_orders/
//! ├── lib.rs        ◄─── You are here (Bookstore wiring, tracing setup)
//! ├── orders.rs     ◄─── OrderLedger: create/pay/ship/receive/cancel/history
//! ├── inventory.rs  ◄─── InventoryController: try_reserve/release
//! ├── accounts.rs   ◄─── AccountLedger: authenticate/try_debit/credit
//! ├── search.rs     ◄─── SearchIndex: flatten + filter catalog query
//! ├── config.rs     ◄─── BookstoreConfig from environment
//! └── error.rs      ◄─── LedgerError with stable numeric codes
//! ```
//!
//! ## Dependency Injection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   One Database, many services                           │
//! │                                                                         │
//! │   Database::new(config) ──── constructed once at startup               │
//! │         │                                                               │
//! │         ├──► InventoryController ─┐                                    │
//! │         ├──► AccountLedger ───────┼──► OrderLedger                     │
//! │         ├──► SearchIndex          │                                    │
//! │         └─────────────────────────┘                                    │
//! │                                                                         │
//! │  Database is a cheap clone around a pooled handle. No service reaches  │
//! │  for a global connection.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use bookstore_orders::{Bookstore, BookstoreConfig};
//!
//! let shop = Bookstore::connect(&BookstoreConfig::load()?).await?;
//! let order_id = shop.orders.create_order("alice", "s-1", &[("b-1".into(), 2)]).await?;
//! shop.orders.pay("alice", "secret", &order_id).await?;
//! ```

pub mod accounts;
pub mod config;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod search;

pub use accounts::AccountLedger;
pub use config::{BookstoreConfig, ConfigError};
pub use error::{ErrorCode, LedgerError, LedgerResult, SUCCESS_CODE};
pub use inventory::{InventoryController, Reservation};
pub use orders::OrderLedger;
pub use search::SearchIndex;

use bookstore_db::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Every service of the order engine, sharing one database handle.
#[derive(Debug, Clone)]
pub struct Bookstore {
    pub orders: OrderLedger,
    pub inventory: InventoryController,
    pub accounts: AccountLedger,
    pub search: SearchIndex,
    db: Database,
}

impl Bookstore {
    /// Wires the services around an already opened database.
    pub fn new(db: Database, config: &BookstoreConfig) -> Self {
        let inventory = InventoryController::new(db.clone());
        let accounts = AccountLedger::new(db.clone());
        let orders = OrderLedger::new(
            db.clone(),
            inventory.clone(),
            accounts.clone(),
            config.pending_ttl,
        );

        Bookstore {
            orders,
            inventory,
            accounts,
            search: SearchIndex::new(db.clone()),
            db,
        }
    }

    /// Opens the database (running migrations) and wires the services.
    pub async fn connect(config: &BookstoreConfig) -> LedgerResult<Self> {
        let db = Database::new(config.to_db_config()).await?;
        info!(path = ?config.database_path, "Bookstore connected");
        Ok(Bookstore::new(db, config))
    }

    /// The shared storage adapter.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - ERROR: Compensation failures, storage errors
/// - WARN: Rejected guards, rollbacks
/// - INFO: Order state changes
/// - DEBUG: Repository calls
///
/// Default filter is `info,bookstore=debug,sqlx=warn`, overridable with
/// `RUST_LOG`. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bookstore=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
