//! # Inventory Controller
//!
//! Reserves and releases copies of a store's listing.
//!
//! ## Reservation Flow
//! ```text
//! try_reserve(store, book, 3)
//!      │
//!      ├── listing missing ─────────────────► UnknownBook
//!      ├── stock_level < 3 ─────────────────► InsufficientStock
//!      │
//!      ▼
//! UPDATE books SET stock_level = stock_level - 3
//!  WHERE store_id = ? AND book_id = ? AND stock_level >= 3
//!      │
//!      ├── 1 row  ──────────────────────────► Reservation { price }
//!      └── 0 rows (lost a race) ── re-read ─► InsufficientStock | UnknownBook
//! ```
//!
//! The pre-check gives the caller a precise error; the guard in the
//! UPDATE is what keeps `stock_level` non-negative.

use bookstore_core::{CoreError, LineItem};
use bookstore_db::{Database, GuardOutcome};
use tracing::{debug, warn};

use crate::error::LedgerResult;

/// Copies taken from a listing, with the price seen at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub store_id: String,
    pub book_id: String,
    pub count: i64,
    pub price: i64,
}

impl Reservation {
    /// Line item snapshot for the order being built.
    pub fn to_line_item(&self) -> LineItem {
        LineItem::new(self.book_id.clone(), self.count, self.price)
    }
}

/// Guarded stock reservation over the storage adapter.
#[derive(Debug, Clone)]
pub struct InventoryController {
    db: Database,
}

impl InventoryController {
    /// Creates a controller over an injected database handle.
    pub fn new(db: Database) -> Self {
        InventoryController { db }
    }

    /// Takes `count` copies of a listing if enough are in stock.
    pub async fn try_reserve(
        &self,
        store_id: &str,
        book_id: &str,
        count: i64,
    ) -> LedgerResult<Reservation> {
        let stores = self.db.stores();

        let listing = stores
            .get_book(store_id, book_id)
            .await?
            .ok_or_else(|| CoreError::UnknownBook(book_id.to_string()))?;

        if !listing.can_reserve(count) {
            return Err(CoreError::InsufficientStock {
                book_id: book_id.to_string(),
                available: listing.stock_level,
                requested: count,
            }
            .into());
        }

        match stores.try_decrement_stock(store_id, book_id, count).await? {
            GuardOutcome::Applied => {
                debug!(store_id, book_id, count, price = listing.price, "Stock reserved");
                Ok(Reservation {
                    store_id: store_id.to_string(),
                    book_id: book_id.to_string(),
                    count,
                    price: listing.price,
                })
            }
            GuardOutcome::Rejected => {
                warn!(store_id, book_id, count, "Stock guard rejected reservation");
                let err = match stores.get_book(store_id, book_id).await? {
                    Some(current) => CoreError::InsufficientStock {
                        book_id: book_id.to_string(),
                        available: current.stock_level,
                        requested: count,
                    },
                    None => CoreError::UnknownBook(book_id.to_string()),
                };
                Err(err.into())
            }
        }
    }

    /// Puts `count` copies back on a listing.
    ///
    /// Fails `UnknownBook` when the listing is gone and `StockOverflow` when
    /// the stock level would not fit.
    pub async fn release(&self, store_id: &str, book_id: &str, count: i64) -> LedgerResult<()> {
        let stores = self.db.stores();

        match stores.increment_stock(store_id, book_id, count).await? {
            GuardOutcome::Applied => {
                debug!(store_id, book_id, count, "Stock released");
                Ok(())
            }
            GuardOutcome::Rejected => {
                let err = match stores.get_book(store_id, book_id).await? {
                    Some(current) => CoreError::StockOverflow {
                        book_id: book_id.to_string(),
                        stock_level: current.stock_level,
                        count,
                    },
                    None => CoreError::UnknownBook(book_id.to_string()),
                };
                Err(err.into())
            }
        }
    }

    /// Releases every reservation, newest first.
    ///
    /// Keeps going past a failed release and reports how many failed.
    pub async fn release_all(&self, reservations: &[Reservation]) -> usize {
        let mut failed = 0;
        for r in reservations.iter().rev() {
            if let Err(e) = self.release(&r.store_id, &r.book_id, r.count).await {
                tracing::error!(
                    store_id = %r.store_id,
                    book_id = %r.book_id,
                    count = r.count,
                    error = %e,
                    "Failed to release reserved stock"
                );
                failed += 1;
            }
        }
        failed
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bookstore_core::BookListing;
    use bookstore_db::DbConfig;

    async fn setup(stock: i64) -> (Database, InventoryController) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("seller", "pw", 0).await.unwrap();
        db.stores().insert("s-1", "seller").await.unwrap();
        db.stores()
            .add_book(&BookListing {
                store_id: "s-1".to_string(),
                book_id: "b-1".to_string(),
                stock_level: stock,
                price: 100,
                title: "Dune".to_string(),
                tags: "classic".to_string(),
                content: "spice".to_string(),
            })
            .await
            .unwrap();
        let inventory = InventoryController::new(db.clone());
        (db, inventory)
    }

    async fn stock(db: &Database) -> i64 {
        db.stores().get_book("s-1", "b-1").await.unwrap().unwrap().stock_level
    }

    #[tokio::test]
    async fn test_reserve_captures_price() {
        let (db, inventory) = setup(5).await;

        let r = inventory.try_reserve("s-1", "b-1", 3).await.unwrap();
        assert_eq!(r.price, 100);
        assert_eq!(r.to_line_item(), LineItem::new("b-1", 3, 100));
        assert_eq!(stock(&db).await, 2);
    }

    #[tokio::test]
    async fn test_reserve_more_than_stock_changes_nothing() {
        let (db, inventory) = setup(5).await;

        let err = inventory.try_reserve("s-1", "b-1", 10).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(stock(&db).await, 5);
    }

    #[tokio::test]
    async fn test_unknown_book() {
        let (_db, inventory) = setup(5).await;

        let err = inventory.try_reserve("s-1", "missing", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownBook);
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let (db, inventory) = setup(5).await;

        let r = inventory.try_reserve("s-1", "b-1", 5).await.unwrap();
        assert_eq!(stock(&db).await, 0);

        assert_eq!(inventory.release_all(&[r]).await, 0);
        assert_eq!(stock(&db).await, 5);
    }

    #[tokio::test]
    async fn test_release_of_missing_listing_is_reported() {
        let (_db, inventory) = setup(5).await;

        let err = inventory.release("s-1", "missing", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownBook);
    }

    #[tokio::test]
    async fn test_release_past_max_stock_is_refused() {
        let (db, inventory) = setup(i64::MAX - 1).await;

        let err = inventory.release("s-1", "b-1", 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalFailure);
        assert_eq!(stock(&db).await, i64::MAX - 1);

        let r = Reservation {
            store_id: "s-1".to_string(),
            book_id: "b-1".to_string(),
            count: 2,
            price: 100,
        };
        assert_eq!(inventory.release_all(&[r]).await, 1);
        assert_eq!(stock(&db).await, i64::MAX - 1);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_oversell() {
        let (db, inventory) = setup(5).await;

        let (a, b, c) = tokio::join!(
            inventory.try_reserve("s-1", "b-1", 2),
            inventory.try_reserve("s-1", "b-1", 2),
            inventory.try_reserve("s-1", "b-1", 2),
        );

        let granted = [a, b, c].iter().filter(|r| r.is_ok()).count() as i64;
        assert_eq!(granted, 2);
        assert_eq!(stock(&db).await, 5 - 2 * granted);
    }
}
