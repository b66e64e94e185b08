//! # Store Repository
//!
//! Stores, their book listings, and stock updates.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: Absolute update (lost update under concurrency)          │
//! │     UPDATE books SET stock_level = 2 WHERE ...                      │
//! │                                                                     │
//! │  ✅ CORRECT: Guarded delta                                          │
//! │     UPDATE books SET stock_level = stock_level - 3                  │
//! │     WHERE store_id = ? AND book_id = ? AND stock_level >= 3         │
//! │                                                                     │
//! │  Releases add back stock that a reservation removed earlier, so    │
//! │  they need no guard.                                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::GuardOutcome;
use bookstore_core::{BookListing, Store};

/// Repository for store and listing database operations.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    /// Creates a new StoreRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Gets a store by id.
    pub async fn get_by_id(&self, store_id: &str) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(
            r#"
            SELECT store_id, user_id AS owner_id
            FROM stores
            WHERE store_id = ?1
            "#,
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    /// Inserts a store owned by `owner_id`.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - store id already taken
    /// * `Err(DbError::ForeignKeyViolation)` - owner doesn't exist
    pub async fn insert(&self, store_id: &str, owner_id: &str) -> DbResult<Store> {
        debug!(store_id = %store_id, owner_id = %owner_id, "Inserting store");

        sqlx::query("INSERT INTO stores (store_id, user_id) VALUES (?1, ?2)")
            .bind(store_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, store_id),
                other => other,
            })?;

        Ok(Store {
            store_id: store_id.to_string(),
            owner_id: owner_id.to_string(),
        })
    }

    /// Adds a listing to its store.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - book already listed in this store
    /// * `Err(DbError::CheckViolation)` - negative stock or price
    pub async fn add_book(&self, listing: &BookListing) -> DbResult<()> {
        debug!(store_id = %listing.store_id, book_id = %listing.book_id, "Adding listing");

        sqlx::query(
            r#"
            INSERT INTO books (store_id, book_id, stock_level, price, title, tags, content)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&listing.store_id)
        .bind(&listing.book_id)
        .bind(listing.stock_level)
        .bind(listing.price)
        .bind(&listing.title)
        .bind(&listing.tags)
        .bind(&listing.content)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &listing.book_id),
            other => other,
        })?;

        Ok(())
    }

    /// Gets one listing.
    pub async fn get_book(&self, store_id: &str, book_id: &str) -> DbResult<Option<BookListing>> {
        let listing = sqlx::query_as::<_, BookListing>(
            r#"
            SELECT store_id, book_id, stock_level, price, title, tags, content
            FROM books
            WHERE store_id = ?1 AND book_id = ?2
            "#,
        )
        .bind(store_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    /// Lists a store's books in insertion order.
    pub async fn listings(&self, store_id: &str) -> DbResult<Vec<BookListing>> {
        let listings = sqlx::query_as::<_, BookListing>(
            r#"
            SELECT store_id, book_id, stock_level, price, title, tags, content
            FROM books
            WHERE store_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    /// Removes `count` copies only if at least `count` are in stock.
    ///
    /// Returns `Rejected` when the listing is missing or stock is short.
    pub async fn try_decrement_stock(
        &self,
        store_id: &str,
        book_id: &str,
        count: i64,
    ) -> DbResult<GuardOutcome> {
        debug!(store_id = %store_id, book_id = %book_id, count = %count, "Guarded stock decrement");

        let result = sqlx::query(
            r#"
            UPDATE books
            SET stock_level = stock_level - ?3
            WHERE store_id = ?1 AND book_id = ?2 AND stock_level >= ?3
            "#,
        )
        .bind(store_id)
        .bind(book_id)
        .bind(count)
        .execute(&self.pool)
        .await?;

        Ok(GuardOutcome::from_rows_affected(result.rows_affected()))
    }

    /// Adds `count` copies back, unless the stock level would overflow.
    ///
    /// Returns `Rejected` when the listing is missing or the sum would not
    /// fit in an `i64`.
    pub async fn increment_stock(
        &self,
        store_id: &str,
        book_id: &str,
        count: i64,
    ) -> DbResult<GuardOutcome> {
        debug!(store_id = %store_id, book_id = %book_id, count = %count, "Guarded stock increment");

        let result = sqlx::query(
            r#"
            UPDATE books
            SET stock_level = stock_level + ?3
            WHERE store_id = ?1 AND book_id = ?2
              AND ?3 >= 0 AND stock_level <= 9223372036854775807 - ?3
            "#,
        )
        .bind(store_id)
        .bind(book_id)
        .bind(count)
        .execute(&self.pool)
        .await?;

        Ok(GuardOutcome::from_rows_affected(result.rows_affected()))
    }

    /// Changes a listing's unit price. Orders already created keep the
    /// price they captured.
    pub async fn set_price(&self, store_id: &str, book_id: &str, price: i64) -> DbResult<()> {
        debug!(store_id = %store_id, book_id = %book_id, price = %price, "Price update");

        let result = sqlx::query("UPDATE books SET price = ?3 WHERE store_id = ?1 AND book_id = ?2")
            .bind(store_id)
            .bind(book_id)
            .bind(price)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", format!("{store_id}/{book_id}")));
        }

        Ok(())
    }

    /// Counts stores (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn listing(book_id: &str, stock_level: i64, price: i64) -> BookListing {
        BookListing {
            store_id: "s-1".to_string(),
            book_id: book_id.to_string(),
            stock_level,
            price,
            title: format!("Title of {book_id}"),
            tags: String::new(),
            content: String::new(),
        }
    }

    async fn seeded() -> StoreRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("seller", "pw", 0).await.unwrap();
        db.stores().insert("s-1", "seller").await.unwrap();
        db.stores().add_book(&listing("b-1", 5, 100)).await.unwrap();
        db.stores()
    }

    #[tokio::test]
    async fn test_store_lookup() {
        let stores = seeded().await;
        let store = stores.get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(store.owner_id, "seller");
        assert!(stores.get_by_id("s-2").await.unwrap().is_none());
        assert_eq!(stores.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_requires_existing_owner() {
        let stores = seeded().await;
        let err = stores.insert("s-2", "ghost").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_guarded_decrement() {
        let stores = seeded().await;

        assert_eq!(
            stores.try_decrement_stock("s-1", "b-1", 3).await.unwrap(),
            GuardOutcome::Applied
        );
        assert_eq!(
            stores.try_decrement_stock("s-1", "b-1", 3).await.unwrap(),
            GuardOutcome::Rejected
        );
        assert_eq!(
            stores.try_decrement_stock("s-1", "missing", 1).await.unwrap(),
            GuardOutcome::Rejected
        );

        let book = stores.get_book("s-1", "b-1").await.unwrap().unwrap();
        assert_eq!(book.stock_level, 2);
    }

    #[tokio::test]
    async fn test_increment_stock() {
        let stores = seeded().await;
        assert_eq!(
            stores.increment_stock("s-1", "b-1", 4).await.unwrap(),
            GuardOutcome::Applied
        );
        assert_eq!(stores.get_book("s-1", "b-1").await.unwrap().unwrap().stock_level, 9);

        assert_eq!(
            stores.increment_stock("s-1", "missing", 1).await.unwrap(),
            GuardOutcome::Rejected
        );
    }

    #[tokio::test]
    async fn test_increment_stock_refuses_overflow() {
        let stores = seeded().await;
        stores.add_book(&listing("b-max", i64::MAX - 2, 100)).await.unwrap();

        assert_eq!(
            stores.increment_stock("s-1", "b-max", 3).await.unwrap(),
            GuardOutcome::Rejected
        );
        let book = stores.get_book("s-1", "b-max").await.unwrap().unwrap();
        assert_eq!(book.stock_level, i64::MAX - 2);

        assert_eq!(
            stores.increment_stock("s-1", "b-max", 2).await.unwrap(),
            GuardOutcome::Applied
        );
        let book = stores.get_book("s-1", "b-max").await.unwrap().unwrap();
        assert_eq!(book.stock_level, i64::MAX);
    }

    #[tokio::test]
    async fn test_set_price() {
        let stores = seeded().await;
        stores.set_price("s-1", "b-1", 250).await.unwrap();
        assert_eq!(stores.get_book("s-1", "b-1").await.unwrap().unwrap().price, 250);

        let err = stores.set_price("s-1", "b-1", -1).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_negative_stock_is_refused_by_schema() {
        let stores = seeded().await;
        let err = stores.add_book(&listing("b-2", -1, 100)).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_listings_in_insertion_order() {
        let stores = seeded().await;
        stores.add_book(&listing("a-0", 1, 1)).await.unwrap();

        let ids: Vec<_> = stores
            .listings("s-1")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.book_id)
            .collect();
        assert_eq!(ids, ["b-1", "a-0"]);
    }
}
