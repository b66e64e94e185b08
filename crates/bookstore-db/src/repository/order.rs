//! # Order Repository
//!
//! Database operations for live orders and their line items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. INSERT                                                             │
//! │     └── insert() → header + items in ONE transaction                   │
//! │         status = pending_payment, expires_at = set                     │
//! │                                                                         │
//! │  2. TRANSITION                                                         │
//! │     └── transition(id, from, to)                                       │
//! │         UPDATE ... WHERE order_id = ? AND status = from                │
//! │         expires_at is cleared on every transition                      │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── delete_if_status(id, pending_payment)                          │
//! │         items go with it (ON DELETE CASCADE)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::GuardOutcome;
use bookstore_core::{LineItem, Order, OrderStatus};

/// Header row of an order, before its items are attached.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    user_id: String,
    store_id: String,
    status: OrderStatus,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Order {
        Order {
            order_id: self.order_id,
            buyer_id: self.user_id,
            store_id: self.store_id,
            items,
            status: self.status,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists an order and its items atomically.
    ///
    /// Either the whole order lands or nothing does.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(order_id = %order.order_id, items = order.items.len(), "Inserting order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, user_id, store_id, status, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.order_id)
        .bind(&order.buyer_id)
        .bind(&order.store_id)
        .bind(order.status)
        .bind(order.expires_at)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, book_id, count, price)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&order.order_id)
            .bind(position as i64)
            .bind(&item.book_id)
            .bind(item.count)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets an order with its items.
    pub async fn get_by_id(&self, order_id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, user_id, store_id, status, expires_at, created_at
            FROM orders
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.get_items(order_id).await?;
        Ok(Some(row.into_order(items)))
    }

    /// Gets the line items of an order in purchase order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT book_id, count, price
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a buyer's orders that have not completed yet, oldest first.
    pub async fn list_active_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, user_id, store_id, status, expires_at, created_at
            FROM orders
            WHERE user_id = ?1 AND status != ?2
            ORDER BY created_at, rowid
            "#,
        )
        .bind(user_id)
        .bind(OrderStatus::Completed)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.get_items(&row.order_id).await?;
            orders.push(row.into_order(items));
        }

        Ok(orders)
    }

    /// Lists ids of unpaid orders whose expiry marker is at or before `cutoff`.
    ///
    /// Feeds an external reaper; nothing in this crate cancels them.
    pub async fn list_expired_pending(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT order_id
            FROM orders
            WHERE status = ?1 AND expires_at IS NOT NULL AND expires_at <= ?2
            ORDER BY expires_at
            "#,
        )
        .bind(OrderStatus::PendingPayment)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Moves an order from `from` to `to` if it is still in `from`.
    ///
    /// The expiry marker only has meaning while payment is pending, so it
    /// is cleared by every transition.
    pub async fn transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<GuardOutcome> {
        debug!(order_id = %order_id, from = %from, to = %to, "Guarded status transition");

        if !from.can_transition_to(to) {
            return Err(DbError::Internal(format!(
                "illegal order transition {from} -> {to}"
            )));
        }

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?3, expires_at = NULL
            WHERE order_id = ?1 AND status = ?2
            "#,
        )
        .bind(order_id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        Ok(GuardOutcome::from_rows_affected(result.rows_affected()))
    }

    /// Deletes an order (and its items) only if it is in `status`.
    pub async fn delete_if_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> DbResult<GuardOutcome> {
        debug!(order_id = %order_id, status = %status, "Guarded order delete");

        let result = sqlx::query("DELETE FROM orders WHERE order_id = ?1 AND status = ?2")
            .bind(order_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(GuardOutcome::from_rows_affected(result.rows_affected()))
    }

    /// Counts live orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates an order id: `{buyer}_{store}_{uuid}`.
///
/// The buyer and store prefix keeps ids readable; the v4 UUID suffix
/// makes them collision-resistant.
pub fn generate_order_id(buyer_id: &str, store_id: &str) -> String {
    format!("{}_{}_{}", buyer_id, store_id, Uuid::new_v4())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;

    fn pending(order_id: &str, items: Vec<LineItem>) -> Order {
        let now = Utc::now();
        Order {
            order_id: order_id.to_string(),
            buyer_id: "alice".to_string(),
            store_id: "s-1".to_string(),
            items,
            status: OrderStatus::PendingPayment,
            expires_at: Some(now),
            created_at: now,
        }
    }

    async fn repo() -> OrderRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().orders()
    }

    #[test]
    fn test_generate_order_id() {
        let a = generate_order_id("alice", "s-1");
        let b = generate_order_id("alice", "s-1");
        assert!(a.starts_with("alice_s-1_"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let orders = repo().await;
        let order = pending(
            "o-1",
            vec![LineItem::new("b-2", 1, 50), LineItem::new("b-1", 3, 100)],
        );
        orders.insert(&order).await.unwrap();

        let loaded = orders.get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::PendingPayment);
        assert_eq!(loaded.items, order.items);
        assert!(loaded.expires_at.is_some());
        assert!(orders.get_by_id("o-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_order_leaves_nothing_behind() {
        let orders = repo().await;
        orders.insert(&pending("o-1", vec![LineItem::new("b", 1, 1)])).await.unwrap();

        let err = orders
            .insert(&pending("o-1", vec![LineItem::new("c", 9, 9)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let items = orders.get_items("o-1").await.unwrap();
        assert_eq!(items, vec![LineItem::new("b", 1, 1)]);
    }

    #[tokio::test]
    async fn test_transition_is_guarded_and_clears_expiry() {
        let orders = repo().await;
        orders.insert(&pending("o-1", vec![LineItem::new("b", 1, 1)])).await.unwrap();

        let first = orders
            .transition("o-1", OrderStatus::PendingPayment, OrderStatus::PendingShipment)
            .await
            .unwrap();
        let second = orders
            .transition("o-1", OrderStatus::PendingPayment, OrderStatus::PendingShipment)
            .await
            .unwrap();
        assert_eq!(first, GuardOutcome::Applied);
        assert_eq!(second, GuardOutcome::Rejected);

        let loaded = orders.get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::PendingShipment);
        assert_eq!(loaded.expires_at, None);
    }

    #[tokio::test]
    async fn test_illegal_transition_is_an_error() {
        let orders = repo().await;
        let err = orders
            .transition("o-1", OrderStatus::Completed, OrderStatus::PendingPayment)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));
    }

    #[tokio::test]
    async fn test_delete_if_status_cascades_items() {
        let orders = repo().await;
        orders.insert(&pending("o-1", vec![LineItem::new("b", 2, 5)])).await.unwrap();

        let wrong = orders
            .delete_if_status("o-1", OrderStatus::PendingShipment)
            .await
            .unwrap();
        assert_eq!(wrong, GuardOutcome::Rejected);

        let deleted = orders
            .delete_if_status("o-1", OrderStatus::PendingPayment)
            .await
            .unwrap();
        assert_eq!(deleted, GuardOutcome::Applied);
        assert!(orders.get_by_id("o-1").await.unwrap().is_none());
        assert!(orders.get_items("o-1").await.unwrap().is_empty());
        assert_eq!(orders.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_active_listing_excludes_completed() {
        let orders = repo().await;
        orders.insert(&pending("o-1", vec![LineItem::new("b", 1, 1)])).await.unwrap();
        orders.insert(&pending("o-2", vec![LineItem::new("b", 1, 1)])).await.unwrap();

        let mut completed = pending("o-3", vec![LineItem::new("b", 1, 1)]);
        completed.status = OrderStatus::Completed;
        completed.expires_at = None;
        orders.insert(&completed).await.unwrap();

        let active: Vec<_> = orders
            .list_active_for_user("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(active, ["o-1", "o-2"]);
    }

    #[tokio::test]
    async fn test_list_expired_pending() {
        let orders = repo().await;
        let mut stale = pending("stale", vec![LineItem::new("b", 1, 1)]);
        stale.expires_at = Some(Utc::now() - Duration::minutes(30));
        let mut fresh = pending("fresh", vec![LineItem::new("b", 1, 1)]);
        fresh.expires_at = Some(Utc::now() + Duration::minutes(30));
        orders.insert(&stale).await.unwrap();
        orders.insert(&fresh).await.unwrap();

        let expired = orders.list_expired_pending(Utc::now()).await.unwrap();
        assert_eq!(expired, ["stale"]);
    }
}
