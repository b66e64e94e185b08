//! # Order Ledger
//!
//! Drives an order through its lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Lifecycle                                  │
//! │                                                                         │
//! │  create_order ──► PendingPayment ──pay──► PendingShipment              │
//! │                        │                        │                       │
//! │                     cancel                    ship (seller)             │
//! │                        │                        ▼                       │
//! │                        ▼                     Shipped ──receive──►       │
//! │               (deleted, stock back)                    Completed        │
//! │                                                       + history entry   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Multi-step Sequences
//!
//! Each storage call is atomic on its own; a sequence of them is not.
//! Partial progress is undone by compensation:
//!
//! | Operation | Step that can fail | Compensation |
//! |---|---|---|
//! | `create_order` | a later line, or the order insert | release earlier reservations |
//! | `pay` | status transition after the debit | credit the debit back |
//! | `cancel` | nothing after the guarded delete | (restock only) |
//!
//! A process crash between two steps is NOT compensated: stock can stay
//! reserved without an order, or a balance debited while the order is
//! still unpaid. Both windows are logged at `error` level when a
//! compensation itself fails.

use std::time::Duration;

use bookstore_core::validation::{validate_line_items, validate_top_up};
use bookstore_core::{CoreError, HistoryEntry, Order, OrderStatus};
use bookstore_db::{generate_order_id, Database, GuardOutcome};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::accounts::AccountLedger;
use crate::error::{ErrorCode, LedgerError, LedgerResult};
use crate::inventory::{InventoryController, Reservation};

/// Order lifecycle service.
#[derive(Debug, Clone)]
pub struct OrderLedger {
    db: Database,
    inventory: InventoryController,
    accounts: AccountLedger,
    pending_ttl: Duration,
}

impl OrderLedger {
    /// Creates a ledger over an injected database handle.
    pub fn new(
        db: Database,
        inventory: InventoryController,
        accounts: AccountLedger,
        pending_ttl: Duration,
    ) -> Self {
        OrderLedger {
            db,
            inventory,
            accounts,
            pending_ttl,
        }
    }

    // =========================================================================
    // create_order
    // =========================================================================

    /// Reserves every line and persists a new unpaid order.
    ///
    /// Lines are reserved in input order at the price seen at that instant.
    /// If any line fails, or the order cannot be stored, every reservation
    /// already made is released and no order exists afterwards.
    pub async fn create_order(
        &self,
        buyer_id: &str,
        store_id: &str,
        books: &[(String, i64)],
    ) -> LedgerResult<String> {
        debug!(buyer_id, store_id, lines = books.len(), "create_order");

        if !self.db.users().exists(buyer_id).await? {
            return Err(CoreError::UnknownUser(buyer_id.to_string()).into());
        }
        if self.db.stores().get_by_id(store_id).await?.is_none() {
            return Err(CoreError::UnknownStore(store_id.to_string()).into());
        }

        validate_line_items(books)?;

        let mut reserved: Vec<Reservation> = Vec::with_capacity(books.len());
        for (book_id, count) in books {
            match self.inventory.try_reserve(store_id, book_id, *count).await {
                Ok(r) => reserved.push(r),
                Err(e) => {
                    self.roll_back(&reserved, "line reservation failed").await;
                    return Err(e);
                }
            }
        }

        let now = Utc::now();
        let order = Order {
            order_id: generate_order_id(buyer_id, store_id),
            buyer_id: buyer_id.to_string(),
            store_id: store_id.to_string(),
            items: reserved.iter().map(Reservation::to_line_item).collect(),
            status: OrderStatus::PendingPayment,
            expires_at: Some(self.expiry_from(now)),
            created_at: now,
        };

        if let Err(e) = self.db.orders().insert(&order).await {
            self.roll_back(&reserved, "order insert failed").await;
            return Err(e.into());
        }

        info!(order_id = %order.order_id, buyer_id, store_id, "Order created");
        Ok(order.order_id)
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.pending_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(now)
    }

    async fn roll_back(&self, reserved: &[Reservation], reason: &str) {
        if reserved.is_empty() {
            return;
        }
        warn!(lines = reserved.len(), reason, "Releasing reservations of failed order");
        let failed = self.inventory.release_all(reserved).await;
        if failed > 0 {
            error!(failed, "Reservations could not be released; stock is stranded");
        }
    }

    // =========================================================================
    // pay
    // =========================================================================

    /// Debits the buyer and moves the order to `PendingShipment`.
    pub async fn pay(&self, buyer_id: &str, password: &str, order_id: &str) -> LedgerResult<()> {
        debug!(buyer_id, order_id, "pay");

        let order = self.load_order(order_id).await?;

        match order.status {
            OrderStatus::PendingPayment => {}
            OrderStatus::PendingShipment | OrderStatus::Shipped | OrderStatus::Completed => {
                return Err(CoreError::AlreadyPaid(order_id.to_string()).into());
            }
        }

        if !order.is_owned_by(buyer_id) {
            return Err(unauthorized(buyer_id, order_id));
        }

        let buyer = self.accounts.authenticate(&order.buyer_id, password).await?;

        let store = self
            .db
            .stores()
            .get_by_id(&order.store_id)
            .await?
            .ok_or_else(|| CoreError::UnknownStore(order.store_id.clone()))?;
        if !self.db.users().exists(&store.owner_id).await? {
            return Err(CoreError::UnknownUser(store.owner_id).into());
        }

        let total = order
            .total()
            .ok_or_else(|| CoreError::AmountOverflow(order_id.to_string()))?
            .cents();

        if buyer.balance < total {
            return Err(CoreError::InsufficientFunds {
                user_id: buyer.user_id,
                required: total,
                available: buyer.balance,
            }
            .into());
        }

        self.accounts.try_debit(&buyer.user_id, total).await?;

        let outcome = self
            .db
            .orders()
            .transition(order_id, OrderStatus::PendingPayment, OrderStatus::PendingShipment)
            .await;

        match outcome {
            Ok(GuardOutcome::Applied) => {
                info!(order_id, buyer_id, total, "Order paid");
                Ok(())
            }
            Ok(GuardOutcome::Rejected) => {
                warn!(order_id, total, "Order left pending payment during pay; refunding");
                self.refund(&buyer.user_id, total, order_id).await;
                Err(self.explain_lost_payment(order_id).await)
            }
            Err(e) => {
                self.refund(&buyer.user_id, total, order_id).await;
                Err(e.into())
            }
        }
    }

    async fn refund(&self, user_id: &str, amount: i64, order_id: &str) {
        if let Err(e) = self.accounts.credit(user_id, amount).await {
            error!(
                user_id,
                order_id,
                amount,
                error = %e,
                "Refund failed; balance debited without a paid order"
            );
        }
    }

    /// Error for a payment whose status transition lost a race.
    async fn explain_lost_payment(&self, order_id: &str) -> LedgerError {
        match self.db.orders().get_by_id(order_id).await {
            Ok(Some(_)) => CoreError::AlreadyPaid(order_id.to_string()).into(),
            Ok(None) => CoreError::UnknownOrder(order_id.to_string()).into(),
            Err(e) => e.into(),
        }
    }

    // =========================================================================
    // add_funds
    // =========================================================================

    /// Adds a positive amount to the caller's balance.
    ///
    /// A missing user is reported as `BadCredential`, same as a wrong
    /// password. A top-up that would overflow the balance fails
    /// `InvalidInput` and changes nothing.
    pub async fn add_funds(&self, user_id: &str, password: &str, amount: i64) -> LedgerResult<()> {
        debug!(user_id, amount, "add_funds");

        validate_top_up(amount)?;

        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(CoreError::BadCredential)?;
        if !user.password_matches(password) {
            return Err(CoreError::BadCredential.into());
        }

        self.accounts.credit(user_id, amount).await?;
        info!(user_id, amount, "Funds added");
        Ok(())
    }

    // =========================================================================
    // ship
    // =========================================================================

    /// Hands a paid order to the carrier. Only the store owner may ship.
    pub async fn ship(&self, seller_id: &str, password: &str, order_id: &str) -> LedgerResult<()> {
        debug!(seller_id, order_id, "ship");

        self.accounts.authenticate(seller_id, password).await?;
        let order = self.load_order(order_id).await?;

        let store = self
            .db
            .stores()
            .get_by_id(&order.store_id)
            .await?
            .ok_or_else(|| CoreError::UnknownStore(order.store_id.clone()))?;
        if store.owner_id != seller_id {
            return Err(unauthorized(seller_id, order_id));
        }

        match order.status {
            OrderStatus::PendingPayment => {
                return Err(CoreError::NotYetShippable {
                    order_id: order_id.to_string(),
                    status: order.status,
                }
                .into());
            }
            OrderStatus::Shipped | OrderStatus::Completed => {
                return Err(CoreError::AlreadyShipped(order_id.to_string()).into());
            }
            OrderStatus::PendingShipment => {}
        }

        match self
            .db
            .orders()
            .transition(order_id, OrderStatus::PendingShipment, OrderStatus::Shipped)
            .await?
        {
            GuardOutcome::Applied => {
                info!(order_id, seller_id, "Order shipped");
                Ok(())
            }
            GuardOutcome::Rejected => match self.db.orders().get_by_id(order_id).await? {
                Some(_) => Err(CoreError::AlreadyShipped(order_id.to_string()).into()),
                None => Err(CoreError::UnknownOrder(order_id.to_string()).into()),
            },
        }
    }

    // =========================================================================
    // receive
    // =========================================================================

    /// Completes a shipped order and appends it to the buyer's history.
    pub async fn receive(&self, user_id: &str, password: &str, order_id: &str) -> LedgerResult<()> {
        debug!(user_id, order_id, "receive");

        self.accounts.authenticate(user_id, password).await?;
        let order = self.load_order(order_id).await?;

        if !order.is_owned_by(user_id) {
            return Err(unauthorized(user_id, order_id));
        }

        match order.status {
            OrderStatus::Completed => {
                return Err(CoreError::AlreadyReceived(order_id.to_string()).into());
            }
            OrderStatus::PendingPayment | OrderStatus::PendingShipment => {
                return Err(CoreError::NotYetShippable {
                    order_id: order_id.to_string(),
                    status: order.status,
                }
                .into());
            }
            OrderStatus::Shipped => {}
        }

        match self
            .db
            .orders()
            .transition(order_id, OrderStatus::Shipped, OrderStatus::Completed)
            .await?
        {
            GuardOutcome::Applied => {}
            GuardOutcome::Rejected => {
                return Err(CoreError::AlreadyReceived(order_id.to_string()).into());
            }
        }

        let entry = HistoryEntry::from_order(&order, Utc::now());
        if let Err(e) = self.db.users().append_history(user_id, &entry).await {
            error!(order_id, user_id, error = %e, "Order completed but history entry was not written");
            return Err(e.into());
        }

        info!(order_id, user_id, "Order received");
        Ok(())
    }

    // =========================================================================
    // cancel
    // =========================================================================

    /// Deletes an unpaid order and puts its stock back.
    pub async fn cancel(&self, user_id: &str, password: &str, order_id: &str) -> LedgerResult<()> {
        debug!(user_id, order_id, "cancel");

        self.accounts.authenticate(user_id, password).await?;
        let order = self.load_order(order_id).await?;

        if !order.is_owned_by(user_id) {
            return Err(unauthorized(user_id, order_id));
        }

        if !order.status.is_cancellable() {
            return Err(CoreError::CannotCancel {
                order_id: order_id.to_string(),
                status: order.status,
            }
            .into());
        }

        match self
            .db
            .orders()
            .delete_if_status(order_id, OrderStatus::PendingPayment)
            .await?
        {
            GuardOutcome::Applied => {}
            GuardOutcome::Rejected => {
                let err = match self.db.orders().get_by_id(order_id).await? {
                    Some(current) => CoreError::CannotCancel {
                        order_id: order_id.to_string(),
                        status: current.status,
                    },
                    None => CoreError::UnknownOrder(order_id.to_string()),
                };
                return Err(err.into());
            }
        }

        let reserved: Vec<Reservation> = order
            .items
            .iter()
            .map(|item| Reservation {
                store_id: order.store_id.clone(),
                book_id: item.book_id.clone(),
                count: item.count,
                price: item.price,
            })
            .collect();

        let failed = self.inventory.release_all(&reserved).await;
        if failed > 0 {
            return Err(LedgerError::new(
                ErrorCode::StorageFailure,
                format!("order {order_id} cancelled but {failed} line(s) were not restocked"),
            ));
        }

        info!(order_id, user_id, "Order cancelled");
        Ok(())
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    /// Returns the caller's completed-order history, oldest first.
    pub async fn history(&self, user_id: &str, password: &str) -> LedgerResult<Vec<HistoryEntry>> {
        self.accounts.authenticate(user_id, password).await?;
        Ok(self.db.users().history(user_id).await?)
    }

    /// Returns one of the caller's live orders.
    pub async fn get_order(&self, user_id: &str, password: &str, order_id: &str) -> LedgerResult<Order> {
        self.accounts.authenticate(user_id, password).await?;
        let order = self.load_order(order_id).await?;
        if !order.is_owned_by(user_id) {
            return Err(unauthorized(user_id, order_id));
        }
        Ok(order)
    }

    /// Lists the caller's orders that have not completed yet.
    pub async fn active_orders(&self, user_id: &str, password: &str) -> LedgerResult<Vec<Order>> {
        self.accounts.authenticate(user_id, password).await?;
        Ok(self.db.orders().list_active_for_user(user_id).await?)
    }

    /// Ids of unpaid orders whose expiry marker is at or before `cutoff`.
    pub async fn expired_orders(&self, cutoff: DateTime<Utc>) -> LedgerResult<Vec<String>> {
        Ok(self.db.orders().list_expired_pending(cutoff).await?)
    }

    async fn load_order(&self, order_id: &str) -> LedgerResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::UnknownOrder(order_id.to_string()).into())
    }
}

fn unauthorized(user_id: &str, order_id: &str) -> LedgerError {
    CoreError::Unauthorized {
        user_id: user_id.to_string(),
        order_id: order_id.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
