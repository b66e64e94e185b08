//! # Domain Types
//!
//! Entities and value types used throughout the bookstore order engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Store      │   │   BookListing   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id        │   │  store_id       │   │  book_id        │       │
//! │  │  password       │   │  owner_id       │   │  stock_level    │       │
//! │  │  balance        │   │                 │   │  price, title.. │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Order      │   │    LineItem     │   │  HistoryEntry   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  order_id       │   │  book_id        │   │  order snapshot │       │
//! │  │  status         │   │  count          │   │  completion_time│       │
//! │  │  expires_at?    │   │  price (frozen) │   │  (no expiry)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// User
// =============================================================================

/// A registered account. Buyers and sellers share this type.
///
/// Completed-order history is stored alongside the user and loaded on
/// demand, see [`HistoryEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub user_id: String,

    /// Opaque credential, compared verbatim.
    pub password: String,

    /// Spendable balance in minor units. Never negative.
    pub balance: i64,
}

impl User {
    /// Checks a presented password against the stored credential.
    #[inline]
    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }
}

// =============================================================================
// Store & Book Listing
// =============================================================================

/// A shop owned by a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub store_id: String,
    /// The seller's user id.
    pub owner_id: String,
}

/// A book offered by a store, with its own stock level and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookListing {
    pub store_id: String,
    /// Unique within the store.
    pub book_id: String,
    /// Never negative.
    pub stock_level: i64,
    /// Unit price in minor units.
    pub price: i64,
    pub title: String,
    pub tags: String,
    pub content: String,
}

impl BookListing {
    /// Checks whether the listing can cover `count` copies right now.
    #[inline]
    pub fn can_reserve(&self, count: i64) -> bool {
        self.stock_level >= count
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order.
///
/// ## State Machine
/// ```text
/// PendingPayment ──pay──► PendingShipment ──ship──► Shipped ──receive──► Completed
///       │
///       └──cancel──► (record deleted)
/// ```
///
/// Every transition is one-way. Cancellation is not a status: the order
/// row is deleted, so there is nothing left to transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Stock is reserved; waiting for the buyer to pay.
    PendingPayment,
    /// Paid; waiting for the seller to ship.
    PendingShipment,
    /// Handed to the carrier; waiting for the buyer to confirm receipt.
    Shipped,
    /// Received by the buyer and archived into their history.
    Completed,
}

impl OrderStatus {
    /// Stable lowercase name, identical to the persisted value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PendingShipment => "pending_shipment",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
        }
    }

    /// The single status this one may move to, if any.
    pub const fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::PendingPayment => Some(OrderStatus::PendingShipment),
            OrderStatus::PendingShipment => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    /// Checks whether `self → to` is a legal forward step.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    /// Only unpaid orders may be cancelled.
    #[inline]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::PendingPayment)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::PendingPayment
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One purchased book within an order.
/// Uses snapshot pattern: the price is frozen when the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    pub book_id: String,
    pub count: i64,
    /// Unit price at the instant of reservation.
    pub price: i64,
}

impl LineItem {
    pub fn new(book_id: impl Into<String>, count: i64, price: i64) -> Self {
        LineItem {
            book_id: book_id.into(),
            count,
            price,
        }
    }

    /// price × count, or `None` on overflow.
    #[inline]
    pub fn subtotal(&self) -> Option<Money> {
        Money::from_cents(self.price).checked_mul_count(self.count)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A live order: pending payment, pending shipment, shipped or completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub buyer_id: String,
    pub store_id: String,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    /// Present only while the order awaits payment; an external reaper may
    /// cancel the order once this instant has passed.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Σ(price × count) over the frozen line items, or `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.subtotal()?))
    }

    /// Checks whether the order belongs to `user_id`.
    #[inline]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.buyer_id == user_id
    }
}

// =============================================================================
// History Entry
// =============================================================================

/// Immutable snapshot of a completed order in the buyer's history.
///
/// Carries no expiry marker and is stamped with the completion instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub order_id: String,
    pub buyer_id: String,
    pub store_id: String,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub completion_time: DateTime<Utc>,
}

impl HistoryEntry {
    /// Strips the live-order bookkeeping from `order` and stamps it completed.
    pub fn from_order(order: &Order, completion_time: DateTime<Utc>) -> Self {
        HistoryEntry {
            order_id: order.order_id.clone(),
            buyer_id: order.buyer_id.clone(),
            store_id: order.store_id.clone(),
            items: order.items.clone(),
            status: OrderStatus::Completed,
            completion_time,
        }
    }
}

// =============================================================================
// Search
// =============================================================================

/// Optional pattern filters for catalog search. `None` matches everything.
///
/// Patterns are regular expressions, matched case-sensitively anywhere in
/// the field. A plain word is therefore a substring match; anchor with `^`
/// or `$` to pin it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub store: Option<String>,
    pub title: Option<String>,
    pub tags: Option<String>,
    pub content: Option<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        SearchFilter::default()
    }

    pub fn store(mut self, pattern: impl Into<String>) -> Self {
        self.store = Some(pattern.into());
        self
    }

    pub fn title(mut self, pattern: impl Into<String>) -> Self {
        self.title = Some(pattern.into());
        self
    }

    pub fn tags(mut self, pattern: impl Into<String>) -> Self {
        self.tags = Some(pattern.into());
        self
    }

    pub fn content(mut self, pattern: impl Into<String>) -> Self {
        self.content = Some(pattern.into());
        self
    }

    /// Empty patterns are treated as omitted.
    pub fn normalized(self) -> Self {
        fn keep(p: Option<String>) -> Option<String> {
            p.filter(|s| !s.is_empty())
        }
        SearchFilter {
            store: keep(self.store),
            title: keep(self.title),
            tags: keep(self.tags),
            content: keep(self.content),
        }
    }
}

impl SearchFilter {
    /// Compiles the present patterns.
    ///
    /// ## Example
    /// ```rust
    /// use bookstore_core::SearchFilter;
    ///
    /// let matcher = SearchFilter::new().title("^Rust").compile().unwrap();
    /// assert!(matcher.matches("s-1", "Rust in Action", "", ""));
    /// assert!(!matcher.matches("s-1", "Programming Rust", "", ""));
    ///
    /// assert!(SearchFilter::new().tags("(").compile().is_err());
    /// ```
    pub fn compile(&self) -> Result<CatalogMatcher, ValidationError> {
        fn build(field: &str, pattern: Option<&String>) -> Result<Option<Regex>, ValidationError> {
            pattern
                .filter(|p| !p.is_empty())
                .map(|p| {
                    Regex::new(p).map_err(|e| ValidationError::InvalidPattern {
                        field: field.to_string(),
                        reason: e.to_string(),
                    })
                })
                .transpose()
        }

        Ok(CatalogMatcher {
            store: build("store", self.store.as_ref())?,
            title: build("title", self.title.as_ref())?,
            tags: build("tags", self.tags.as_ref())?,
            content: build("content", self.content.as_ref())?,
        })
    }
}

/// Compiled form of a [`SearchFilter`].
#[derive(Debug, Clone, Default)]
pub struct CatalogMatcher {
    store: Option<Regex>,
    title: Option<Regex>,
    tags: Option<Regex>,
    content: Option<Regex>,
}

impl CatalogMatcher {
    /// True when every present pattern matches its field.
    pub fn matches(&self, store_id: &str, title: &str, tags: &str, content: &str) -> bool {
        fn hit(re: &Option<Regex>, text: &str) -> bool {
            re.as_ref().map_or(true, |re| re.is_match(text))
        }

        hit(&self.store, store_id)
            && hit(&self.title, title)
            && hit(&self.tags, tags)
            && hit(&self.content, content)
    }
}

/// One (store, book) row produced by catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SearchHit {
    pub store_id: String,
    pub book_id: String,
    pub title: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order(items: Vec<LineItem>) -> Order {
        Order {
            order_id: "u_s_1".to_string(),
            buyer_id: "u".to_string(),
            store_id: "s".to_string(),
            items,
            status: OrderStatus::PendingPayment,
            expires_at: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_transitions_are_one_way() {
        use OrderStatus::*;
        assert!(PendingPayment.can_transition_to(PendingShipment));
        assert!(PendingShipment.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));

        assert!(!PendingShipment.can_transition_to(PendingPayment));
        assert!(!PendingPayment.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Completed));
        assert_eq!(Completed.next(), None);
    }

    #[test]
    fn test_only_pending_payment_is_cancellable() {
        assert!(OrderStatus::PendingPayment.is_cancellable());
        assert!(!OrderStatus::PendingShipment.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Completed.is_cancellable());
    }

    #[test]
    fn test_status_serde_matches_storage_name() {
        for status in [
            OrderStatus::PendingPayment,
            OrderStatus::PendingShipment,
            OrderStatus::Shipped,
            OrderStatus::Completed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_order_total_uses_frozen_prices() {
        let o = order(vec![LineItem::new("a", 3, 100), LineItem::new("b", 2, 250)]);
        assert_eq!(o.total(), Some(Money::from_cents(800)));
    }

    #[test]
    fn test_order_total_overflow() {
        let o = order(vec![
            LineItem::new("a", 1, i64::MAX),
            LineItem::new("b", 1, 1),
        ]);
        assert_eq!(o.total(), None);
    }

    #[test]
    fn test_history_entry_strips_expiry() {
        let o = order(vec![LineItem::new("a", 3, 100)]);
        let done = Utc::now();
        let entry = HistoryEntry::from_order(&o, done);

        assert_eq!(entry.status, OrderStatus::Completed);
        assert_eq!(entry.completion_time, done);
        assert_eq!(entry.items, o.items);

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("expires_at").is_none());
        assert!(json.get("completion_time").is_some());
    }

    #[test]
    fn test_catalog_matcher_uses_regex_semantics() {
        let m = SearchFilter::new().title("^Title.*B$").compile().unwrap();
        assert!(m.matches("S", "Title of B", "", ""));
        assert!(!m.matches("S", "Title of BB2", "", ""));

        let m = SearchFilter::new().store("S").content("sp.ce").compile().unwrap();
        assert!(m.matches("NS-1", "", "", "a spice trade"));
        assert!(!m.matches("ns-1", "", "", "a spice trade"));
        assert!(!m.matches("S", "", "", "spoken word"));

        assert!(SearchFilter::new().compile().unwrap().matches("", "", "", ""));
    }

    #[test]
    fn test_invalid_pattern_is_a_validation_error() {
        let err = SearchFilter::new().content("[unclosed").compile().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPattern { ref field, .. } if field == "content"));
    }

    #[test]
    fn test_search_filter_drops_empty_patterns() {
        let f = SearchFilter::new().store("").title("Rust").normalized();
        assert_eq!(f.store, None);
        assert_eq!(f.title.as_deref(), Some("Rust"));
    }
}
