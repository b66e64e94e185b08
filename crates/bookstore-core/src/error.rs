//! # Error Types
//!
//! Domain-specific error types for bookstore-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bookstore-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bookstore-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bookstore-orders errors                                               │
//! │  └── LedgerError      - What callers see (stable numeric code)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                           DbError  ─┴─► LedgerError → Caller           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the order engine.
///
/// Storage and unanticipated failures are not modelled here; they come from
/// the database layer and are folded in by `bookstore-orders`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No user with this id.
    #[error("non exist user id {0}")]
    UnknownUser(String),

    /// No store with this id.
    #[error("non exist store id {0}")]
    UnknownStore(String),

    /// The store has no listing for this book.
    #[error("non exist book id {0}")]
    UnknownBook(String),

    /// Requested count is more than the listing holds.
    ///
    /// ## User Workflow
    /// ```text
    /// create_order([(B, 10)])
    ///      │
    ///      ▼
    /// Check stock: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { book_id: "B", available: 5, requested: 10 }
    ///      │
    ///      ▼
    /// Earlier reservations of the same order are released
    /// ```
    #[error("stock level low, book id {book_id}: available {available}, requested {requested}")]
    InsufficientStock {
        book_id: String,
        available: i64,
        requested: i64,
    },

    /// Buyer balance cannot cover the order total.
    #[error("not sufficient funds for user {user_id}: required {required}, available {available}")]
    InsufficientFunds {
        user_id: String,
        required: i64,
        available: i64,
    },

    /// User id and password do not match.
    #[error("authorization fail")]
    BadCredential,

    /// The caller is authenticated but does not own the resource.
    #[error("user {user_id} is not allowed to act on order {order_id}")]
    Unauthorized { user_id: String, order_id: String },

    /// No live order with this id.
    #[error("invalid order id {0}")]
    UnknownOrder(String),

    /// Order has already left `PendingPayment`.
    #[error("order {0} has already been paid")]
    AlreadyPaid(String),

    /// Order has already been handed to the carrier.
    #[error("order {0} has already been shipped")]
    AlreadyShipped(String),

    /// Order has already been received.
    #[error("order {0} has already been received")]
    AlreadyReceived(String),

    /// Order has not reached the state the operation needs.
    ///
    /// ## When This Occurs
    /// - `receive` while the order is unpaid or waiting for shipment
    /// - `ship` while the order is unpaid
    #[error("order {order_id} is {status}, please wait for it to be shipped")]
    NotYetShippable { order_id: String, status: OrderStatus },

    /// Only unpaid orders can be cancelled.
    #[error("order {order_id} is {status} and can no longer be cancelled")]
    CannotCancel { order_id: String, status: OrderStatus },

    /// An order total does not fit in the money type.
    #[error("order {0} total overflows")]
    AmountOverflow(String),

    /// A credit would push a balance past the largest storable amount.
    #[error("crediting {amount} would overflow the balance of user {user_id} ({balance})")]
    BalanceOverflow {
        user_id: String,
        balance: i64,
        amount: i64,
    },

    /// A release would push a stock level past the largest storable count.
    #[error("returning {count} copies would overflow the stock of book id {book_id} ({stock_level})")]
    StockOverflow {
        book_id: String,
        stock_level: i64,
        count: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write, so a rejected request changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A search pattern does not compile.
    #[error("{field} is not a valid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            book_id: "b-1".to_string(),
            available: 5,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "stock level low, book id b-1: available 5, requested 10"
        );

        let err = CoreError::NotYetShippable {
            order_id: "o-1".to_string(),
            status: OrderStatus::PendingShipment,
        };
        assert_eq!(
            err.to_string(),
            "order o-1 is pending_shipment, please wait for it to be shipped"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "count".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
