//! # Repository Module
//!
//! Database repository implementations for the order engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and their guards                        │
//! │                                                                         │
//! │  UserRepository                                                        │
//! │  ├── try_debit(user, amount)      WHERE balance >= amount              │
//! │  ├── credit(user, amount)         WHERE balance <= MAX - amount        │
//! │  └── append_history / history                                          │
//! │                                                                         │
//! │  StoreRepository                                                       │
//! │  ├── try_decrement_stock(...)     WHERE stock_level >= count           │
//! │  └── increment_stock(...)         WHERE stock_level <= MAX - count     │
//! │                                                                         │
//! │  OrderRepository                                                       │
//! │  ├── insert(order)                one transaction, header + items      │
//! │  ├── transition(id, from, to)     WHERE status = from                  │
//! │  └── delete_if_status(id, s)      WHERE status = s                     │
//! │                                                                         │
//! │  SearchRepository                                                      │
//! │  └── search(filter)               stores ⋈ books, filter, project      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod order;
pub mod search;
pub mod store;
pub mod user;

/// Result of a guarded single-statement write.
///
/// `Rejected` means the row was missing or the guard predicate was false
/// at the instant SQLite evaluated it. Nothing was written in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Applied,
    Rejected,
}

impl GuardOutcome {
    /// Maps `rows_affected()` of a keyed statement to an outcome.
    pub(crate) fn from_rows_affected(rows: u64) -> Self {
        if rows == 0 {
            GuardOutcome::Rejected
        } else {
            GuardOutcome::Applied
        }
    }
}
