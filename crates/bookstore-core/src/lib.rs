//! # bookstore-core: Pure Domain Logic for the Bookstore Order Engine
//!
//! This crate holds the entities, the order status machine and the money
//! arithmetic used by the order engine. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Bookstore Order Engine                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 bookstore-orders                                │   │
//! │  │   OrderLedger ─► InventoryController / AccountLedger            │   │
//! │  │   SearchIndex                                                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ bookstore-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │   Order   │  │   Money   │  │ CoreError │  │   rules   │  │   │
//! │  │   │  Listing  │  │  totals   │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                bookstore-db (Storage Adapter)                   │   │
//! │  │         SQLite, guarded single-statement updates                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (User, Store, BookListing, Order) and the status machine
//! - [`money`] - Money type with checked integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use bookstore_core::{LineItem, OrderStatus};
//!
//! let item = LineItem::new("b-1", 3, 100);
//! assert_eq!(item.subtotal().unwrap().cents(), 300);
//!
//! assert!(OrderStatus::PendingPayment.can_transition_to(OrderStatus::PendingShipment));
//! assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::PendingPayment));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
