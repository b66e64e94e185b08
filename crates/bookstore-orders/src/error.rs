//! # Ledger Error Type
//!
//! Unified error type returned by every public operation of the order engine.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Order Engine                       │
//! │                                                                         │
//! │  Caller (HTTP layer)          bookstore-orders                          │
//! │  ───────────────────          ────────────────                          │
//! │                                                                         │
//! │  ledger.pay(..)                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Operation                                                       │  │
//! │  │  Result<T, LedgerError>                                          │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage Error? ─── DbError::QueryFailed("...") ───┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Rule Violation? ─── CoreError::AlreadyPaid ── LedgerError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  match err.code.as_u16() {                                             │
//! │      519 => /* top up and retry */,                                    │
//! │      520 => /* already paid, nothing to do */,                         │
//! │      _   => /* show err.message */,                                    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers branch on [`ErrorCode`], never on the message text.

use std::fmt;

use bookstore_core::{CoreError, ValidationError};
use bookstore_db::DbError;
use serde::Serialize;

/// Numeric code reported for a successful operation.
pub const SUCCESS_CODE: u16 = 200;

/// Error returned from every ledger operation.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_FUNDS",
///   "message": "not sufficient funds for user u-1: required 300, available 120"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerError {
    /// Machine-readable error kind
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Closed set of error kinds, each with a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request failed input validation (400)
    InvalidInput,

    /// User id and password do not match (401)
    BadCredential,

    /// Caller does not own the order or store (403)
    Unauthorized,

    /// Buyer or seller does not exist (511)
    UnknownUser,

    /// Store does not exist (513)
    UnknownStore,

    /// Store has no listing for the book (515)
    UnknownBook,

    /// Listing holds fewer copies than requested (517)
    InsufficientStock,

    /// Order does not exist (518)
    UnknownOrder,

    /// Balance cannot cover the order total (519)
    InsufficientFunds,

    /// Order is past pending payment (520)
    AlreadyPaid,

    /// Order has been handed to the carrier (522)
    AlreadyShipped,

    /// Order is completed (523)
    AlreadyReceived,

    /// Order has not been shipped yet (524)
    NotYetShippable,

    /// Order is not cancellable in its current state (525)
    CannotCancel,

    /// Underlying persistence error (528)
    StorageFailure,

    /// Anything unanticipated (530)
    InternalFailure,
}

impl ErrorCode {
    /// Returns the stable numeric code.
    pub fn as_u16(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::BadCredential => 401,
            ErrorCode::Unauthorized => 403,
            ErrorCode::UnknownUser => 511,
            ErrorCode::UnknownStore => 513,
            ErrorCode::UnknownBook => 515,
            ErrorCode::InsufficientStock => 517,
            ErrorCode::UnknownOrder => 518,
            ErrorCode::InsufficientFunds => 519,
            ErrorCode::AlreadyPaid => 520,
            ErrorCode::AlreadyShipped => 522,
            ErrorCode::AlreadyReceived => 523,
            ErrorCode::NotYetShippable => 524,
            ErrorCode::CannotCancel => 525,
            ErrorCode::StorageFailure => 528,
            ErrorCode::InternalFailure => 530,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

impl LedgerError {
    /// Creates a new ledger error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        LedgerError {
            code,
            message: message.into(),
        }
    }

    /// Creates an internal failure.
    pub fn internal(message: impl Into<String>) -> Self {
        LedgerError::new(ErrorCode::InternalFailure, message)
    }

    /// Numeric code of this error.
    pub fn status(&self) -> u16 {
        self.code.as_u16()
    }
}

/// Converts domain errors to ledger errors.
impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::UnknownUser(_) => ErrorCode::UnknownUser,
            CoreError::UnknownStore(_) => ErrorCode::UnknownStore,
            CoreError::UnknownBook(_) => ErrorCode::UnknownBook,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            CoreError::BadCredential => ErrorCode::BadCredential,
            CoreError::Unauthorized { .. } => ErrorCode::Unauthorized,
            CoreError::UnknownOrder(_) => ErrorCode::UnknownOrder,
            CoreError::AlreadyPaid(_) => ErrorCode::AlreadyPaid,
            CoreError::AlreadyShipped(_) => ErrorCode::AlreadyShipped,
            CoreError::AlreadyReceived(_) => ErrorCode::AlreadyReceived,
            CoreError::NotYetShippable { .. } => ErrorCode::NotYetShippable,
            CoreError::CannotCancel { .. } => ErrorCode::CannotCancel,
            CoreError::AmountOverflow(_) => ErrorCode::InternalFailure,
            CoreError::BalanceOverflow { .. } => ErrorCode::InvalidInput,
            CoreError::StockOverflow { .. } => ErrorCode::InternalFailure,
            CoreError::Validation(_) => ErrorCode::InvalidInput,
        };
        LedgerError::new(code, err.to_string())
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::new(ErrorCode::InvalidInput, err.to_string())
    }
}

/// Converts storage errors to ledger errors.
///
/// The storage detail is logged here and a generic message is returned.
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                LedgerError::new(ErrorCode::StorageFailure, "Database connection failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                LedgerError::new(ErrorCode::StorageFailure, "Database pool exhausted")
            }
            DbError::Corrupt(e) => {
                tracing::error!("Stored record could not be decoded: {}", e);
                LedgerError::new(ErrorCode::StorageFailure, "Stored record is corrupt")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                LedgerError::internal("Unexpected internal failure")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                LedgerError::new(ErrorCode::StorageFailure, "Database operation failed")
            }
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for LedgerError {}

/// Convenience type alias for ledger operation results.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================
