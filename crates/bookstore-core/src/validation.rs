//! # Validation Module
//!
//! Input checks applied before any storage write.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE                                                  │
//! │  ├── Counts and amounts are positive                                   │
//! │  └── Line lists are non-empty                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Guarded updates (bookstore-db)                               │
//! │  ├── stock_level >= count                                              │
//! │  └── balance >= total                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite CHECK constraints                                     │
//! │  └── stock_level >= 0, balance >= 0                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates the count requested for one line item.
///
/// ## Rules
/// - Must be positive (> 0): a zero or negative count would turn a
///   reservation into a restock
///
/// There is no upper bound. A count beyond the available stock is refused
/// by the stock guard as insufficient stock.
pub fn validate_count(count: i64) -> ValidationResult<()> {
    if count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "count".to_string(),
        });
    }

    Ok(())
}

/// Validates the line list of a new order.
///
/// Book ids are not checked here; an id with no listing in the store is
/// reported as an unknown book during reservation.
///
/// ## Example
/// ```rust
/// use bookstore_core::validation::validate_line_items;
///
/// assert!(validate_line_items(&[("b-1".to_string(), 20_000)]).is_ok());
/// assert!(validate_line_items(&[("b-1".to_string(), 0)]).is_err());
/// assert!(validate_line_items(&[]).is_err());
/// ```
pub fn validate_line_items(items: &[(String, i64)]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "books".to_string(),
        });
    }

    for (_, count) in items {
        validate_count(*count)?;
    }

    Ok(())
}

/// Validates a balance top-up.
///
/// ## Rules
/// - Must be positive: a negative top-up would be an unguarded debit
pub fn validate_top_up(amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_count() {
        assert!(validate_count(1).is_ok());
        assert!(validate_count(i64::MAX).is_ok());
        assert!(matches!(
            validate_count(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_count(-3).is_err());
    }

    #[test]
    fn test_validate_line_items() {
        assert!(validate_line_items(&[("b".to_string(), 2)]).is_ok());
        assert!(matches!(
            validate_line_items(&[]),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_line_items(&[("b".to_string(), 0)]).is_err());

        // Book ids and line counts are left to the catalog.
        assert!(validate_line_items(&[("".to_string(), 2)]).is_ok());
        let many: Vec<(String, i64)> = (0..500).map(|i| (format!("b{i}"), 1)).collect();
        assert!(validate_line_items(&many).is_ok());
    }

    #[test]
    fn test_validate_top_up() {
        assert!(validate_top_up(1).is_ok());
        assert!(validate_top_up(0).is_err());
        assert!(validate_top_up(-100).is_err());
    }
}
