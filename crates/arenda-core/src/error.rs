//! # Error Types
//!
//! Domain-specific error types for arenda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Error Types                               │
//! │                                                                   │
//! │  arenda-core errors (this file)                                   │
//! │  ├── CoreError        - Business rule violations                  │
//! │  └── ValidationError  - Input validation failures                 │
//! │                                                                   │
//! │  arenda-db errors (separate crate)                                │
//! │  ├── DbError          - Database operation failures               │
//! │  └── ServiceError     - What callers of the service layer see     │
//! │                                                                   │
//! │  Flow: ValidationError → CoreError → ServiceError → UI layer      │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (slug, quantities, dates)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Category cannot be found.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Slug or ID doesn't exist in the catalog
    /// - Product was cascade-deleted with its category
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Cart line cannot be found for a (user, product) pair.
    #[error("No cart line for product {product} in cart of user {user_id}")]
    CartLineNotFound { user_id: String, product: String },

    /// The admission check failed: the requested quantity does not fit
    /// within the availability left by overlapping active orders.
    ///
    /// ## When This Occurs
    /// ```text
    /// create_order (qty: 3, [2024-06-05, 2024-06-08])
    ///      │
    ///      ▼
    /// reserved([2024-06-05, 2024-06-08]) = 3, total = 5
    ///      │
    ///      ▼
    /// InsufficientAvailability { slug: "folding-chair", requested: 3, available: 2 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 units free for those dates"
    /// ```
    #[error("Insufficient availability for {slug}: requested {requested}, available {available}")]
    InsufficientAvailability {
        slug: String,
        requested: i64,
        available: i64,
    },

    /// Order is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Confirming an order that is not pending
    /// - Completing an order that was never confirmed
    #[error("Order {order_id} is {from}, cannot transition to {to}")]
    InvalidStatusTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// Checkout was attempted with an empty cart.
    #[error("Cart of user {user_id} is empty")]
    EmptyCart { user_id: String },

    /// The inventory ledger would be driven into an impossible state.
    ///
    /// A negative computed quantity means reservations and stock have
    /// diverged; the write is rejected, never clamped.
    #[error("Inventory invariant violated for {product}: total {total}, computed {computed}")]
    InventoryInvariant {
        product: String,
        total: i64,
        computed: i64,
    },

    /// `price * quantity` does not fit in the cents representation.
    #[error("Total price overflows: {price_cents} cents x {quantity}")]
    PriceOverflow { price_cents: i64, quantity: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A rental window where the end does not come after the start.
    #[error("End date {end} must be after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Invalid format (e.g., a name that normalizes to an empty slug).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate product name within a category).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
        let err = CoreError::InsufficientAvailability {
            slug: "folding-chair".to_string(),
            requested: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient availability for folding-chair: requested 3, available 2"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvalidDateRange {
            start: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "End date 2024-06-01 must be after start date 2024-06-10"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
