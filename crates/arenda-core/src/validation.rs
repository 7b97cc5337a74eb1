//! # Validation Module
//!
//! Input validation utilities for the rental catalog.
//!
//! ## Validation Strategy
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                            │
//! │                                                                   │
//! │  Layer 1: THIS MODULE - input shape (empty, length, sign)         │
//! │           │                                                       │
//! │           ▼                                                       │
//! │  Layer 2: Services - business rules (availability, transitions)   │
//! │           │                                                       │
//! │           ▼                                                       │
//! │  Layer 3: Database - NOT NULL / UNIQUE / FK / CHECK constraints   │
//! │                                                                   │
//! │  Defense in depth: multiple layers catch different errors         │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::RentalPeriod;
use crate::{MAX_LINE_QUANTITY, MAX_NAME_LENGTH, MAX_PHONE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a category name.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - Must be at most 255 characters
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

/// Validates a product name. Same shape rules as category names;
/// uniqueness within a category is checked by the service layer.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a customer phone number.
///
/// ## Rules
/// - May be empty (guests sometimes leave it blank)
/// - Must be at most 20 characters
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if phone.trim().chars().count() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: MAX_PHONE_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order or cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level (total owned units).
///
/// ## Rules
/// - Must be non-negative (zero stock is a real state)
pub fn validate_stock(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a rental price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (promotional rentals)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a rental window, returning the typed period.
///
/// ## Rules
/// - `end` must be strictly after `start`
pub fn validate_rental_period(start: NaiveDate, end: NaiveDate) -> ValidationResult<RentalPeriod> {
    RentalPeriod::new(start, end)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_names() {
        assert!(validate_category_name("Chairs").is_ok());
        assert!(validate_product_name("Folding Chair (white)").is_ok());

        assert!(validate_category_name("").is_err());
        assert!(validate_category_name("   ").is_err());
        assert!(validate_product_name(&"x".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("+7 701 123 45 67").is_ok());
        assert!(validate_phone(&"9".repeat(30)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(50).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(150_000).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_rental_period() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        assert!(validate_rental_period(start, end).is_ok());
        assert!(validate_rental_period(end, start).is_err());
        assert!(validate_rental_period(start, start).is_err());
    }
}
