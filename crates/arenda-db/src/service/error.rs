//! # Service Boundary Error
//!
//! Unified error type returned by the service layer.
//!
//! The excluded HTTP/UI layer needs structured failures (a
//! machine-readable kind plus a human message), not raw exceptions.
//! `ServiceError` keeps the underlying typed error (so callers and
//! tests can still match on `InsufficientAvailability` and friends)
//! and derives the kind from it.

use serde::Serialize;
use thiserror::Error;

use crate::error::DbError;
use arenda_core::{CoreError, ValidationError};

// =============================================================================
// Error Type
// =============================================================================

/// Error returned by catalog, cart, and order services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violation or domain failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

/// Error codes for the UI layer.
///
/// ## Usage
/// ```rust,ignore
/// match svc.create_order(&req).await {
///     Err(e) if e.code() == ErrorCode::InsufficientAvailability => {
///         render_availability_warning(e.message());
///     }
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Admission check failed: not enough free units for the window (409)
    InsufficientAvailability,

    /// Concurrent transaction conflict, already retried once (409)
    Conflict,

    /// Business rule violation (422)
    BusinessLogic,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal invariant violation (500)
    Internal,
}

impl ServiceError {
    /// Machine-readable kind for programmatic handling.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Core(core) => match core {
                CoreError::CategoryNotFound(_)
                | CoreError::ProductNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::CartLineNotFound { .. } => ErrorCode::NotFound,
                CoreError::InsufficientAvailability { .. } => ErrorCode::InsufficientAvailability,
                CoreError::InvalidStatusTransition { .. } | CoreError::EmptyCart { .. } => {
                    ErrorCode::BusinessLogic
                }
                CoreError::InventoryInvariant { .. } => ErrorCode::Internal,
                CoreError::PriceOverflow { .. } | CoreError::Validation(_) => {
                    ErrorCode::ValidationError
                }
            },
            ServiceError::Db(db) => match db {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                    ErrorCode::ValidationError
                }
                DbError::Conflict(_) => ErrorCode::Conflict,
                _ => ErrorCode::DatabaseError,
            },
        }
    }

    /// Human-readable message for display.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether this wraps a retriable concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Db(db) if db.is_conflict())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err: ServiceError = CoreError::ProductNotFound("x".to_string()).into();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err: ServiceError = CoreError::InsufficientAvailability {
            slug: "chairs".to_string(),
            requested: 3,
            available: 2,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InsufficientAvailability);

        let err: ServiceError = DbError::Conflict("database is locked".to_string()).into();
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(err.is_conflict());

        let err: ServiceError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_message_carries_context() {
        let err: ServiceError = CoreError::InsufficientAvailability {
            slug: "folding-chair".to_string(),
            requested: 3,
            available: 2,
        }
        .into();
        assert!(err.message().contains("requested 3"));
        assert!(err.message().contains("available 2"));
    }
}
