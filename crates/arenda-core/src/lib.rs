//! # arenda-core: Pure Business Logic for the Rental Catalog
//!
//! This crate is the **heart** of arenda. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      arenda Architecture                          │
//! │                                                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │            HTTP / Admin UI (out of scope)                   │  │
//! │  └────────────────────────────┬────────────────────────────────┘  │
//! │                               │                                   │
//! │  ┌────────────────────────────▼────────────────────────────────┐  │
//! │  │                arenda-db (Services + SQLite)                │  │
//! │  │   catalog / cart / order services, repositories, txns       │  │
//! │  └────────────────────────────┬────────────────────────────────┘  │
//! │                               │                                   │
//! │  ┌────────────────────────────▼────────────────────────────────┐  │
//! │  │              ★ arenda-core (THIS CRATE) ★                   │  │
//! │  │                                                             │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────────┐ ┌──────┐ ┌──────┐  │  │
//! │  │  │  types  │ │  money  │ │ reservation │ │ slug │ │valid.│  │  │
//! │  │  │ Product │ │  Money  │ │  overlap    │ │assign│ │rules │  │  │
//! │  │  │  Order  │ │ totals  │ │  admission  │ │      │ │      │  │  │
//! │  │  └─────────┘ └─────────┘ └─────────────┘ └──────┘ └──────┘  │  │
//! │  │                                                             │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS        │  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Category, Product, Order, RentalPeriod, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`reservation`] - Overlap-aware availability math and admission
//! - [`slug`] - Collision-resolving URL identifier assignment
//! - [`error`] - Domain error types
//! - [`validation`] - Input shape validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic given its input
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use arenda_core::reservation::{admit, available_quantity};
//!
//! // 5 owned units, 3 reserved by overlapping active orders
//! let available = available_quantity("folding-chair", 5, 3).unwrap();
//! assert_eq!(available, 2);
//!
//! // requesting 3 more for the same window fails the admission check
//! assert!(admit("folding-chair", 3, available).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reservation;
pub mod slug;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use arenda_core::Money` instead of
// `use arenda_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single product on one order or cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Can be made configurable in future versions.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum display-name length for categories and products.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum customer phone length.
pub const MAX_PHONE_LENGTH: usize = 20;

/// Slug collision counter bound before falling back to a random suffix.
///
/// ## Business Reason
/// An unbounded counter probes one candidate per identically named
/// sibling. Past this many, the counter stops and a randomized suffix
/// is used instead.
pub const MAX_SLUG_ATTEMPTS: usize = 64;
