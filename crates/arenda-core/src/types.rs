//! # Domain Types
//!
//! Core domain types for the rental catalog.
//!
//! ## Type Hierarchy
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                              │
//! │                                                                   │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐     │
//! │  │   Category     │   │    Product     │   │     Order      │     │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │     │
//! │  │  id (UUID)     │◄──│  category_id   │◄──│  product_id    │     │
//! │  │  name (unique) │   │  slug (unique) │   │  RentalPeriod  │     │
//! │  │  slug (unique) │   │  quantity      │   │  quantity      │     │
//! │  └────────────────┘   │  price_cents   │   │  total_price   │     │
//! │                       └────────────────┘   └────────────────┘     │
//! │                                                                   │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐     │
//! │  │  RentalPeriod  │   │ ProductStatus  │   │  OrderStatus   │     │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │     │
//! │  │  start < end   │   │  Available     │   │  Pending       │     │
//! │  │  overlaps()    │   │  Rented        │   │  Confirmed     │     │
//! │  └────────────────┘   │  Unavailable   │   │  Completed     │     │
//! │                       └────────────────┘   │  Canceled      │     │
//! │                                            └────────────────┘     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Catalog entities have:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `slug`: URL-safe business identifier, regenerated only on rename

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Rental Period
// =============================================================================

/// A rental window with inclusive day bounds.
///
/// Both endpoints count as rented days: an order ending 2024-01-20 still
/// holds its units on the 20th, so a window starting that day overlaps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RentalPeriod {
    /// Creates a rental period, rejecting `end <= start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(RentalPeriod { start, end })
    }

    /// Inclusive-bounds overlap test.
    ///
    /// `a` overlaps `b` iff `a.start <= b.end && a.end >= b.start`.
    /// This predicate must match the SQL filter used by the store layer
    /// exactly; every admission decision routes through one of the two.
    #[inline]
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

impl std::fmt::Display for RentalPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// =============================================================================
// Product Status
// =============================================================================

/// Catalog status of a product.
///
/// Invariant: a product with `quantity == 0` is never `Available`.
/// The ledger flips Available → Unavailable when quantity reaches zero;
/// the reverse flip is an explicit admin action, never automatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// In stock and listed for rental.
    Available,
    /// Entire stock currently out on rental.
    Rented,
    /// Not offered (zero stock or pulled by an admin).
    Unavailable,
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Available
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of a rental order.
///
/// ## Lifecycle
/// ```text
/// pending ──► confirmed ──► completed (inventory restored)
///    │             │
///    └──────┬──────┘
///           ▼
///       canceled (inventory restored)
/// ```
/// `Pending` and `Confirmed` are the *active* statuses: only they count
/// against availability. `Completed` and `Canceled` are terminal and
/// immutable with respect to inventory impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, awaiting confirmation.
    Pending,
    /// Confirmed by an administrator.
    Confirmed,
    /// Rental finished; units returned to the ledger.
    Completed,
    /// Called off; units returned to the ledger if they were held.
    Canceled,
}

impl OrderStatus {
    /// Active orders reserve units against availability.
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Terminal orders never change again.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }

    /// The order lifecycle state machine.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Canceled)
                | (OrderStatus::Confirmed, OrderStatus::Completed)
                | (OrderStatus::Confirmed, OrderStatus::Canceled)
        )
    }

    /// Lowercase wire/database name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Category
// =============================================================================

/// A rental category. Owns its products (cascade delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across categories.
    pub name: String,

    /// URL-safe identifier derived from the name.
    pub slug: String,

    /// Optional description for the storefront.
    pub description: Option<String>,

    /// Opaque reference into the external image store.
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for rental.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning category.
    pub category_id: String,

    /// Display name, unique within its category.
    pub name: String,

    /// URL-safe identifier derived from the name.
    pub slug: String,

    /// Optional description.
    pub description: Option<String>,

    /// Rental price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Total owned units (the inventory ledger). Availability for a date
    /// range is this minus the units reserved by overlapping active orders.
    pub quantity: i64,

    /// Catalog status.
    pub status: ProductStatus,

    /// Optional material description (e.g. "oak", "steel").
    pub material: Option<String>,

    /// Optional color.
    pub color: Option<String>,

    /// Opaque reference into the external image store.
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the rental price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Product Image
// =============================================================================

/// A gallery image attached to a product.
///
/// The URL is an opaque reference into an external file store and is
/// never interpreted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub id: String,
    pub product_id: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// A pending (user, product) selection prior to checkout.
///
/// Cart lines are checked against raw stock only; date-aware admission
/// happens at checkout, per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// Who an order belongs to.
///
/// `user_id` comes from the external identity provider and is opaque here.
/// Guest orders have no user id; name and phone are kept denormalized on
/// the order either way so it survives account deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub user_id: Option<String>,
    pub name: String,
    pub phone: String,
}

impl Customer {
    /// A customer with an account.
    pub fn registered(
        user_id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Customer {
            user_id: Some(user_id.into()),
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// A guest checkout customer.
    pub fn guest(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Customer {
            user_id: None,
            name: name.into(),
            phone: phone.into(),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A time-bounded rental order against finite inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Rented product.
    pub product_id: String,

    /// Owning user, or None for guest orders.
    pub user_id: Option<String>,

    /// Units rented.
    pub quantity: i64,

    /// First rented day (inclusive).
    pub start_date: NaiveDate,

    /// Last rented day (inclusive). Always after `start_date`.
    pub end_date: NaiveDate,

    /// Lifecycle status.
    pub status: OrderStatus,

    /// Price frozen at creation time (unit price × quantity).
    /// Never recomputed, even if the product price changes later.
    pub total_price_cents: i64,

    /// Contact name (denormalized; may duplicate account data).
    pub customer_name: String,

    /// Contact phone (denormalized).
    pub customer_phone: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The rental window of this order.
    #[inline]
    pub fn period(&self) -> RentalPeriod {
        RentalPeriod {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// The frozen total price as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    /// Whether this order currently reserves units.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_period_rejects_inverted_range() {
        assert!(RentalPeriod::new(d(2024, 1, 20), d(2024, 1, 10)).is_err());
        assert!(RentalPeriod::new(d(2024, 1, 10), d(2024, 1, 10)).is_err());
        assert!(RentalPeriod::new(d(2024, 1, 10), d(2024, 1, 11)).is_ok());
    }

    #[test]
    fn test_overlap_is_boundary_inclusive() {
        let order = RentalPeriod::new(d(2024, 1, 10), d(2024, 1, 20)).unwrap();

        // Query starting on the order's last day overlaps.
        let touching = RentalPeriod::new(d(2024, 1, 20), d(2024, 1, 25)).unwrap();
        assert!(order.overlaps(&touching));
        assert!(touching.overlaps(&order));

        // Query starting the day after does not.
        let disjoint = RentalPeriod::new(d(2024, 1, 21), d(2024, 1, 25)).unwrap();
        assert!(!order.overlaps(&disjoint));
        assert!(!disjoint.overlaps(&order));
    }

    #[test]
    fn test_order_status_machine() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Canceled));
        assert!(!Pending.can_transition_to(Completed));

        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Canceled));
        assert!(!Confirmed.can_transition_to(Pending));

        assert!(!Completed.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Pending));
    }

    #[test]
    fn test_active_statuses() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Confirmed.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Canceled.is_active());
    }
}
