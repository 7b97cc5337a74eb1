//! # Reservation Math
//!
//! Pure availability accounting for rental inventory.
//!
//! ## The Model
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Product "folding-chair", quantity = 5                            │
//! │                                                                   │
//! │  Jun 01 ───────────────────────────────────────────── Jun 15      │
//! │                                                                   │
//! │  Order A (qty 3, active)   ████████████░░░░░░░░░░                 │
//! │                            06-01    06-10                         │
//! │                                                                   │
//! │  query [06-05, 06-08]  → reserved 3 → available 2                 │
//! │  query [06-11, 06-15]  → reserved 0 → available 5                 │
//! │                                                                   │
//! │  Two orders can share the same physical units only if their       │
//! │  date ranges do not overlap.                                      │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store layer computes `reserved` with an SQL aggregate over active
//! orders; these functions are the same arithmetic over in-memory orders,
//! and carry the admission decision used everywhere. Both must agree on
//! the overlap predicate ([`RentalPeriod::overlaps`]) and on the active
//! status set ([`OrderStatus::is_active`]).

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, RentalPeriod};

// =============================================================================
// Reserved / Available
// =============================================================================

/// Sums the units committed by active orders overlapping `period`.
///
/// Only `pending` and `confirmed` orders reserve units; terminal orders
/// have already returned theirs to the ledger.
pub fn reserved_quantity(orders: &[Order], period: &RentalPeriod) -> i64 {
    orders
        .iter()
        .filter(|o| o.is_active() && o.period().overlaps(period))
        .map(|o| o.quantity)
        .sum()
}

/// Residual availability: `total - reserved`.
///
/// A negative residual means reservations and stock have diverged. That
/// is an internal-consistency error, not a valid answer: it is reported
/// as [`CoreError::InventoryInvariant`], never returned negative and
/// never silently clamped to zero.
pub fn available_quantity(product: &str, total: i64, reserved: i64) -> CoreResult<i64> {
    let residual = total - reserved;
    if residual < 0 {
        return Err(CoreError::InventoryInvariant {
            product: product.to_string(),
            total,
            computed: residual,
        });
    }
    Ok(residual)
}

// =============================================================================
// Admission
// =============================================================================

/// The admission check: does `requested` fit within `available`?
///
/// Every order-creation path routes through this single decision so the
/// rule cannot drift between direct orders and cart checkout.
pub fn admit(slug: &str, requested: i64, available: i64) -> CoreResult<()> {
    if requested > available {
        return Err(CoreError::InsufficientAvailability {
            slug: slug.to_string(),
            requested,
            available,
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
    use crate::types::{OrderStatus, RentalPeriod};
    use chrono::{NaiveDate, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn order(qty: i64, start: NaiveDate, end: NaiveDate, status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: "o".to_string(),
            product_id: "p".to_string(),
            user_id: None,
            quantity: qty,
            start_date: start,
            end_date: end,
            status,
            total_price_cents: 0,
            customer_name: String::new(),
            customer_phone: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reserved_counts_only_active_overlapping() {
        let orders = vec![
            order(3, d(2024, 6, 1), d(2024, 6, 10), OrderStatus::Pending),
            order(2, d(2024, 6, 1), d(2024, 6, 10), OrderStatus::Confirmed),
            order(4, d(2024, 6, 1), d(2024, 6, 10), OrderStatus::Completed),
            order(1, d(2024, 6, 20), d(2024, 6, 25), OrderStatus::Pending),
        ];
        let q = RentalPeriod::new(d(2024, 6, 5), d(2024, 6, 8)).unwrap();

        // 3 (pending) + 2 (confirmed); completed and disjoint orders don't count.
        assert_eq!(reserved_quantity(&orders, &q), 5);
    }

    #[test]
    fn test_disjoint_ranges_are_independent() {
        let orders = vec![order(3, d(2024, 6, 1), d(2024, 6, 10), OrderStatus::Pending)];

        let r1 = RentalPeriod::new(d(2024, 6, 5), d(2024, 6, 8)).unwrap();
        let r2 = RentalPeriod::new(d(2024, 6, 11), d(2024, 6, 15)).unwrap();

        assert_eq!(reserved_quantity(&orders, &r1), 3);
        assert_eq!(reserved_quantity(&orders, &r2), 0);
    }

    #[test]
    fn test_reserved_plus_available_equals_total() {
        let orders = vec![order(3, d(2024, 6, 1), d(2024, 6, 10), OrderStatus::Pending)];
        let q = RentalPeriod::new(d(2024, 6, 5), d(2024, 6, 8)).unwrap();
        let total = 5;

        let reserved = reserved_quantity(&orders, &q);
        let available = available_quantity("folding-chair", total, reserved).unwrap();
        assert_eq!(reserved + available, total);
    }

    #[test]
    fn test_negative_residual_is_an_error() {
        let err = available_quantity("folding-chair", 2, 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InventoryInvariant {
                total: 2,
                computed: -3,
                ..
            }
        ));
    }

    #[test]
    fn test_admission() {
        assert!(admit("folding-chair", 2, 2).is_ok());
        assert!(admit("folding-chair", 0, 0).is_ok());

        let err = admit("folding-chair", 3, 2).unwrap_err();
        match err {
            CoreError::InsufficientAvailability {
                requested,
                available,
                ..
            } => {
                assert_eq!((requested, available), (3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
