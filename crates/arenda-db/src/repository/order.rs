//! # Order Repository
//!
//! Database operations for rental orders, including the reservation
//! aggregate that every admission decision routes through.
//!
//! ## The Reservation Aggregate
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  reserved(product, [start, end]) =                                │
//! │                                                                   │
//! │      SELECT SUM(quantity) FROM orders                             │
//! │      WHERE product_id = product                                   │
//! │        AND status IN ('pending', 'confirmed')   ← active only     │
//! │        AND start_date <= end                     ← inclusive      │
//! │        AND end_date >= start                     ← overlap        │
//! │                                                                   │
//! │  This filter must match RentalPeriod::overlaps and                │
//! │  OrderStatus::is_active in arenda-core exactly.                   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use arenda_core::{Order, OrderStatus, RentalPeriod};

// =============================================================================
// Filters
// =============================================================================

/// Optional filters for administrative order listing.
///
/// Every field is independent; `None` means "don't filter on this".
/// The period filter matches orders whose rental window overlaps it,
/// using the same inclusive-bounds predicate as the reservation math.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub period: Option<RentalPeriod>,
    pub user_id: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// Gets an order by ID on an explicit connection (for transactions).
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, user_id, quantity, start_date, end_date,
                   status, total_price_cents, customer_name, customer_phone,
                   created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(order)
    }

    /// Inserts an order on an explicit connection.
    ///
    /// Always called inside the admission transaction: an order never
    /// appears without having passed the availability check on the same
    /// snapshot.
    pub async fn insert_in(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, product_id = %order.product_id, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, product_id, user_id, quantity, start_date, end_date,
                status, total_price_cents, customer_name, customer_phone,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.product_id)
        .bind(&order.user_id)
        .bind(order.quantity)
        .bind(order.start_date)
        .bind(order.end_date)
        .bind(order.status)
        .bind(order.total_price_cents)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Sums the units reserved by active orders overlapping `period`.
    ///
    /// The single Reservation Calculator: admission for direct orders and
    /// for every checkout line goes through this aggregate, inside the
    /// caller's transaction.
    pub async fn reserved_quantity_in(
        conn: &mut SqliteConnection,
        product_id: &str,
        period: &RentalPeriod,
    ) -> DbResult<i64> {
        let reserved = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM orders
            WHERE product_id = ?1
              AND status IN ('pending', 'confirmed')
              AND start_date <= ?3
              AND end_date >= ?2
            "#,
        )
        .bind(product_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_one(conn)
        .await?;

        Ok(reserved)
    }

    /// Pool-bound variant of [`Self::reserved_quantity_in`] for read-only
    /// availability reporting (product pages).
    pub async fn reserved_quantity(
        &self,
        product_id: &str,
        period: &RentalPeriod,
    ) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::reserved_quantity_in(&mut conn, product_id, period).await
    }

    /// Guarded status transition: moves `id` from `from` to `to`.
    ///
    /// Returns `false` if the order was not in `from` (raced or invalid);
    /// the caller decides whether that is an error or a no-op.
    pub async fn transition_in(
        conn: &mut SqliteConnection,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<bool> {
        debug!(id = %id, from = %from, to = %to, "Order status transition");

        let now = chrono::Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(id)
        .bind(to)
        .bind(now)
        .bind(from)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists orders matching the filter, newest first.
    pub async fn list_by_filters(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let (start, end) = match filter.period {
            Some(p) => (Some(p.start), Some(p.end)),
            None => (None, None),
        };

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, user_id, quantity, start_date, end_date,
                   status, total_price_cents, customer_name, customer_phone,
                   created_at, updated_at
            FROM orders
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR user_id = ?2)
              AND (?3 IS NULL OR (start_date <= ?4 AND end_date >= ?3))
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.user_id.as_deref())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists all orders for a product (diagnostics / tests).
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, user_id, quantity, start_date, end_date,
                   status, total_price_cents, customer_name, customer_phone,
                   created_at, updated_at
            FROM orders
            WHERE product_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets an order by ID, erroring if absent.
    pub async fn require(&self, id: &str) -> DbResult<Order> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}
