//! # Order Service
//!
//! The order lifecycle: admission, status transitions, and inventory
//! restoration.
//!
//! ## Admission
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  create_order (qty, [start, end])                                 │
//! │                                                                   │
//! │  BEGIN ─► load product ─► SUM active overlapping orders           │
//! │        │                                                          │
//! │        ├── requested > quantity - reserved                        │
//! │        │        └─► ROLLBACK, InsufficientAvailability            │
//! │        │                                                          │
//! │        └── fits ─► INSERT order (pending, frozen total)           │
//! │                 └─► COMMIT                                        │
//! │                                                                   │
//! │  The read-check-insert sequence runs in ONE transaction per       │
//! │  order. Two concurrent admissions for overlapping windows         │
//! │  serialize on the SQLite write lock; the loser surfaces as a      │
//! │  Conflict and the whole sequence is retried once.                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! `pending → confirmed → completed` with `canceled` reachable from both
//! active statuses. Completion and cancellation share the restore logic
//! (ledger `+= quantity`, same transaction as the status write) but keep
//! distinct terminal statuses. Terminal orders are immutable: repeating
//! a finish operation is a no-op, so inventory is restored exactly once.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::order::{OrderFilter, OrderRepository};
use crate::repository::product::ProductRepository;
use crate::service::error::ServiceResult;
use arenda_core::{
    reservation, validation, CoreError, Customer, Order, OrderStatus, RentalPeriod,
};

// =============================================================================
// Requests
// =============================================================================

/// A request to create a rental order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: String,
    pub customer: Customer,
    pub quantity: i64,
    pub period: RentalPeriod,
}

// =============================================================================
// Service
// =============================================================================

/// Transactional order operations.
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
}

impl OrderService {
    /// Creates a new OrderService.
    pub fn new(pool: SqlitePool) -> Self {
        OrderService { pool }
    }

    fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Creates a pending order if the requested quantity fits the
    /// availability of the rental window.
    ///
    /// Retries the whole admission transaction once if it loses a
    /// concurrency race, then surfaces the conflict.
    pub async fn create_order(&self, req: &NewOrder) -> ServiceResult<Order> {
        validation::validate_quantity(req.quantity)?;
        validation::validate_phone(&req.customer.phone)?;

        match self.try_create(req).await {
            Err(err) if err.is_conflict() => {
                info!(product_id = %req.product_id, "Admission conflicted, retrying once");
                self.try_create(req).await
            }
            other => other,
        }
    }

    async fn try_create(&self, req: &NewOrder) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let order = Self::admit_and_insert_in(
            &mut tx,
            &req.product_id,
            &req.customer,
            req.quantity,
            &req.period,
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %order.id,
            product_id = %order.product_id,
            quantity = order.quantity,
            period = %req.period,
            total = %order.total_price(),
            "Order created"
        );

        Ok(order)
    }

    /// The single admission path: load the product, sum overlapping
    /// active reservations, admit, insert pending order, all on the
    /// caller's connection (one transaction).
    ///
    /// Both `create_order` and cart checkout route through here, so the
    /// availability rule cannot drift between them.
    pub(crate) async fn admit_and_insert_in(
        conn: &mut SqliteConnection,
        product_id: &str,
        customer: &Customer,
        quantity: i64,
        period: &RentalPeriod,
    ) -> ServiceResult<Order> {
        let product = ProductRepository::get_by_id_in(conn, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let reserved = OrderRepository::reserved_quantity_in(conn, &product.id, period).await?;

        let available = reservation::available_quantity(&product.slug, product.quantity, reserved)
            .map_err(|err| {
                error!(
                    slug = %product.slug,
                    total = product.quantity,
                    reserved,
                    "Reservations exceed owned stock"
                );
                err
            })?;

        reservation::admit(&product.slug, quantity, available)?;

        // Price frozen now; later product price changes don't touch it.
        let total = product.price().total_for(quantity)?;
        let now = chrono::Utc::now();

        let order = Order {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            user_id: customer.user_id.clone(),
            quantity,
            start_date: period.start,
            end_date: period.end,
            status: OrderStatus::Pending,
            total_price_cents: total.cents(),
            customer_name: customer.name.clone(),
            customer_phone: customer.phone.clone(),
            created_at: now,
            updated_at: now,
        };

        OrderRepository::insert_in(conn, &order).await?;

        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    /// Units of a product free for the given window.
    ///
    /// Never negative: a negative residual is an internal-consistency
    /// error and surfaces as such.
    pub async fn availability(&self, product_slug: &str, period: &RentalPeriod) -> ServiceResult<i64> {
        let product = self
            .products()
            .get_by_slug(product_slug)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_slug.to_string()))?;

        let reserved = self.orders().reserved_quantity(&product.id, period).await?;

        let available = reservation::available_quantity(&product.slug, product.quantity, reserved)
            .map_err(|err| {
                error!(
                    slug = %product.slug,
                    total = product.quantity,
                    reserved,
                    "Reservations exceed owned stock"
                );
                err
            })?;

        Ok(available)
    }

    /// Gets an order by ID.
    pub async fn get_order(&self, id: &str) -> ServiceResult<Order> {
        Ok(self.orders().require(id).await?)
    }

    /// Lists orders for administrative review.
    pub async fn list_orders(&self, filter: &OrderFilter) -> ServiceResult<Vec<Order>> {
        Ok(self.orders().list_by_filters(filter).await?)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Confirms a pending order.
    pub async fn confirm_order(&self, id: &str) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let order = OrderRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;

        if order.status != OrderStatus::Pending {
            return Err(CoreError::InvalidStatusTransition {
                order_id: id.to_string(),
                from: order.status.to_string(),
                to: OrderStatus::Confirmed.to_string(),
            }
            .into());
        }

        let moved =
            OrderRepository::transition_in(&mut tx, id, OrderStatus::Pending, OrderStatus::Confirmed)
                .await?;
        if !moved {
            return Err(DbError::Conflict(format!("order {id} changed during confirm")).into());
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(order_id = %id, "Order confirmed");

        Ok(Order {
            status: OrderStatus::Confirmed,
            ..order
        })
    }

    /// Completes a confirmed order, restoring its units to the ledger.
    ///
    /// Idempotent on terminal orders: completing an already completed
    /// (or canceled) order changes nothing and returns it as stored.
    pub async fn complete_order(&self, id: &str) -> ServiceResult<Order> {
        self.finish_order(id, OrderStatus::Completed).await
    }

    /// Cancels a pending or confirmed order, restoring its units.
    ///
    /// Idempotent on terminal orders, like [`Self::complete_order`].
    pub async fn cancel_order(&self, id: &str) -> ServiceResult<Order> {
        self.finish_order(id, OrderStatus::Canceled).await
    }

    async fn finish_order(&self, id: &str, terminal: OrderStatus) -> ServiceResult<Order> {
        match self.try_finish(id, terminal).await {
            Err(err) if err.is_conflict() => {
                info!(order_id = %id, "Restore conflicted, retrying once");
                self.try_finish(id, terminal).await
            }
            other => other,
        }
    }

    /// Restore + status write in one transaction.
    async fn try_finish(&self, id: &str, terminal: OrderStatus) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let order = OrderRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;

        // Terminal orders are immutable with respect to inventory:
        // restoring twice must be a no-op.
        if order.status.is_terminal() {
            return Ok(order);
        }

        if !order.status.can_transition_to(terminal) {
            return Err(CoreError::InvalidStatusTransition {
                order_id: id.to_string(),
                from: order.status.to_string(),
                to: terminal.to_string(),
            }
            .into());
        }

        // Units go back to the ledger. The same statement applies the
        // zero-quantity status rule, though a positive delta can only
        // move away from zero, so a product never flips back to
        // 'available' here.
        ProductRepository::adjust_quantity_in(&mut tx, &order.product_id, order.quantity).await?;

        let moved = OrderRepository::transition_in(&mut tx, id, order.status, terminal).await?;
        if !moved {
            return Err(DbError::Conflict(format!("order {id} changed during restore")).into());
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %id,
            product_id = %order.product_id,
            restored = order.quantity,
            status = %terminal,
            "Order finished, inventory restored"
        );

        Ok(Order {
            status: terminal,
            ..order
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::error::{ErrorCode, ServiceError};
    use crate::testing::{period, seed_category, seed_product, test_db};
    use arenda_core::ProductStatus;

    fn guest() -> Customer {
        Customer::guest("Aigerim", "+7 701 123 45 67")
    }

    #[tokio::test]
    async fn test_admission_scenario() {
        let db = test_db().await;
        let cat = seed_category(&db, "Chairs").await;
        let product = seed_product(&db, &cat.id, "Folding Chair", 5, 2_500).await;
        let svc = db.order();

        // Order A: 3 units for [06-01, 06-10] fits (5 free).
        let a = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 3,
                period: period((2024, 6, 1), (2024, 6, 10)),
            })
            .await
            .unwrap();
        assert_eq!(a.status, OrderStatus::Pending);
        assert_eq!(a.total_price_cents, 7_500);

        // Same range now has 2 free.
        let available = svc
            .availability(&product.slug, &period((2024, 6, 1), (2024, 6, 10)))
            .await
            .unwrap();
        assert_eq!(available, 2);

        // Order B: 3 units overlapping A fails with requested/available.
        let err = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 3,
                period: period((2024, 6, 5), (2024, 6, 8)),
            })
            .await
            .unwrap_err();
        match err {
            ServiceError::Core(CoreError::InsufficientAvailability {
                requested,
                available,
                ..
            }) => assert_eq!((requested, available), (3, 2)),
            other => panic!("unexpected error: {other}"),
        }

        // Order C: 3 units on a disjoint range succeeds.
        svc.create_order(&NewOrder {
            product_id: product.id.clone(),
            customer: guest(),
            quantity: 3,
            period: period((2024, 6, 11), (2024, 6, 15)),
        })
        .await
        .unwrap();

        // A and C landed; B left nothing behind.
        let for_product = db.orders().list_for_product(&product.id).await.unwrap();
        assert_eq!(for_product.len(), 2);
    }

    #[tokio::test]
    async fn test_overlap_boundaries_via_availability() {
        let db = test_db().await;
        let cat = seed_category(&db, "Tables").await;
        let product = seed_product(&db, &cat.id, "Round Table", 5, 10_000).await;
        let svc = db.order();

        svc.create_order(&NewOrder {
            product_id: product.id.clone(),
            customer: guest(),
            quantity: 3,
            period: period((2024, 1, 10), (2024, 1, 20)),
        })
        .await
        .unwrap();

        // Window starting on the order's last day shares it (inclusive).
        let touching = svc
            .availability(&product.slug, &period((2024, 1, 20), (2024, 1, 25)))
            .await
            .unwrap();
        assert_eq!(touching, 2);

        // Window starting the day after does not.
        let disjoint = svc
            .availability(&product.slug, &period((2024, 1, 21), (2024, 1, 25)))
            .await
            .unwrap();
        assert_eq!(disjoint, 5);
    }

    #[tokio::test]
    async fn test_quantity_must_be_positive() {
        let db = test_db().await;
        let cat = seed_category(&db, "Tents").await;
        let product = seed_product(&db, &cat.id, "Party Tent", 2, 80_000).await;

        let err = db
            .order()
            .create_order(&NewOrder {
                product_id: product.id,
                customer: guest(),
                quantity: 0,
                period: period((2024, 6, 1), (2024, 6, 3)),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_price_frozen_at_creation() {
        let db = test_db().await;
        let cat = seed_category(&db, "Decor").await;
        let product = seed_product(&db, &cat.id, "Arch", 3, 12_000).await;
        let svc = db.order();

        let order = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 2,
                period: period((2024, 7, 1), (2024, 7, 3)),
            })
            .await
            .unwrap();
        assert_eq!(order.total_price_cents, 24_000);

        // Price hike after the fact leaves the order untouched.
        let mut updated = product.clone();
        updated.price_cents = 99_000;
        db.products().update(&updated).await.unwrap();

        let reloaded = svc.get_order(&order.id).await.unwrap();
        assert_eq!(reloaded.total_price_cents, 24_000);
    }

    #[tokio::test]
    async fn test_complete_restores_inventory_once() {
        let db = test_db().await;
        let cat = seed_category(&db, "Sound").await;
        let product = seed_product(&db, &cat.id, "Speaker", 5, 30_000).await;
        let svc = db.order();

        let order = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 3,
                period: period((2024, 6, 1), (2024, 6, 10)),
            })
            .await
            .unwrap();

        svc.confirm_order(&order.id).await.unwrap();
        let done = svc.complete_order(&order.id).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);

        // Ledger grew by the order quantity.
        assert_eq!(db.products().total_quantity(&product.id).await.unwrap(), 8);

        // Completed orders stop reserving.
        let available = svc
            .availability(&product.slug, &period((2024, 6, 1), (2024, 6, 10)))
            .await
            .unwrap();
        assert_eq!(available, 8);

        // Second completion is a no-op: quantity unchanged.
        let again = svc.complete_order(&order.id).await.unwrap();
        assert_eq!(again.status, OrderStatus::Completed);
        assert_eq!(db.products().total_quantity(&product.id).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_cancel_pending_restores() {
        let db = test_db().await;
        let cat = seed_category(&db, "Light").await;
        let product = seed_product(&db, &cat.id, "Spotlight", 4, 15_000).await;
        let svc = db.order();

        let order = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 2,
                period: period((2024, 6, 1), (2024, 6, 5)),
            })
            .await
            .unwrap();

        let canceled = svc.cancel_order(&order.id).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(db.products().total_quantity(&product.id).await.unwrap(), 6);

        // Canceling again changes nothing.
        svc.cancel_order(&order.id).await.unwrap();
        assert_eq!(db.products().total_quantity(&product.id).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_complete_requires_confirmation() {
        let db = test_db().await;
        let cat = seed_category(&db, "Games").await;
        let product = seed_product(&db, &cat.id, "Foosball Table", 2, 50_000).await;
        let svc = db.order();

        let order = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 1,
                period: period((2024, 6, 1), (2024, 6, 5)),
            })
            .await
            .unwrap();

        let err = svc.complete_order(&order.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BusinessLogic);

        // And confirming twice is a transition error, not a silent pass.
        svc.confirm_order(&order.id).await.unwrap();
        let err = svc.confirm_order(&order.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_restore_does_not_resurrect_available_status() {
        let db = test_db().await;
        let cat = seed_category(&db, "Stage").await;
        let product = seed_product(&db, &cat.id, "Podium", 3, 40_000).await;
        let order_svc = db.order();
        let catalog = db.catalog();

        let order = order_svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 2,
                period: period((2024, 6, 1), (2024, 6, 5)),
            })
            .await
            .unwrap();

        // Admin drains the ledger to zero: status auto-flips.
        let drained = catalog.restock_product(&product.id, -3).await.unwrap();
        assert_eq!(drained.quantity, 0);
        assert_eq!(drained.status, ProductStatus::Unavailable);

        // Cancellation restores units but the status stays unavailable;
        // flipping back to available is an admin decision.
        order_svc.cancel_order(&order.id).await.unwrap();
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 2);
        assert_eq!(after.status, ProductStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_list_orders_filters() {
        let db = test_db().await;
        let cat = seed_category(&db, "Misc").await;
        let product = seed_product(&db, &cat.id, "Rug", 10, 5_000).await;
        let svc = db.order();

        let registered = Customer::registered("user-1", "Dana", "+7 702 000 00 00");
        let o1 = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: registered.clone(),
                quantity: 1,
                period: period((2024, 6, 1), (2024, 6, 5)),
            })
            .await
            .unwrap();
        let o2 = svc
            .create_order(&NewOrder {
                product_id: product.id.clone(),
                customer: guest(),
                quantity: 2,
                period: period((2024, 7, 1), (2024, 7, 5)),
            })
            .await
            .unwrap();
        svc.confirm_order(&o2.id).await.unwrap();

        // By status.
        let pending = svc
            .list_orders(&OrderFilter {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, o1.id);

        // By user.
        let for_user = svc
            .list_orders(&OrderFilter {
                user_id: Some("user-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_user.len(), 1);
        assert_eq!(for_user[0].id, o1.id);

        // By overlapping window.
        let in_july = svc
            .list_orders(&OrderFilter {
                period: Some(period((2024, 7, 4), (2024, 7, 10))),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_july.len(), 1);
        assert_eq!(in_july[0].id, o2.id);

        // No filters: everything.
        let all = svc.list_orders(&OrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
