//! # Cart Service
//!
//! Pre-checkout accumulation and the checkout itself.
//!
//! ## Two Different Checks
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Cart add/update:  quantity <= product.quantity  (raw stock)      │
//! │                                                                   │
//! │    A lightweight pre-check only. It knows nothing about dates,    │
//! │    so a cart can hold a quantity that later fails at checkout.    │
//! │                                                                   │
//! │  Checkout:         per-line admission against the reservation     │
//! │                    aggregate for the shared rental window         │
//! │                                                                   │
//! │    Authoritative. All lines run in ONE transaction through the    │
//! │    same admission path as direct order creation: either every     │
//! │    line becomes a pending order and the cart clears, or nothing   │
//! │    happens at all.                                                │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::repository::cart::{CartLineDetail, CartRepository};
use crate::repository::product::ProductRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::notify::{send_best_effort, CheckoutNotice, CheckoutNotifier, ORDERS_INBOX};
use crate::service::order::OrderService;
use arenda_core::{
    validation, CartLine, CoreError, Customer, Money, Order, RentalPeriod, ValidationError,
};

// =============================================================================
// Views
// =============================================================================

/// A user's cart as rendered by the UI layer.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineDetail>,
    pub total: Money,
}

// =============================================================================
// Service
// =============================================================================

/// Cart operations for the excluded HTTP/UI layer.
#[derive(Clone)]
pub struct CartService {
    pool: SqlitePool,
    notifier: Arc<dyn CheckoutNotifier>,
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService").finish()
    }
}

impl CartService {
    /// Creates a new CartService.
    pub fn new(pool: SqlitePool, notifier: Arc<dyn CheckoutNotifier>) -> Self {
        CartService { pool, notifier }
    }

    fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Accumulation
    // -------------------------------------------------------------------------

    /// Adds units of a product to the user's cart, incrementing an
    /// existing line. The resulting line must fit within raw stock.
    pub async fn add_to_cart(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> ServiceResult<CartLine> {
        validation::validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product = ProductRepository::get_by_id_in(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let existing = CartRepository::get_line_in(&mut tx, user_id, product_id)
            .await?
            .map(|line| line.quantity)
            .unwrap_or(0);

        if existing + quantity > product.quantity {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: product.quantity,
            }
            .into());
        }

        CartRepository::upsert_add_in(&mut tx, user_id, product_id, quantity).await?;

        let line = CartRepository::get_line_in(&mut tx, user_id, product_id)
            .await?
            .ok_or_else(|| DbError::Internal("cart line vanished after upsert".to_string()))?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(line)
    }

    /// Replaces a line's quantity. Zero or less deletes the line.
    pub async fn update_cart(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> ServiceResult<Option<CartLine>> {
        if quantity <= 0 {
            self.remove_from_cart(user_id, product_id).await?;
            return Ok(None);
        }

        validation::validate_quantity(quantity)?;

        let product = self
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if quantity > product.quantity {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: product.quantity,
            }
            .into());
        }

        self.carts()
            .set_quantity(user_id, product_id, quantity)
            .await
            .map_err(|err| Self::map_missing_line(err, user_id, product_id))?;

        Ok(self.carts().get_line(user_id, product_id).await?)
    }

    /// Removes a line from the cart.
    pub async fn remove_from_cart(&self, user_id: &str, product_id: &str) -> ServiceResult<()> {
        self.carts()
            .delete(user_id, product_id)
            .await
            .map_err(|err| Self::map_missing_line(err, user_id, product_id))?;
        Ok(())
    }

    /// The user's cart with line details and a grand total at current
    /// prices.
    pub async fn view_cart(&self, user_id: &str) -> ServiceResult<CartView> {
        let lines = self.carts().list_for_user(user_id).await?;
        let total = lines.iter().map(CartLineDetail::line_total).sum();
        Ok(CartView { lines, total })
    }

    fn map_missing_line(err: DbError, user_id: &str, product_id: &str) -> ServiceError {
        match err {
            DbError::NotFound { .. } => CoreError::CartLineNotFound {
                user_id: user_id.to_string(),
                product: product_id.to_string(),
            }
            .into(),
            other => other.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Turns every cart line into a pending order for the shared rental
    /// window, then clears the cart, all inside one transaction.
    ///
    /// All-or-nothing: if any line fails its admission check the whole
    /// checkout rolls back, the cart stays intact, and the error names
    /// the offending product. The transaction is retried once on a
    /// concurrency conflict.
    ///
    /// Notification is sent after commit, best-effort: a mail failure
    /// never affects the committed orders.
    pub async fn checkout(
        &self,
        user_id: &str,
        period: &RentalPeriod,
        customer_name: &str,
        customer_phone: &str,
    ) -> ServiceResult<Vec<Order>> {
        validation::validate_phone(customer_phone)?;

        let customer = Customer::registered(user_id, customer_name.trim(), customer_phone.trim());

        let (orders, lines) = match self.try_checkout(user_id, &customer, period).await {
            Err(err) if err.is_conflict() => {
                info!(user_id = %user_id, "Checkout conflicted, retrying once");
                self.try_checkout(user_id, &customer, period).await
            }
            other => other,
        }?;

        send_best_effort(
            self.notifier.as_ref(),
            &Self::checkout_notice(&customer, period, &lines, &orders),
        );

        Ok(orders)
    }

    async fn try_checkout(
        &self,
        user_id: &str,
        customer: &Customer,
        period: &RentalPeriod,
    ) -> ServiceResult<(Vec<Order>, Vec<CartLineDetail>)> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let lines = CartRepository::list_for_user_in(&mut tx, user_id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyCart {
                user_id: user_id.to_string(),
            }
            .into());
        }

        let mut orders = Vec::with_capacity(lines.len());
        for line in &lines {
            let order = OrderService::admit_and_insert_in(
                &mut tx,
                &line.product_id,
                customer,
                line.quantity,
                period,
            )
            .await?;
            orders.push(order);
        }

        CartRepository::clear_for_user_in(&mut tx, user_id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            user_id = %user_id,
            orders = orders.len(),
            period = %period,
            "Checkout committed"
        );

        Ok((orders, lines))
    }

    fn checkout_notice(
        customer: &Customer,
        period: &RentalPeriod,
        lines: &[CartLineDetail],
        orders: &[Order],
    ) -> CheckoutNotice {
        let total: Money = orders.iter().map(Order::total_price).sum();

        let mut body = format!(
            "Name: {}\nPhone: {}\nRental window: {}\n\n",
            customer.name, customer.phone, period
        );
        for (line, order) in lines.iter().zip(orders) {
            body.push_str(&format!(
                "{} x{} = {}\n",
                line.product_name,
                order.quantity,
                order.total_price()
            ));
        }
        body.push_str(&format!("\nTotal: {total}\n"));

        CheckoutNotice {
            subject: format!("New rental order ({} items)", orders.len()),
            body,
            recipient: ORDERS_INBOX.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
