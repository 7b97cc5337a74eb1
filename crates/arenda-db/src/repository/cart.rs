//! # Cart Repository
//!
//! Database operations for cart lines.
//!
//! One line per (user, product), enforced by a UNIQUE constraint.
//! Adding the same product again increments the existing line via an
//! upsert, so the mutation is a single-row atomic operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use arenda_core::{CartLine, Money};

// =============================================================================
// Joined view
// =============================================================================

/// A cart line joined with its product, for display and checkout.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLineDetail {
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    /// Current unit price; cart totals are informational and follow the
    /// live price (orders freeze it only at creation).
    pub price_cents: i64,
    /// Raw stock of the product (the lightweight cart check bound).
    pub stock_quantity: i64,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

impl CartLineDetail {
    /// Line total at the current price.
    pub fn line_total(&self) -> Money {
        // Cart quantities are capped well below any overflowing product.
        Money::from_cents(self.price_cents.saturating_mul(self.quantity))
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart line database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Gets the (user, product) cart line, if any.
    pub async fn get_line(&self, user_id: &str, product_id: &str) -> DbResult<Option<CartLine>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_line_in(&mut conn, user_id, product_id).await
    }

    /// Gets the (user, product) cart line on an explicit connection.
    pub async fn get_line_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        product_id: &str,
    ) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, user_id, product_id, quantity, added_at
            FROM cart_lines
            WHERE user_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;

        Ok(line)
    }

    /// Adds to a cart line, creating it if absent.
    ///
    /// Delta upsert: the increment happens in the database, so two
    /// concurrent adds both land instead of one overwriting the other.
    pub async fn upsert_add_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, product_id = %product_id, quantity = %quantity, "Cart upsert");

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO cart_lines (id, user_id, product_id, quantity, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_lines.quantity + excluded.quantity
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Replaces a line's quantity.
    pub async fn set_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, product_id = %product_id, quantity = %quantity, "Cart set quantity");

        let result = sqlx::query(
            r#"
            UPDATE cart_lines SET quantity = ?3
            WHERE user_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", product_id));
        }

        Ok(())
    }

    /// Deletes a line.
    pub async fn delete(&self, user_id: &str, product_id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, product_id = %product_id, "Cart delete line");

        let result = sqlx::query(
            r#"
            DELETE FROM cart_lines
            WHERE user_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", product_id));
        }

        Ok(())
    }

    /// Lists a user's cart lines joined with product data, oldest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<CartLineDetail>> {
        let mut conn = self.pool.acquire().await?;
        Self::list_for_user_in(&mut conn, user_id).await
    }

    /// Joined listing on an explicit connection (checkout reads it
    /// inside the admission transaction).
    pub async fn list_for_user_in(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<Vec<CartLineDetail>> {
        let lines = sqlx::query_as::<_, CartLineDetail>(
            r#"
            SELECT c.product_id,
                   p.name     AS product_name,
                   p.slug     AS product_slug,
                   p.price_cents,
                   p.quantity AS stock_quantity,
                   c.quantity,
                   c.added_at
            FROM cart_lines c
            INNER JOIN products p ON p.id = c.product_id
            WHERE c.user_id = ?1
            ORDER BY c.added_at
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        Ok(lines)
    }

    /// Deletes all of a user's cart lines. Checkout calls this inside
    /// its transaction so the cart clears iff the orders commit.
    pub async fn clear_for_user_in(conn: &mut SqliteConnection, user_id: &str) -> DbResult<u64> {
        debug!(user_id = %user_id, "Clearing cart");

        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = ?1")
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
