//! # Product Repository
//!
//! Database operations for products, their gallery images, and the
//! inventory ledger.
//!
//! ## The Ledger
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  products.quantity = total owned units                            │
//! │                                                                   │
//! │  Mutated by exactly two operations:                               │
//! │    • restock / admin adjust      (catalog service)                │
//! │    • restore on complete/cancel  (order service)                  │
//! │                                                                   │
//! │  Orders do NOT decrement it: availability for a date range is     │
//! │  quantity minus the reservation aggregate (order repository).     │
//! │                                                                   │
//! │  Every mutation applies the status rule in the same statement:    │
//! │  if the result is 0 and status was 'available', flip it to        │
//! │  'unavailable'. The reverse flip is admin-only, never automatic.  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use arenda_core::{Product, ProductImage};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products of a category ordered by name.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, slug, description, price_cents,
                   quantity, status, material, color, image_url,
                   created_at, updated_at
            FROM products
            WHERE category_id = ?1
            ORDER BY name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// Gets a product by its ID on an explicit connection.
    ///
    /// Used inside service transactions so the admission read and the
    /// subsequent write see the same snapshot.
    pub async fn get_by_id_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, slug, description, price_cents,
                   quantity, status, material, color, image_url,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by its slug.
    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, slug, description, price_cents,
                   quantity, status, material, color, image_url,
                   created_at, updated_at
            FROM products
            WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - slug taken, or name duplicated
    ///   within the category
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(slug = %product.slug, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, slug, description, price_cents,
                quantity, status, material, color, image_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(product.status)
        .bind(&product.material)
        .bind(&product.color)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product (all columns except id/category).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                slug = ?3,
                description = ?4,
                price_cents = ?5,
                quantity = ?6,
                status = ?7,
                material = ?8,
                color = ?9,
                image_url = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(product.status)
        .bind(&product.material)
        .bind(&product.color)
        .bind(&product.image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product (gallery images and cart lines cascade).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inventory Ledger
    // -------------------------------------------------------------------------

    /// Returns the total owned units of a product.
    pub async fn total_quantity(&self, id: &str) -> DbResult<i64> {
        let quantity = sqlx::query_scalar::<_, i64>("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        quantity.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Applies a quantity delta to the ledger.
    ///
    /// One statement applies the delta AND the status rule (result 0 +
    /// status available → unavailable), so the recomputation is atomic
    /// with the quantity write. Restore uses a positive delta; admin
    /// adjustments may be negative.
    ///
    /// Callers validate the delta against the current quantity inside
    /// the same transaction; the `quantity + delta >= 0` guard here
    /// backstops that check and refuses to write a negative ledger.
    pub async fn adjust_quantity_in(
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting ledger quantity");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                quantity = quantity + ?2,
                status = CASE
                    WHEN quantity + ?2 = 0 AND status = 'available' THEN 'unavailable'
                    ELSE status
                END,
                updated_at = ?3
            WHERE id = ?1 AND quantity + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT EXISTS (SELECT 1 FROM products WHERE id = ?1)",
            )
            .bind(id)
            .fetch_one(conn)
            .await?;

            if exists != 0 {
                return Err(DbError::Internal(format!(
                    "ledger guard rejected delta {delta} for product {id}"
                )));
            }
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Slug / uniqueness lookups
    // -------------------------------------------------------------------------

    /// Collects existing slugs that could collide with `base`, excluding
    /// the row identified by `exclude_id`.
    pub async fn sibling_slugs_in(
        conn: &mut SqliteConnection,
        base: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM products
            WHERE (slug = ?1 OR slug LIKE ?1 || '-%')
              AND (?2 IS NULL OR id != ?2)
            "#,
        )
        .bind(base)
        .bind(exclude_id)
        .fetch_all(conn)
        .await?;

        Ok(slugs)
    }

    /// Whether another product in the same category already uses `name`.
    pub async fn name_exists_in_category_in(
        conn: &mut SqliteConnection,
        category_id: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM products
                WHERE category_id = ?1 AND name = ?2
                  AND (?3 IS NULL OR id != ?3)
            )
            "#,
        )
        .bind(category_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(conn)
        .await?;

        Ok(exists != 0)
    }

    // -------------------------------------------------------------------------
    // Gallery images
    // -------------------------------------------------------------------------

    /// Attaches a gallery image to a product.
    pub async fn add_image(&self, image: &ProductImage) -> DbResult<()> {
        debug!(product_id = %image.product_id, "Adding product image");

        sqlx::query(
            r#"
            INSERT INTO product_images (id, product_id, image_url, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&image.id)
        .bind(&image.product_id)
        .bind(&image.image_url)
        .bind(image.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists a product's gallery images, oldest first.
    pub async fn images_for(&self, product_id: &str) -> DbResult<Vec<ProductImage>> {
        let images = sqlx::query_as::<_, ProductImage>(
            r#"
            SELECT id, product_id, image_url, created_at
            FROM product_images
            WHERE product_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
