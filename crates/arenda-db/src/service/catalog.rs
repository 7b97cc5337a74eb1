//! # Catalog Service
//!
//! Categories and products: creation, edits, slug assignment, cascade
//! deletion, gallery images, and the admin side of the inventory ledger.
//!
//! ## Slug Rules
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  create          → always assign a slug                           │
//! │  edit, same name → keep the slug (no lookup at all)               │
//! │  edit, new name  → reassign, excluding the record's own row       │
//! │                                                                   │
//! │  Collision resolution is pure (arenda-core::slug); this service   │
//! │  feeds it the sibling slugs and retries ONCE with a randomized    │
//! │  suffix if a concurrent create wins the UNIQUE race on insert.    │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::category::CategoryRepository;
use crate::repository::product::ProductRepository;
use crate::service::error::{ServiceError, ServiceResult};
use arenda_core::{
    slug, validation, Category, CoreError, Product, ProductImage, ProductStatus, ValidationError,
};

// =============================================================================
// Requests
// =============================================================================

/// Fields for a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Replacement fields for an existing category.
#[derive(Debug, Clone)]
pub struct CategoryUpdate {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i64,
    pub material: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
}

/// Replacement fields for an existing product.
///
/// Deliberately has no `quantity`: the ledger is mutated only through
/// [`CatalogService::restock_product`] and order restoration.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub status: ProductStatus,
    pub material: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
}

/// A product with its gallery, as shown on a product page.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub images: Vec<ProductImage>,
}

// =============================================================================
// Service
// =============================================================================

/// Catalog operations for the excluded HTTP/admin layer.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    /// Creates a new CatalogService.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogService { pool }
    }

    fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Lists all categories.
    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.categories().list().await?)
    }

    /// Gets a category by slug.
    pub async fn get_category(&self, slug: &str) -> ServiceResult<Category> {
        self.categories()
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(slug.to_string()).into())
    }

    /// Creates a category with a freshly assigned slug.
    pub async fn create_category(&self, req: &NewCategory) -> ServiceResult<Category> {
        validation::validate_category_name(&req.name)?;
        let name = req.name.trim().to_string();

        let assigned = {
            let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

            if CategoryRepository::name_exists_in(&mut conn, &name, None).await? {
                return Err(ValidationError::Duplicate {
                    field: "category name".to_string(),
                    value: name,
                }
                .into());
            }

            Self::assign_category_slug(&mut conn, &name, None).await?
        };

        let now = Utc::now();
        let mut category = Category {
            id: Uuid::new_v4().to_string(),
            name,
            slug: assigned,
            description: req.description.clone(),
            image_url: req.image_url.clone(),
            created_at: now,
            updated_at: now,
        };

        match self.categories().insert(&category).await {
            Ok(()) => {}
            // Lost a concurrent-create race on the slug: one randomized retry.
            Err(DbError::UniqueViolation { field, .. }) if field.contains("slug") => {
                category.slug = slug::randomized_slug(&slug::slugify(&category.name));
                self.categories().insert(&category).await?;
            }
            Err(err) => return Err(err.into()),
        }

        info!(slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Replaces a category's fields.
    ///
    /// The slug is reassigned only when the name actually changed;
    /// editing the description leaves a stable slug untouched, and
    /// renaming back to the current name is a no-op for the slug.
    pub async fn update_category(&self, id: &str, update: &CategoryUpdate) -> ServiceResult<Category> {
        validation::validate_category_name(&update.name)?;

        let existing = self
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;

        let name = update.name.trim().to_string();

        let assigned = if name == existing.name {
            existing.slug.clone()
        } else {
            let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

            if CategoryRepository::name_exists_in(&mut conn, &name, Some(id)).await? {
                return Err(ValidationError::Duplicate {
                    field: "category name".to_string(),
                    value: name,
                }
                .into());
            }

            Self::assign_category_slug(&mut conn, &name, Some(id)).await?
        };

        let category = Category {
            id: existing.id.clone(),
            name,
            slug: assigned,
            description: update.description.clone(),
            image_url: update.image_url.clone(),
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        };

        self.categories().update(&category).await?;

        // Re-read so the caller sees the stored timestamps.
        self.categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()).into())
    }

    /// Deletes a category and, by cascade, its products.
    pub async fn delete_category(&self, id: &str) -> ServiceResult<()> {
        self.categories().delete(id).await?;
        info!(id = %id, "Category deleted (products cascaded)");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Lists products of a category by category slug.
    pub async fn list_products(&self, category_slug: &str) -> ServiceResult<Vec<Product>> {
        let category = self.get_category(category_slug).await?;
        Ok(self.products().list_by_category(&category.id).await?)
    }

    /// Gets a product with its gallery by product slug.
    pub async fn get_product(&self, slug: &str) -> ServiceResult<ProductDetail> {
        let product = self
            .products()
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(slug.to_string()))?;

        let images = self.products().images_for(&product.id).await?;

        Ok(ProductDetail { product, images })
    }

    /// Creates a product with a freshly assigned slug.
    ///
    /// A zero-quantity product is never listed `available`: the status
    /// rule is applied at save time, mirroring the ledger mutations.
    pub async fn create_product(&self, req: &NewProduct) -> ServiceResult<Product> {
        validation::validate_product_name(&req.name)?;
        validation::validate_price_cents(req.price_cents)?;
        validation::validate_stock(req.quantity)?;

        let name = req.name.trim().to_string();

        let category = self
            .categories()
            .get_by_id(&req.category_id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(req.category_id.clone()))?;

        let assigned = {
            let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

            if ProductRepository::name_exists_in_category_in(&mut conn, &category.id, &name, None)
                .await?
            {
                return Err(ValidationError::Duplicate {
                    field: "product name".to_string(),
                    value: name,
                }
                .into());
            }

            Self::assign_product_slug(&mut conn, &name, None).await?
        };

        let status = if req.quantity == 0 {
            ProductStatus::Unavailable
        } else {
            ProductStatus::Available
        };

        let now = Utc::now();
        let mut product = Product {
            id: Uuid::new_v4().to_string(),
            category_id: category.id,
            name,
            slug: assigned,
            description: req.description.clone(),
            price_cents: req.price_cents,
            quantity: req.quantity,
            status,
            material: req.material.clone(),
            color: req.color.clone(),
            image_url: req.image_url.clone(),
            created_at: now,
            updated_at: now,
        };

        match self.products().insert(&product).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation { field, .. }) if field.contains("slug") => {
                product.slug = slug::randomized_slug(&slug::slugify(&product.name));
                self.products().insert(&product).await?;
            }
            Err(err) => return Err(err.into()),
        }

        info!(slug = %product.slug, quantity = product.quantity, "Product created");
        Ok(product)
    }

    /// Replaces a product's catalog fields (not its ledger quantity).
    pub async fn update_product(&self, id: &str, update: &ProductUpdate) -> ServiceResult<Product> {
        validation::validate_product_name(&update.name)?;
        validation::validate_price_cents(update.price_cents)?;

        let existing = self
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let name = update.name.trim().to_string();

        let assigned = if name == existing.name {
            existing.slug.clone()
        } else {
            let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

            if ProductRepository::name_exists_in_category_in(
                &mut conn,
                &existing.category_id,
                &name,
                Some(id),
            )
            .await?
            {
                return Err(ValidationError::Duplicate {
                    field: "product name".to_string(),
                    value: name,
                }
                .into());
            }

            Self::assign_product_slug(&mut conn, &name, Some(id)).await?
        };

        // Zero stock cannot be listed available, whatever the form said.
        let status = if existing.quantity == 0 && update.status == ProductStatus::Available {
            ProductStatus::Unavailable
        } else {
            update.status
        };

        let product = Product {
            id: existing.id.clone(),
            category_id: existing.category_id.clone(),
            name,
            slug: assigned,
            description: update.description.clone(),
            price_cents: update.price_cents,
            quantity: existing.quantity,
            status,
            material: update.material.clone(),
            color: update.color.clone(),
            image_url: update.image_url.clone(),
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        };

        self.products().update(&product).await?;

        self.products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Deletes a product.
    pub async fn delete_product(&self, id: &str) -> ServiceResult<()> {
        self.products().delete(id).await?;
        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Attaches a gallery image (opaque URL) to a product.
    pub async fn add_product_image(
        &self,
        product_id: &str,
        image_url: &str,
    ) -> ServiceResult<ProductImage> {
        let product = self
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let image = ProductImage {
            id: Uuid::new_v4().to_string(),
            product_id: product.id,
            image_url: image_url.to_string(),
            created_at: Utc::now(),
        };

        self.products().add_image(&image).await?;
        Ok(image)
    }

    // -------------------------------------------------------------------------
    // Inventory Ledger (admin side)
    // -------------------------------------------------------------------------

    /// Adjusts a product's owned stock by `delta` (restock or write-off).
    ///
    /// Read, check, and write run in one transaction. A delta that would
    /// drive the ledger negative is an invariant violation: logged and
    /// rejected, never clamped.
    pub async fn restock_product(&self, id: &str, delta: i64) -> ServiceResult<Product> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product = ProductRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let computed = product.quantity + delta;
        if computed < 0 {
            error!(
                slug = %product.slug,
                quantity = product.quantity,
                delta,
                "Rejecting ledger write that would go negative"
            );
            return Err(CoreError::InventoryInvariant {
                product: product.slug,
                total: product.quantity,
                computed,
            }
            .into());
        }

        ProductRepository::adjust_quantity_in(&mut tx, id, delta).await?;

        let updated = ProductRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("product {id} vanished mid-restock")))?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            slug = %updated.slug,
            delta,
            quantity = updated.quantity,
            "Ledger adjusted"
        );

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Slug assignment plumbing
    // -------------------------------------------------------------------------

    async fn assign_category_slug(
        conn: &mut SqliteConnection,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<String, ServiceError> {
        let base = slug::slugify(name);
        let taken: HashSet<String> =
            CategoryRepository::sibling_slugs_in(conn, &base, exclude_id)
                .await?
                .into_iter()
                .collect();

        Ok(slug::assign_slug(name, |candidate| taken.contains(candidate))
            .map_err(CoreError::from)?)
    }

    async fn assign_product_slug(
        conn: &mut SqliteConnection,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<String, ServiceError> {
        let base = slug::slugify(name);
        let taken: HashSet<String> = ProductRepository::sibling_slugs_in(conn, &base, exclude_id)
            .await?
            .into_iter()
            .collect();

        Ok(slug::assign_slug(name, |candidate| taken.contains(candidate))
            .map_err(CoreError::from)?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::error::ErrorCode;
    use crate::testing::{seed_category, seed_product, test_db};

    #[tokio::test]
    async fn test_slug_collision_appends_counter() {
        let db = test_db().await;
        let catalog = db.catalog();

        let first = catalog
            .create_category(&NewCategory {
                name: "Chairs".to_string(),
                description: None,
                image_url: None,
            })
            .await
            .unwrap();
        assert_eq!(first.slug, "chairs");

        // Same display name is fine for products-in-different-categories
        // style collisions; for categories the name itself must differ,
        // so collide via a name that slugifies identically.
        let second = catalog
            .create_category(&NewCategory {
                name: "Chairs!".to_string(),
                description: None,
                image_url: None,
            })
            .await
            .unwrap();
        assert_eq!(second.slug, "chairs-1");
    }

    #[tokio::test]
    async fn test_rename_back_keeps_own_slug() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Chairs").await;

        let renamed = catalog
            .update_category(
                &cat.id,
                &CategoryUpdate {
                    name: "Seating".to_string(),
                    description: None,
                    image_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.slug, "seating");

        // Renaming back re-adopts "chairs": the record's own row is
        // excluded from the collision check.
        let back = catalog
            .update_category(
                &cat.id,
                &CategoryUpdate {
                    name: "Chairs".to_string(),
                    description: None,
                    image_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(back.slug, "chairs");
    }

    #[tokio::test]
    async fn test_unrelated_edit_keeps_slug() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Chairs").await;

        let edited = catalog
            .update_category(
                &cat.id,
                &CategoryUpdate {
                    name: "Chairs".to_string(),
                    description: Some("Event seating".to_string()),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.slug, "chairs");
        assert_eq!(edited.description.as_deref(), Some("Event seating"));
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_slug_assignment() {
        let db = test_db().await;
        let catalog = db.catalog();

        for bad in ["", "   "] {
            let err = catalog
                .create_category(&NewCategory {
                    name: bad.to_string(),
                    description: None,
                    image_url: None,
                })
                .await
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError);
        }
    }

    #[tokio::test]
    async fn test_duplicate_product_name_within_category() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Tables").await;
        seed_product(&db, &cat.id, "Round Table", 3, 10_000).await;

        let err = catalog
            .create_product(&NewProduct {
                category_id: cat.id.clone(),
                name: "Round Table".to_string(),
                description: None,
                price_cents: 12_000,
                quantity: 1,
                material: None,
                color: None,
                image_url: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        // The same name in another category is fine; the slug gets a
        // counter because product slugs are globally unique.
        let other = seed_category(&db, "Outdoor").await;
        let twin = seed_product(&db, &other.id, "Round Table", 2, 9_000).await;
        assert_eq!(twin.slug, "round-table-1");
    }

    #[tokio::test]
    async fn test_zero_quantity_product_is_unavailable() {
        let db = test_db().await;
        let cat = seed_category(&db, "Decor").await;

        let empty = seed_product(&db, &cat.id, "Backdrop", 0, 7_000).await;
        assert_eq!(empty.status, ProductStatus::Unavailable);

        let stocked = seed_product(&db, &cat.id, "Garland", 4, 1_500).await;
        assert_eq!(stocked.status, ProductStatus::Available);
    }

    #[tokio::test]
    async fn test_update_cannot_force_available_at_zero_stock() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Decor").await;
        let product = seed_product(&db, &cat.id, "Backdrop", 0, 7_000).await;

        let updated = catalog
            .update_product(
                &product.id,
                &ProductUpdate {
                    name: "Backdrop".to_string(),
                    description: None,
                    price_cents: 7_000,
                    status: ProductStatus::Available,
                    material: None,
                    color: None,
                    image_url: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ProductStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_restock_flips_status_only_downward() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Sound").await;
        let product = seed_product(&db, &cat.id, "Mixer", 2, 20_000).await;

        // Draining to zero flips available → unavailable.
        let drained = catalog.restock_product(&product.id, -2).await.unwrap();
        assert_eq!(drained.quantity, 0);
        assert_eq!(drained.status, ProductStatus::Unavailable);

        // Restocking does NOT flip back; that's an admin decision.
        let restocked = catalog.restock_product(&product.id, 5).await.unwrap();
        assert_eq!(restocked.quantity, 5);
        assert_eq!(restocked.status, ProductStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_restock_rejects_negative_ledger() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Sound").await;
        let product = seed_product(&db, &cat.id, "Amp", 2, 25_000).await;

        let err = catalog.restock_product(&product.id, -3).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);

        // Nothing was written.
        assert_eq!(db.products().total_quantity(&product.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_category_cascades_products() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Games").await;
        let product = seed_product(&db, &cat.id, "Ping Pong Table", 1, 45_000).await;

        catalog.delete_category(&cat.id).await.unwrap();

        let err = catalog.get_product(&product.slug).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_product_detail_includes_gallery() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Stage").await;
        let product = seed_product(&db, &cat.id, "Podium", 1, 40_000).await;

        catalog
            .add_product_image(&product.id, "https://img.example/podium-front.jpg")
            .await
            .unwrap();
        catalog
            .add_product_image(&product.id, "https://img.example/podium-side.jpg")
            .await
            .unwrap();

        let detail = catalog.get_product(&product.slug).await.unwrap();
        assert_eq!(detail.images.len(), 2);
        assert_eq!(
            detail.images[0].image_url,
            "https://img.example/podium-front.jpg"
        );
    }

    #[tokio::test]
    async fn test_listing_by_category_slug() {
        let db = test_db().await;
        let catalog = db.catalog();
        let cat = seed_category(&db, "Light").await;
        seed_product(&db, &cat.id, "Spotlight", 4, 15_000).await;
        seed_product(&db, &cat.id, "Disco Ball", 2, 8_000).await;

        let products = catalog.list_products("light").await.unwrap();
        assert_eq!(products.len(), 2);
        // Ordered by name.
        assert_eq!(products[0].name, "Disco Ball");

        assert_eq!(db.categories().count().await.unwrap(), 1);
        assert_eq!(db.products().count().await.unwrap(), 2);

        let err = catalog.list_products("no-such-category").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
