//! # arenda-db: Database Layer + Services for the Rental Catalog
//!
//! SQLite persistence and the transactional service layer over
//! [`arenda_core`]'s pure domain logic.
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      arenda Data Flow                             │
//! │                                                                   │
//! │  HTTP / Admin UI (out of scope)                                   │
//! │       │                                                           │
//! │       ▼                                                           │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │                  arenda-db (THIS CRATE)                     │  │
//! │  │                                                             │  │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐   │  │
//! │  │   │   Services   │──►│ Repositories  │   │  Migrations  │   │  │
//! │  │   │ catalog/cart │   │ category/     │   │  (embedded)  │   │  │
//! │  │   │ /order       │   │ product/cart/ │   │ 001_init.sql │   │  │
//! │  │   │ transactions │   │ order         │   │              │   │  │
//! │  │   └──────────────┘   └───────┬───────┘   └──────────────┘   │  │
//! │  │                             │                               │  │
//! │  └─────────────────────────────┼───────────────────────────────┘  │
//! │                                ▼                                  │
//! │                      SQLite Database (WAL)                        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table query sets
//! - [`service`] - Transactional operations (admission, checkout, restore)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arenda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/arenda.db")).await?;
//!
//! let categories = db.catalog().list_categories().await?;
//! let available = db.order().availability("folding-chair", &period).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::{CartLineDetail, CartRepository};
pub use repository::category::CategoryRepository;
pub use repository::order::{OrderFilter, OrderRepository};
pub use repository::product::ProductRepository;

// Service re-exports
pub use service::cart::{CartService, CartView};
pub use service::catalog::{
    CatalogService, CategoryUpdate, NewCategory, NewProduct, ProductDetail, ProductUpdate,
};
pub use service::error::{ErrorCode, ServiceError, ServiceResult};
pub use service::notify::{CheckoutNotice, CheckoutNotifier, LogNotifier, NoopNotifier};
pub use service::order::{NewOrder, OrderService};

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for service tests: an in-memory database and a
    //! seeded category/product pair.

    use chrono::NaiveDate;

    use crate::pool::{Database, DbConfig};
    use crate::service::catalog::{NewCategory, NewProduct};
    use arenda_core::{Category, Product, RentalPeriod};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    pub fn period(start: (i32, u32, u32), end: (i32, u32, u32)) -> RentalPeriod {
        let start = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        let end = NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap();
        RentalPeriod::new(start, end).unwrap()
    }

    pub async fn seed_category(db: &Database, name: &str) -> Category {
        db.catalog()
            .create_category(&NewCategory {
                name: name.to_string(),
                description: None,
                image_url: None,
            })
            .await
            .expect("seed category")
    }

    pub async fn seed_product(
        db: &Database,
        category_id: &str,
        name: &str,
        quantity: i64,
        price_cents: i64,
    ) -> Product {
        db.catalog()
            .create_product(&NewProduct {
                category_id: category_id.to_string(),
                name: name.to_string(),
                description: None,
                price_cents,
                quantity,
                material: None,
                color: None,
                image_url: None,
            })
            .await
            .expect("seed product")
    }
}
