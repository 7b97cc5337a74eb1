//! # Category Repository
//!
//! Database operations for rental categories.
//!
//! Slug assignment lives in the catalog service; this repository only
//! answers "which sibling slugs exist" and enforces the UNIQUE
//! constraints on insert/update.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use arenda_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, description, image_url, created_at, updated_at
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, description, image_url, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Gets a category by its slug.
    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, description, image_url, created_at, updated_at
            FROM categories
            WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name or slug already exists
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(slug = %category.slug, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, image_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing category.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, "Updating category");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?2,
                slug = ?3,
                description = ?4,
                image_url = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Deletes a category. Its products go with it (FK cascade).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Collects existing slugs that could collide with `base`, excluding
    /// the row identified by `exclude_id` (so renaming back to one's own
    /// slug is not a collision).
    ///
    /// Feeds the pure slug assignment in arenda-core.
    pub async fn sibling_slugs_in(
        conn: &mut SqliteConnection,
        base: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM categories
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

    /// Whether another category already uses `name`.
    pub async fn name_exists_in(
        conn: &mut SqliteConnection,
        name: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM categories
                WHERE name = ?1 AND (?2 IS NULL OR id != ?2)
            )
            "#,
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(conn)
        .await?;

        Ok(exists != 0)
    }

    /// Counts categories (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
