//! # Catalog Repository
//!
//! CRUD over the product catalog.
//!
//! ## Referential Integrity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Deleting a Catalog Product                                 │
//! │                                                                         │
//! │  DELETE /api/catalog/MILK-1L                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Count stock instances referencing MILK-1L (inside transaction)        │
//! │       │                                                                 │
//! │       ├── > 0 ──► ProductInUse (nothing deleted)                       │
//! │       │                                                                 │
//! │       └── 0 ───► DELETE row (NotFound if id never existed)             │
//! │                                                                         │
//! │  Deletion is blocked, never cascaded: batches on the floor must not    │
//! │  lose their catalog entry.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lacto_core::validation::{normalize_code, validate_code, validate_name};
use lacto_core::{CatalogProduct, CoreError};

const SELECT_COLUMNS: &str =
    "SELECT id, name, created_at, updated_at FROM catalog_products";

/// Repository for catalog product database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Creates a catalog product.
    ///
    /// The id is a business code assigned by the admin; it is trimmed and
    /// uppercased before storage.
    ///
    /// ## Returns
    /// * `Ok(CatalogProduct)` - Created product
    /// * `Err(DbError::UniqueViolation)` - Id already exists (existing record
    ///   is left untouched)
    pub async fn insert(&self, id: &str, name: &str) -> DbResult<CatalogProduct> {
        validate_code("product id", id).map_err(CoreError::from)?;
        validate_name("name", name).map_err(CoreError::from)?;

        let now = Utc::now();
        let product = CatalogProduct {
            id: normalize_code(id),
            name: name.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, "Inserting catalog product");

        sqlx::query(
            r#"
            INSERT INTO catalog_products (id, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a catalog product by its id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CatalogProduct>> {
        let product =
            sqlx::query_as::<_, CatalogProduct>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(product)
    }

    /// Lists the whole catalog in insertion order.
    pub async fn list(&self) -> DbResult<Vec<CatalogProduct>> {
        let products =
            sqlx::query_as::<_, CatalogProduct>(&format!("{SELECT_COLUMNS} ORDER BY rowid"))
                .fetch_all(&self.pool)
                .await?;

        Ok(products)
    }

    /// Renames a catalog product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update_name(&self, id: &str, new_name: &str) -> DbResult<()> {
        validate_name("name", new_name).map_err(CoreError::from)?;

        debug!(id = %id, "Renaming catalog product");

        let result = sqlx::query(
            r#"
            UPDATE catalog_products SET name = ?2, updated_at = ?3 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(new_name.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Catalog product", id));
        }

        Ok(())
    }

    /// Deletes a catalog product.
    ///
    /// Blocked while any stock instance still references the product; the
    /// reference count and the delete run in one transaction so a batch
    /// added concurrently cannot slip between them.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(ProductInUse))` - Still referenced by stock
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting catalog product");

        let mut tx = self.pool.begin().await?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_instances WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if references > 0 {
            return Err(CoreError::ProductInUse {
                product_id: id.to_string(),
                instances: references,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM catalog_products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Catalog product", id));
        }

        tx.commit().await?;

        Ok(())
    }

    /// Counts catalog products (used by the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
