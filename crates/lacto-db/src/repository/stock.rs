//! # Stock Instance Repository
//!
//! Database operations for stock batches inside areas.
//!
//! ## Key Operations
//! - Lot-merge on add
//! - Transactional sell (decrement + ledger append)
//! - Area-ownership checks on every instance-scoped operation
//!
//! ## The Sell Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    sell(COLD-01, batch, qty=3)                          │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                   │
//! │    ├── SELECT batch ───────── missing ────────► NotFound    (rollback) │
//! │    ├── batch.area != COLD-01 ─────────────────► WrongArea   (rollback) │
//! │    ├── qty > batch.quantity ──────────────────► Insufficient(rollback) │
//! │    │                                                                   │
//! │    ├── UPDATE stock_instances SET quantity = quantity - 3              │
//! │    └── INSERT INTO sale_records (snapshot of the batch)                │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  One transaction: a crash between the two writes can never leave       │
//! │  stock decremented without its ledger entry, or vice versa.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Zero-Stock Rows
//! A sale that drains a batch leaves the row in place with quantity 0. The
//! row stays visible in area listings until someone deletes it explicitly,
//! so the floor can see which lots ran out.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::sale;
use lacto_core::validation::{
    normalize_code, validate_code, validate_destination, validate_new_quantity, validate_quantity,
};
use lacto_core::{CoreError, SaleRecord, StockInstance};

const SELECT_COLUMNS: &str = "SELECT id, area_id, product_id, name, quantity, expiry_date, lot, \
                              created_at, updated_at FROM stock_instances";

/// Repository for stock instance database operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets a stock instance by its id.
    pub async fn get_by_id(&self, instance_id: &str) -> DbResult<Option<StockInstance>> {
        let instance =
            sqlx::query_as::<_, StockInstance>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(instance_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(instance)
    }

    /// Lists the stock held by one area, soonest expiry first.
    pub async fn list_for_area(&self, area_id: &str) -> DbResult<Vec<StockInstance>> {
        let instances = sqlx::query_as::<_, StockInstance>(&format!(
            "{SELECT_COLUMNS} WHERE area_id = ?1 ORDER BY expiry_date, lot"
        ))
        .bind(area_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    /// Lists every stock instance across all areas.
    pub async fn list_all(&self) -> DbResult<Vec<StockInstance>> {
        let instances = sqlx::query_as::<_, StockInstance>(&format!(
            "{SELECT_COLUMNS} ORDER BY area_id, expiry_date, lot"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    /// Adds stock to an area, merging into an existing batch when the
    /// (product, lot) pair already exists there.
    ///
    /// ## Merge Semantics
    /// ```text
    /// add(COLD-01, MILK-1L, 5, L001)   →  new batch, quantity 5
    /// add(COLD-01, MILK-1L, 3, L001)   →  same batch, quantity 8
    /// add(COLD-01, MILK-1L, 3, L002)   →  second batch, quantity 3
    /// ```
    /// On merge the existing expiry date is kept: a lot has one production
    /// run and one expiry, the new delivery just adds units.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Area or catalog product doesn't exist
    /// * `Err(DbError::Domain(Validation))` - Non-positive quantity, bad lot
    pub async fn add_or_merge(
        &self,
        area_id: &str,
        product_id: &str,
        quantity: i64,
        expiry_date: NaiveDate,
        lot: &str,
    ) -> DbResult<StockInstance> {
        validate_quantity(quantity).map_err(CoreError::from)?;
        validate_code("lot", lot).map_err(CoreError::from)?;
        let lot = normalize_code(lot);

        debug!(area_id = %area_id, product_id = %product_id, quantity, lot = %lot, "Adding stock");

        let mut tx = self.pool.begin().await?;

        let area_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM areas WHERE id = ?1")
            .bind(area_id)
            .fetch_one(&mut *tx)
            .await?;
        if area_exists == 0 {
            return Err(DbError::not_found("Area", area_id));
        }

        let product_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM catalog_products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(product_name) = product_name else {
            return Err(DbError::not_found("Catalog product", product_id));
        };

        let existing = sqlx::query_as::<_, StockInstance>(&format!(
            "{SELECT_COLUMNS} WHERE area_id = ?1 AND product_id = ?2 AND lot = ?3"
        ))
        .bind(area_id)
        .bind(product_id)
        .bind(&lot)
        .fetch_optional(&mut *tx)
        .await?;

        let now = Utc::now();

        let instance = match existing {
            Some(mut instance) => {
                sqlx::query(
                    r#"
                    UPDATE stock_instances
                    SET quantity = quantity + ?2, updated_at = ?3
                    WHERE id = ?1
                    "#,
                )
                .bind(&instance.id)
                .bind(quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                instance.quantity += quantity;
                instance.updated_at = now;
                info!(id = %instance.id, quantity = instance.quantity, "Merged into existing batch");
                instance
            }
            None => {
                let instance = StockInstance {
                    id: Uuid::new_v4().to_string(),
                    area_id: area_id.to_string(),
                    product_id: product_id.to_string(),
                    name: product_name,
                    quantity,
                    expiry_date,
                    lot,
                    created_at: now,
                    updated_at: now,
                };

                sqlx::query(
                    r#"
                    INSERT INTO stock_instances
                        (id, area_id, product_id, name, quantity, expiry_date, lot,
                         created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )
                .bind(&instance.id)
                .bind(&instance.area_id)
                .bind(&instance.product_id)
                .bind(&instance.name)
                .bind(instance.quantity)
                .bind(instance.expiry_date)
                .bind(&instance.lot)
                .bind(instance.created_at)
                .bind(instance.updated_at)
                .execute(&mut *tx)
                .await?;

                info!(id = %instance.id, "Created new batch");
                instance
            }
        };

        tx.commit().await?;

        Ok(instance)
    }

    /// Sells units from a batch: decrements stock and appends a ledger
    /// record in one transaction.
    ///
    /// ## Returns
    /// * `Ok(SaleRecord)` - The appended ledger entry
    /// * `Err(DbError::NotFound)` - Instance doesn't exist
    /// * `Err(DbError::Domain(WrongArea))` - Instance lives in another area
    /// * `Err(DbError::Domain(InsufficientStock))` - Batch holds fewer units
    /// * `Err(DbError::Domain(Validation))` - Non-positive quantity or
    ///   missing destination
    ///
    /// Every failure happens before the first write, so a failed sale has
    /// no side effects.
    pub async fn sell(
        &self,
        area_id: &str,
        instance_id: &str,
        quantity: i64,
        destination: &str,
        recorded_by: &str,
    ) -> DbResult<SaleRecord> {
        validate_quantity(quantity).map_err(CoreError::from)?;
        validate_destination(destination).map_err(CoreError::from)?;

        debug!(area_id = %area_id, instance_id = %instance_id, quantity, "Selling stock");

        let mut tx = self.pool.begin().await?;

        let instance =
            sqlx::query_as::<_, StockInstance>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(instance_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(instance) = instance else {
            return Err(DbError::not_found("Stock instance", instance_id));
        };

        if !instance.is_in_area(area_id) {
            return Err(CoreError::WrongArea {
                instance_id: instance_id.to_string(),
                area_id: area_id.to_string(),
            }
            .into());
        }

        if quantity > instance.quantity {
            return Err(CoreError::InsufficientStock {
                name: instance.name.clone(),
                lot: instance.lot.clone(),
                available: instance.quantity,
                requested: quantity,
            }
            .into());
        }

        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE stock_instances SET quantity = quantity - ?2, updated_at = ?3 WHERE id = ?1
            "#,
        )
        .bind(instance_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let record = SaleRecord {
            id: Uuid::new_v4().to_string(),
            product_id: instance.product_id.clone(),
            name: instance.name.clone(),
            lot: instance.lot.clone(),
            expiry_date: instance.expiry_date,
            quantity_sold: quantity,
            destination: destination.trim().to_string(),
            area_id: area_id.to_string(),
            recorded_by: recorded_by.to_string(),
            sold_at: now,
        };

        sale::insert_record(&mut *tx, &record).await?;

        tx.commit().await?;

        info!(
            sale_id = %record.id,
            instance_id = %instance_id,
            quantity,
            remaining = instance.quantity - quantity,
            "Sale recorded"
        );

        Ok(record)
    }

    /// Replaces a batch's quantity, expiry date and lot code.
    ///
    /// Unlike add, an edit never merges: changing the lot to one that
    /// already exists for the same product in the area is a conflict.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Instance doesn't exist
    /// * `Err(DbError::Domain(WrongArea))` - Instance lives in another area
    /// * `Err(DbError::Domain(Validation))` - Negative quantity or bad lot
    /// * `Err(DbError::UniqueViolation)` - New lot collides with a sibling
    pub async fn update_instance(
        &self,
        area_id: &str,
        instance_id: &str,
        new_quantity: i64,
        new_expiry: NaiveDate,
        new_lot: &str,
    ) -> DbResult<StockInstance> {
        validate_new_quantity(new_quantity).map_err(CoreError::from)?;
        validate_code("lot", new_lot).map_err(CoreError::from)?;
        let new_lot = normalize_code(new_lot);

        debug!(area_id = %area_id, instance_id = %instance_id, "Updating batch");

        let mut tx = self.pool.begin().await?;

        let instance =
            sqlx::query_as::<_, StockInstance>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(instance_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(mut instance) = instance else {
            return Err(DbError::not_found("Stock instance", instance_id));
        };

        if !instance.is_in_area(area_id) {
            return Err(CoreError::WrongArea {
                instance_id: instance_id.to_string(),
                area_id: area_id.to_string(),
            }
            .into());
        }

        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE stock_instances
            SET quantity = ?2, expiry_date = ?3, lot = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(instance_id)
        .bind(new_quantity)
        .bind(new_expiry)
        .bind(&new_lot)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        instance.quantity = new_quantity;
        instance.expiry_date = new_expiry;
        instance.lot = new_lot;
        instance.updated_at = now;

        Ok(instance)
    }

    /// Deletes a batch entirely, regardless of remaining quantity.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Instance doesn't exist
    /// * `Err(DbError::Domain(WrongArea))` - Instance lives in another area
    pub async fn delete_instance(&self, area_id: &str, instance_id: &str) -> DbResult<()> {
        debug!(area_id = %area_id, instance_id = %instance_id, "Deleting batch");

        let mut tx = self.pool.begin().await?;

        let owner: Option<String> =
            sqlx::query_scalar("SELECT area_id FROM stock_instances WHERE id = ?1")
                .bind(instance_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(owner) = owner else {
            return Err(DbError::not_found("Stock instance", instance_id));
        };

        if owner != area_id {
            return Err(CoreError::WrongArea {
                instance_id: instance_id.to_string(),
                area_id: area_id.to_string(),
            }
            .into());
        }

        sqlx::query("DELETE FROM stock_instances WHERE id = ?1")
            .bind(instance_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use lacto_core::StorageType;

    /// In-memory database with one area and one catalog product.
    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.areas()
            .insert("COLD-01", "Cold Room 1", StorageType::Chilled)
            .await
            .unwrap();
        db.areas()
            .insert("FRZ-01", "Freezer 1", StorageType::Frozen)
            .await
            .unwrap();
        db.catalog().insert("MILK-1L", "Whole Milk 1L").await.unwrap();

        db
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_add_twice_with_same_lot_merges_quantities() {
        let db = test_db().await;

        let first = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();
        let second = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 3, date("2030-01-01"), "L001")
            .await
            .unwrap();

        // Same instance, summed quantity
        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 8);
        assert_eq!(db.stock().list_for_area("COLD-01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_merges_across_lot_spelling() {
        let db = test_db().await;

        db.stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "l001 ")
            .await
            .unwrap();
        let merged = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 2, date("2030-01-01"), "L001")
            .await
            .unwrap();

        assert_eq!(merged.quantity, 7);
        assert_eq!(merged.lot, "L001");
    }

    #[tokio::test]
    async fn test_different_lot_creates_second_batch() {
        let db = test_db().await;

        db.stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();
        db.stock()
            .add_or_merge("COLD-01", "MILK-1L", 3, date("2030-02-01"), "L002")
            .await
            .unwrap();

        assert_eq!(db.stock().list_for_area("COLD-01").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let db = test_db().await;

        // Non-positive quantity
        let err = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 0, date("2030-01-01"), "L001")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(_))
        ));

        // Unknown area
        let err = db
            .stock()
            .add_or_merge("GHOST", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // Unknown catalog product
        let err = db
            .stock()
            .add_or_merge("COLD-01", "GHOST", 5, date("2030-01-01"), "L001")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert!(db.stock().list_for_area("COLD-01").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sell_decrements_and_appends_exactly_one_record() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 10, date("2030-01-01"), "L001")
            .await
            .unwrap();

        let record = db
            .stock()
            .sell("COLD-01", &batch.id, 4, "Mercado Azul", "operator")
            .await
            .unwrap();

        assert_eq!(record.quantity_sold, 4);
        assert_eq!(record.product_id, "MILK-1L");
        assert_eq!(record.lot, "L001");
        assert_eq!(record.expiry_date, date("2030-01-01"));
        assert_eq!(record.recorded_by, "operator");

        let remaining = db.stock().get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(remaining.quantity, 6);

        let ledger = db.sales().list_all().await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].id, record.id);
    }

    #[tokio::test]
    async fn test_oversell_changes_nothing() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();

        let err = db
            .stock()
            .sell("COLD-01", &batch.id, 8, "Mercado Azul", "operator")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 5,
                requested: 8,
                ..
            })
        ));

        // Quantity untouched, no ledger entry
        let batch = db.stock().get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(batch.quantity, 5);
        assert!(db.sales().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sell_from_wrong_area_is_rejected() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();

        let err = db
            .stock()
            .sell("FRZ-01", &batch.id, 1, "Mercado Azul", "operator")
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::WrongArea { .. })));
        assert!(db.sales().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sell_rejects_zero_quantity_and_blank_destination() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();

        let err = db
            .stock()
            .sell("COLD-01", &batch.id, 0, "Mercado Azul", "operator")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db
            .stock()
            .sell("COLD-01", &batch.id, 1, "   ", "operator")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_draining_a_batch_keeps_zero_stock_row() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();

        db.stock()
            .sell("COLD-01", &batch.id, 5, "Mercado Azul", "operator")
            .await
            .unwrap();

        // The drained batch remains visible with quantity 0
        let remaining = db.stock().get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(remaining.quantity, 0);
        assert_eq!(db.stock().list_for_area("COLD-01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_fields_without_merging() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();
        let sibling = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 3, date("2030-02-01"), "L002")
            .await
            .unwrap();

        // Plain edit works, zero quantity allowed
        let updated = db
            .stock()
            .update_instance("COLD-01", &batch.id, 0, date("2030-03-01"), "L003")
            .await
            .unwrap();
        assert_eq!(updated.quantity, 0);
        assert_eq!(updated.lot, "L003");
        assert_eq!(updated.expiry_date, date("2030-03-01"));

        // Renaming a lot onto a sibling is a conflict, not a merge
        let err = db
            .stock()
            .update_instance("COLD-01", &sibling.id, 3, date("2030-02-01"), "L003")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let sibling = db.stock().get_by_id(&sibling.id).await.unwrap().unwrap();
        assert_eq!(sibling.lot, "L002");
    }

    #[tokio::test]
    async fn test_update_rejects_negative_quantity_and_wrong_area() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();

        let err = db
            .stock()
            .update_instance("COLD-01", &batch.id, -1, date("2030-01-01"), "L001")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db
            .stock()
            .update_instance("FRZ-01", &batch.id, 3, date("2030-01-01"), "L001")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::WrongArea { .. })));
    }

    #[tokio::test]
    async fn test_delete_instance() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();

        // Wrong area is rejected before anything is deleted
        let err = db
            .stock()
            .delete_instance("FRZ-01", &batch.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::WrongArea { .. })));

        // Deletion removes the row even with stock remaining
        db.stock().delete_instance("COLD-01", &batch.id).await.unwrap();
        assert!(db.stock().get_by_id(&batch.id).await.unwrap().is_none());

        let err = db
            .stock()
            .delete_instance("COLD-01", &batch.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_catalog_delete_blocked_while_stock_references_it() {
        let db = test_db().await;

        let batch = db
            .stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, date("2030-01-01"), "L001")
            .await
            .unwrap();

        let err = db.catalog().delete("MILK-1L").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ProductInUse { instances: 1, .. })
        ));

        // After the batch is gone the delete succeeds
        db.stock().delete_instance("COLD-01", &batch.id).await.unwrap();
        db.catalog().delete("MILK-1L").await.unwrap();
    }
}
