//! # Area Repository
//!
//! CRUD over storage areas.
//!
//! An area exclusively owns its stock instances. `delete` is therefore
//! blocked with an in-use error while any instance remains - stock is never
//! silently cascade-deleted with its shelf.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lacto_core::validation::{normalize_code, validate_code, validate_name};
use lacto_core::{Area, CoreError, StockInstance, StorageType};

const SELECT_COLUMNS: &str =
    "SELECT id, name, storage_type, created_at, updated_at FROM areas";

/// Repository for storage area database operations.
#[derive(Debug, Clone)]
pub struct AreaRepository {
    pool: SqlitePool,
}

impl AreaRepository {
    /// Creates a new AreaRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AreaRepository { pool }
    }

    /// Creates a storage area.
    ///
    /// The id is a business code assigned by the admin; it is trimmed and
    /// uppercased before storage.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Id already exists
    pub async fn insert(&self, id: &str, name: &str, storage_type: StorageType) -> DbResult<Area> {
        validate_code("area id", id).map_err(CoreError::from)?;
        validate_name("name", name).map_err(CoreError::from)?;

        let now = Utc::now();
        let area = Area {
            id: normalize_code(id),
            name: name.trim().to_string(),
            storage_type,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %area.id, ?storage_type, "Inserting area");

        sqlx::query(
            r#"
            INSERT INTO areas (id, name, storage_type, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&area.id)
        .bind(&area.name)
        .bind(area.storage_type)
        .bind(area.created_at)
        .bind(area.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(area)
    }

    /// Gets an area by its id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Area>> {
        let area = sqlx::query_as::<_, Area>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(area)
    }

    /// Lists all areas in insertion order.
    pub async fn list_all(&self) -> DbResult<Vec<Area>> {
        let areas = sqlx::query_as::<_, Area>(&format!("{SELECT_COLUMNS} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        Ok(areas)
    }

    /// Lists every area together with the stock it holds.
    ///
    /// This is the loading step for the reports and the all-areas stock
    /// endpoint; aggregation itself happens in lacto-core.
    pub async fn list_all_with_stock(&self) -> DbResult<Vec<(Area, Vec<StockInstance>)>> {
        let areas = self.list_all().await?;

        let instances = sqlx::query_as::<_, StockInstance>(
            r#"
            SELECT id, area_id, product_id, name, quantity, expiry_date, lot,
                   created_at, updated_at
            FROM stock_instances
            ORDER BY expiry_date, lot
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: Vec<(Area, Vec<StockInstance>)> =
            areas.into_iter().map(|a| (a, Vec::new())).collect();

        for instance in instances {
            if let Some((_, stock)) = grouped.iter_mut().find(|(a, _)| a.id == instance.area_id) {
                stock.push(instance);
            }
        }

        Ok(grouped)
    }

    /// Updates an area's name and storage type.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Area doesn't exist
    pub async fn update(&self, id: &str, name: &str, storage_type: StorageType) -> DbResult<()> {
        validate_name("name", name).map_err(CoreError::from)?;

        debug!(id = %id, "Updating area");

        let result = sqlx::query(
            r#"
            UPDATE areas SET name = ?2, storage_type = ?3, updated_at = ?4 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(storage_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Area", id));
        }

        Ok(())
    }

    /// Deletes an area.
    ///
    /// Blocked while the area still owns stock instances; count and delete
    /// run in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(AreaInUse))` - Area still holds stock
    /// * `Err(DbError::NotFound)` - Area doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting area");

        let mut tx = self.pool.begin().await?;

        let instances: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_instances WHERE area_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if instances > 0 {
            return Err(CoreError::AreaInUse {
                area_id: id.to_string(),
                instances,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM areas WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Area", id));
        }

        tx.commit().await?;

        Ok(())
    }

    /// Counts areas (used by the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM areas")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;

        let area = db
            .areas()
            .insert("cold-01", "Cold Room 1", StorageType::Chilled)
            .await
            .unwrap();

        assert_eq!(area.id, "COLD-01");

        let loaded = db.areas().get_by_id("COLD-01").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Cold Room 1");
        assert_eq!(loaded.storage_type, StorageType::Chilled);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let db = test_db().await;

        db.areas()
            .insert("COLD-01", "Cold Room 1", StorageType::Chilled)
            .await
            .unwrap();

        let err = db
            .areas()
            .insert("COLD-01", "Another Room", StorageType::Frozen)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;

        db.areas()
            .insert("FRZ-01", "Freezer", StorageType::Frozen)
            .await
            .unwrap();
        db.areas()
            .update("FRZ-01", "Freezer 1", StorageType::Frozen)
            .await
            .unwrap();

        let area = db.areas().get_by_id("FRZ-01").await.unwrap().unwrap();
        assert_eq!(area.name, "Freezer 1");

        let err = db
            .areas()
            .update("GHOST", "Anything", StorageType::Dry)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_empty_area() {
        let db = test_db().await;

        db.areas()
            .insert("DRY-01", "Dry Storage", StorageType::Dry)
            .await
            .unwrap();
        db.areas().delete("DRY-01").await.unwrap();

        assert!(db.areas().get_by_id("DRY-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_area_holding_stock_is_blocked() {
        let db = test_db().await;

        db.areas()
            .insert("COLD-01", "Cold Room 1", StorageType::Chilled)
            .await
            .unwrap();
        db.catalog().insert("MILK-1L", "Whole Milk 1L").await.unwrap();
        db.stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, "2030-01-01".parse().unwrap(), "L001")
            .await
            .unwrap();

        let err = db.areas().delete("COLD-01").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::AreaInUse { instances: 1, .. })
        ));

        // Area and its stock are intact
        assert!(db.areas().get_by_id("COLD-01").await.unwrap().is_some());
        assert_eq!(db.stock().list_for_area("COLD-01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_with_stock_groups_by_area() {
        let db = test_db().await;

        db.areas()
            .insert("COLD-01", "Cold Room 1", StorageType::Chilled)
            .await
            .unwrap();
        db.areas()
            .insert("FRZ-01", "Freezer 1", StorageType::Frozen)
            .await
            .unwrap();
        db.catalog().insert("MILK-1L", "Whole Milk 1L").await.unwrap();
        db.stock()
            .add_or_merge("COLD-01", "MILK-1L", 5, "2030-01-01".parse().unwrap(), "L001")
            .await
            .unwrap();

        let grouped = db.areas().list_all_with_stock().await.unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0.id, "COLD-01");
        assert_eq!(grouped[0].1.len(), 1);
        assert!(grouped[1].1.is_empty());
    }
}
