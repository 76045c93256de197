//! # Sales Ledger Repository
//!
//! The append-only record of completed sales.
//!
//! Rows are written exactly once - by the sell transaction in
//! [`crate::repository::stock`] or by the seed binary - and never updated
//! or deleted. There is no dedup: two identical sales are two rows.

use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use lacto_core::SaleRecord;

const SELECT_COLUMNS: &str = "SELECT id, product_id, name, lot, expiry_date, quantity_sold, \
                              destination, area_id, recorded_by, sold_at FROM sale_records";

/// Repository for the sales ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Appends a sale record.
    ///
    /// The sell path appends inside its own transaction via
    /// [`insert_record`]; this method exists for callers outside that path
    /// (the seed binary).
    pub async fn append(&self, record: &SaleRecord) -> DbResult<()> {
        insert_record(&self.pool, record).await
    }

    /// Lists the full ledger, most recent sale first.
    pub async fn list_all(&self) -> DbResult<Vec<SaleRecord>> {
        let records = sqlx::query_as::<_, SaleRecord>(&format!(
            "{SELECT_COLUMNS} ORDER BY sold_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

/// Inserts a sale record through any executor.
///
/// Generic over the executor so the sell path can run it on its open
/// transaction while [`SaleRepository::append`] runs it on the pool.
pub(crate) async fn insert_record<'e, E>(executor: E, record: &SaleRecord) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    debug!(id = %record.id, product_id = %record.product_id, "Appending sale record");

    sqlx::query(
        r#"
        INSERT INTO sale_records
            (id, product_id, name, lot, expiry_date, quantity_sold,
             destination, area_id, recorded_by, sold_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&record.id)
    .bind(&record.product_id)
    .bind(&record.name)
    .bind(&record.lot)
    .bind(record.expiry_date)
    .bind(record.quantity_sold)
    .bind(&record.destination)
    .bind(&record.area_id)
    .bind(&record.recorded_by)
    .bind(record.sold_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, NaiveDate, Utc};
    use uuid::Uuid;

    fn record(product_id: &str, minutes_ago: i64) -> SaleRecord {
        SaleRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            lot: "L001".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            quantity_sold: 2,
            destination: "Mercado Azul".to_string(),
            area_id: "COLD-01".to_string(),
            recorded_by: "operator".to_string(),
            sold_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_list_all_most_recent_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let oldest = record("MILK-1L", 30);
        let middle = record("YOG-NAT", 20);
        let newest = record("BUT-200", 10);

        // Inserted out of order on purpose
        db.sales().append(&middle).await.unwrap();
        db.sales().append(&oldest).await.unwrap();
        db.sales().append(&newest).await.unwrap();

        let ids: Vec<String> = db
            .sales()
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
    }

    #[tokio::test]
    async fn test_append_preserves_snapshot_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let original = record("MILK-1L", 0);
        db.sales().append(&original).await.unwrap();

        let loaded = db.sales().list_all().await.unwrap().remove(0);
        assert_eq!(loaded.product_id, original.product_id);
        assert_eq!(loaded.lot, original.lot);
        assert_eq!(loaded.expiry_date, original.expiry_date);
        assert_eq!(loaded.quantity_sold, original.quantity_sold);
        assert_eq!(loaded.destination, original.destination);
        assert_eq!(loaded.recorded_by, original.recorded_by);
    }
}
