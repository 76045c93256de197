//! # Reporting Aggregator
//!
//! Pure aggregation over loaded warehouse state: total stock per catalog
//! product, and the expiry-alert list.
//!
//! ## Expiry Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Expiry Alert Window                                 │
//! │                                                                         │
//! │   expiry < as_of        as_of ≤ expiry ≤ as_of+window      beyond       │
//! │  ────────────────┬───────────────────────────────────┬──────────────    │
//! │     EXPIRED      │             UPCOMING              │   (omitted)      │
//! │                  │                                   │                  │
//! │                as_of                          as_of + window            │
//! │                                                                         │
//! │  Sort order: EXPIRED first, then ascending days_until_expiry,           │
//! │  so the most urgent batches surface at the top of the report.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These functions never touch the database: callers load areas and
//! instances through lacto-db and hand them in as slices, which keeps every
//! reporting rule testable with plain values.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{Area, StockInstance};

// =============================================================================
// Total Stock by Product
// =============================================================================

/// Aggregated stock position for one catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTotal {
    /// Product name as denormalized onto the instances.
    pub name: String,

    /// Sum of quantities across every instance in every area.
    pub total_quantity: i64,
}

/// Sums stock across every instance, grouped by catalog product id.
///
/// The result is a BTreeMap so report output iterates in a stable order.
pub fn total_stock_by_product<'a, I>(instances: I) -> BTreeMap<String, StockTotal>
where
    I: IntoIterator<Item = &'a StockInstance>,
{
    let mut totals: BTreeMap<String, StockTotal> = BTreeMap::new();

    for instance in instances {
        totals
            .entry(instance.product_id.clone())
            .and_modify(|t| t.total_quantity += instance.quantity)
            .or_insert_with(|| StockTotal {
                name: instance.name.clone(),
                total_quantity: instance.quantity,
            });
    }

    totals
}

// =============================================================================
// Expiry Alerts
// =============================================================================

/// Classification of a batch relative to the alert window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryStatus {
    /// Expiry date is strictly before the as-of date.
    Expired,
    /// Expiry date falls inside the warning window.
    Upcoming,
}

/// One row of the expiry-alert report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryAlert {
    /// Id of the area holding the batch.
    pub area_id: String,

    /// Name of the area holding the batch.
    pub area_name: String,

    /// The batch itself (quantity, lot, expiry).
    pub instance: StockInstance,

    /// Whether the batch is already expired or merely close.
    pub status: ExpiryStatus,

    /// Signed days until expiry; negative for expired batches.
    pub days_until_expiry: i64,
}

/// Classifies a single expiry date against the alert window.
///
/// Returns `None` for batches comfortably inside their shelf life - they do
/// not appear in the report at all.
pub fn classify_expiry(
    expiry: NaiveDate,
    as_of: NaiveDate,
    window_days: i64,
) -> Option<ExpiryStatus> {
    if expiry < as_of {
        Some(ExpiryStatus::Expired)
    } else if expiry <= as_of + Duration::days(window_days) {
        Some(ExpiryStatus::Upcoming)
    } else {
        None
    }
}

/// Builds the expiry-alert report across all areas.
///
/// ## Ordering
/// Expired batches come first, then upcoming ones; within each group the
/// batch closest to (or furthest past) its date sorts first. This is a
/// stable sort, so batches with identical urgency keep their scan order.
pub fn expiry_alerts(
    areas: &[(Area, Vec<StockInstance>)],
    as_of: NaiveDate,
    window_days: i64,
) -> Vec<ExpiryAlert> {
    let mut alerts: Vec<ExpiryAlert> = Vec::new();

    for (area, instances) in areas {
        for instance in instances {
            if let Some(status) = classify_expiry(instance.expiry_date, as_of, window_days) {
                alerts.push(ExpiryAlert {
                    area_id: area.id.clone(),
                    area_name: area.name.clone(),
                    instance: instance.clone(),
                    status,
                    days_until_expiry: instance.days_until_expiry(as_of),
                });
            }
        }
    }

    alerts.sort_by_key(|a| (a.status != ExpiryStatus::Expired, a.days_until_expiry));

    alerts
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StorageType;
    use chrono::Utc;

    fn area(id: &str) -> Area {
        Area {
            id: id.to_string(),
            name: format!("Area {id}"),
            storage_type: StorageType::Chilled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn instance(area_id: &str, product_id: &str, quantity: i64, expiry: &str) -> StockInstance {
        StockInstance {
            id: uuid::Uuid::new_v4().to_string(),
            area_id: area_id.to_string(),
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            quantity,
            expiry_date: NaiveDate::parse_from_str(expiry, "%Y-%m-%d").unwrap(),
            lot: "L001".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_total_stock_sums_across_areas() {
        let instances = vec![
            instance("COLD-01", "MILK-1L", 5, "2024-03-01"),
            instance("COLD-02", "MILK-1L", 5, "2024-03-05"),
            instance("COLD-01", "YOG-NAT", 12, "2024-02-01"),
        ];

        let totals = total_stock_by_product(&instances);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals["MILK-1L"].total_quantity, 10);
        assert_eq!(totals["YOG-NAT"].total_quantity, 12);
        assert_eq!(totals["YOG-NAT"].name, "Product YOG-NAT");
    }

    #[test]
    fn test_total_stock_counts_zero_quantity_rows() {
        let instances = vec![
            instance("COLD-01", "MILK-1L", 0, "2024-03-01"),
            instance("COLD-02", "MILK-1L", 7, "2024-03-05"),
        ];

        let totals = total_stock_by_product(&instances);
        assert_eq!(totals["MILK-1L"].total_quantity, 7);
    }

    #[test]
    fn test_classify_expiry_boundaries() {
        let as_of = date("2024-01-10");

        // Strictly before as_of: expired
        assert_eq!(
            classify_expiry(date("2024-01-05"), as_of, 7),
            Some(ExpiryStatus::Expired)
        );

        // Expiring today is not yet expired, but it is inside the window
        assert_eq!(
            classify_expiry(as_of, as_of, 7),
            Some(ExpiryStatus::Upcoming)
        );

        // Last day of the window is included
        assert_eq!(
            classify_expiry(date("2024-01-17"), as_of, 7),
            Some(ExpiryStatus::Upcoming)
        );

        // One day past the window: omitted
        assert_eq!(classify_expiry(date("2024-01-18"), as_of, 7), None);
    }

    #[test]
    fn test_expiry_alerts_classification() {
        let as_of = date("2024-01-10");
        let areas = vec![(
            area("COLD-01"),
            vec![
                instance("COLD-01", "MILK-1L", 5, "2024-01-05"),
                instance("COLD-01", "YOG-NAT", 3, "2024-01-15"),
                instance("COLD-01", "BUT-200", 9, "2024-02-01"),
            ],
        )];

        let alerts = expiry_alerts(&areas, as_of, 7);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].status, ExpiryStatus::Expired);
        assert_eq!(alerts[0].instance.product_id, "MILK-1L");
        assert_eq!(alerts[0].days_until_expiry, -5);

        assert_eq!(alerts[1].status, ExpiryStatus::Upcoming);
        assert_eq!(alerts[1].instance.product_id, "YOG-NAT");
        assert_eq!(alerts[1].days_until_expiry, 5);
    }

    #[test]
    fn test_expiry_alerts_ordering() {
        let as_of = date("2024-01-10");
        let areas = vec![
            (
                area("COLD-01"),
                vec![
                    instance("COLD-01", "A", 1, "2024-01-12"), // upcoming, +2
                    instance("COLD-01", "B", 1, "2024-01-02"), // expired, -8
                ],
            ),
            (
                area("FRZ-01"),
                vec![
                    instance("FRZ-01", "C", 1, "2024-01-08"), // expired, -2
                    instance("FRZ-01", "D", 1, "2024-01-11"), // upcoming, +1
                ],
            ),
        ];

        let alerts = expiry_alerts(&areas, as_of, 7);
        let order: Vec<&str> = alerts
            .iter()
            .map(|a| a.instance.product_id.as_str())
            .collect();

        // Expired before upcoming, each group most-urgent-first
        assert_eq!(order, vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn test_expiry_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ExpiryStatus::Expired).unwrap(),
            "\"EXPIRED\""
        );
        assert_eq!(
            serde_json::to_string(&ExpiryStatus::Upcoming).unwrap(),
            "\"UPCOMING\""
        );
    }
}
