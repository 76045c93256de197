//! # Domain Types
//!
//! Core domain types used throughout Lacto WMS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CatalogProduct  │   │      Area       │   │  StockInstance  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (business)  │   │  id (business)  │   │  id (UUID)      │       │
//! │  │  name           │   │  name           │   │  quantity       │       │
//! │  │                 │   │  storage_type   │   │  expiry, lot    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │   SaleRecord    │   │   StorageType   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  username       │   │  append-only    │   │  Chilled        │       │
//! │  │  password_hash  │   │  snapshot of    │   │  Frozen         │       │
//! │  │  role           │   │  sold batch     │   │  Dry            │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! - Areas and catalog products use **business ids** assigned by admins
//!   ("COLD-01", "MILK-1L") - human-readable, uppercased on the way in.
//! - Stock instances and sale records use **system-assigned UUID v4** ids -
//!   a batch has no natural key beyond (area, product, lot), which can merge.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::permissions::Role;

// =============================================================================
// User
// =============================================================================

/// A warehouse system account.
///
/// The password is stored as an argon2id PHC string; verification lives in
/// the persistence layer so this type never sees a cleartext password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Login name, unique across the system.
    pub username: String,

    /// argon2id hash in PHC string format. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Name shown in the UI and on sale records.
    pub display_name: String,

    /// Role deciding which operations this user may perform.
    pub role: Role,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog Product
// =============================================================================

/// A product definition independent of any specific batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogProduct {
    /// Business identifier assigned by the catalog admin (e.g. "MILK-1L").
    pub id: String,

    /// Display name (e.g. "Whole Milk 1L").
    pub name: String,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last renamed.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Storage Type
// =============================================================================

/// Physical storage regime of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Refrigerated, 2-8 °C (most dairy).
    Chilled,
    /// Frozen, below -18 °C.
    Frozen,
    /// Ambient shelving (UHT, powdered products).
    Dry,
}

// =============================================================================
// Area
// =============================================================================

/// A physical storage location holding stock instances.
///
/// An area exclusively owns its stock instances: deleting an area is blocked
/// while any instance remains in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Area {
    /// Business identifier assigned by the warehouse admin (e.g. "COLD-01").
    pub id: String,

    /// Display name (e.g. "Cold Room 1").
    pub name: String,

    /// Storage regime of this area.
    pub storage_type: StorageType,

    /// When the area was created.
    pub created_at: DateTime<Utc>,

    /// When the area was last edited.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Instance
// =============================================================================

/// One batch of a catalog product inside an area.
///
/// ## Invariants
/// - `quantity >= 0` at all times. A sale that drains a batch leaves a
///   zero-stock row in place; only an explicit delete removes it.
/// - `(area_id, product_id, lot)` is unique within the store - adding stock
///   with a matching key merges into the existing instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockInstance {
    /// System-assigned identifier (UUID v4).
    pub id: String,

    /// Area that owns this batch.
    pub area_id: String,

    /// Catalog product this batch is an instance of.
    pub product_id: String,

    /// Product name copied from the catalog at add time.
    pub name: String,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Calendar date after which the batch is expired.
    pub expiry_date: NaiveDate,

    /// Batch identifier used as the merge key (uppercased).
    pub lot: String,

    /// When the batch was first added.
    pub created_at: DateTime<Utc>,

    /// When the batch was last changed (merge, sale, edit).
    pub updated_at: DateTime<Utc>,
}

impl StockInstance {
    /// Whether this batch belongs to the given area.
    #[inline]
    pub fn is_in_area(&self, area_id: &str) -> bool {
        self.area_id == area_id
    }

    /// Signed number of days until expiry; negative once expired.
    #[inline]
    pub fn days_until_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiry_date - as_of).num_days()
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// An immutable ledger entry for a completed sale.
///
/// Uses the snapshot pattern: product id, name, lot and expiry are frozen at
/// the moment of sale, so later edits or deletions of the source batch,
/// catalog entry or area never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRecord {
    /// System-assigned identifier (UUID v4).
    pub id: String,

    /// Catalog product id at time of sale (frozen).
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name: String,

    /// Lot code of the batch sold (frozen).
    pub lot: String,

    /// Expiry date of the batch at time of sale (frozen).
    pub expiry_date: NaiveDate,

    /// Units sold. Always positive.
    pub quantity_sold: i64,

    /// Customer or outlet the units were shipped to.
    pub destination: String,

    /// Area the stock left from.
    pub area_id: String,

    /// Username of the operator who recorded the sale.
    pub recorded_by: String,

    /// When the sale was recorded.
    pub sold_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(expiry: NaiveDate) -> StockInstance {
        StockInstance {
            id: "b1".to_string(),
            area_id: "COLD-01".to_string(),
            product_id: "MILK-1L".to_string(),
            name: "Whole Milk 1L".to_string(),
            quantity: 10,
            expiry_date: expiry,
            lot: "L001".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_days_until_expiry() {
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let fresh = batch(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(fresh.days_until_expiry(as_of), 5);

        let expired = batch(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(expired.days_until_expiry(as_of), -5);

        let today = batch(as_of);
        assert_eq!(today.days_until_expiry(as_of), 0);
    }

    #[test]
    fn test_is_in_area() {
        let b = batch(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(b.is_in_area("COLD-01"));
        assert!(!b.is_in_area("FRZ-01"));
    }

    #[test]
    fn test_storage_type_serde() {
        let json = serde_json::to_string(&StorageType::Chilled).unwrap();
        assert_eq!(json, "\"chilled\"");

        let back: StorageType = serde_json::from_str("\"frozen\"").unwrap();
        assert_eq!(back, StorageType::Frozen);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: "u1".to_string(),
            username: "manager".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            display_name: "Warehouse Manager".to_string(),
            role: Role::Manager,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("manager"));
    }
}
