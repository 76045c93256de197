//! # Roles and Permissions
//!
//! Static role-based access control for warehouse operations.
//!
//! ## Access Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Role → Permission Mapping                           │
//! │                                                                         │
//! │               View   Manage  Manage  Manage  Record  View              │
//! │               Whse   Areas   Catalog Stock   Sales   Reports           │
//! │  Manager       ✅      ✅      ✅      ✅      ✅      ✅              │
//! │  Operator      ✅      ❌      ❌      ✅      ✅      ❌              │
//! │  Viewer        ✅      ❌      ❌      ❌      ❌      ❌              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mapping is a closed enumeration checked by a pure function. There is
//! no dynamic permission storage: changing access rules is a code change,
//! which keeps every grant reviewable in one place.

use serde::{Deserialize, Serialize};

// =============================================================================
// Permission
// =============================================================================

/// A single operation class a role may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Browse areas and the stock they hold.
    ViewWarehouse,
    /// Create, rename and delete storage areas.
    ManageAreas,
    /// Create, rename and delete catalog products.
    ManageCatalog,
    /// Add, edit and remove stock batches inside areas.
    ManageStock,
    /// Record sales (decrement stock + append to the ledger).
    RecordSales,
    /// Read the sales ledger, stock totals and expiry alerts.
    ViewReports,
}

// =============================================================================
// Role
// =============================================================================

/// A user's role. Maps to a fixed permission set via [`Role::allows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every operation, including reports.
    Manager,
    /// Day-to-day stock handling: add, edit and sell batches.
    Operator,
    /// Read-only warehouse browsing.
    Viewer,
}

impl Role {
    /// The complete permission set for this role.
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Manager => &[
                Permission::ViewWarehouse,
                Permission::ManageAreas,
                Permission::ManageCatalog,
                Permission::ManageStock,
                Permission::RecordSales,
                Permission::ViewReports,
            ],
            Role::Operator => &[
                Permission::ViewWarehouse,
                Permission::ManageStock,
                Permission::RecordSales,
            ],
            Role::Viewer => &[Permission::ViewWarehouse],
        }
    }

    /// Whether this role is granted the given permission.
    #[inline]
    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
