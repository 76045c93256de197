//! # lacto-core: Pure Business Logic for Lacto WMS
//!
//! This crate is the **heart** of the warehouse system. It contains all
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lacto WMS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/server)                       │   │
//! │  │    login, area CRUD, stock add/sell/edit, reports              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lacto-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │permissions│  │ reporting │  │ validation│  │   │
//! │  │   │   Area    │  │   Role    │  │  expiry   │  │   rules   │  │   │
//! │  │   │   Stock   │  │Permission │  │  totals   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lacto-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Area, StockInstance, SaleRecord, ...)
//! - [`permissions`] - Roles and the static role → permission mapping
//! - [`reporting`] - Expiry alerts and total-stock aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Quantities**: Stock is counted in whole units (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod permissions;
pub mod reporting;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use lacto_core::Area` instead of
// `use lacto_core::types::Area`

pub use error::{CoreError, ValidationError};
pub use permissions::{Permission, Role};
pub use reporting::{ExpiryAlert, ExpiryStatus, StockTotal};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted for a single batch operation (add, sell, edit).
///
/// ## Business Reason
/// Prevents accidental over-entry (e.g., scanning a barcode into the
/// quantity field). Warehouse batches never approach this size.
pub const MAX_BATCH_QUANTITY: i64 = 1_000_000;

/// Default expiry-alert window used by the reports when none is given.
pub const DEFAULT_ALERT_WINDOW_DAYS: i64 = 7;
