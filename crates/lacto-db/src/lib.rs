//! # lacto-db: Database Layer for Lacto WMS
//!
//! This crate provides database access for the warehouse system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lacto WMS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (sell_stock)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     lacto-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (stock.rs,   │    │  (embedded)  │  │   │
//! │  │   │               │    │   area.rs...) │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ StockRepo     │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ AreaRepo      │    │              │  │   │
//! │  │   │ Management    │    │ SaleRepo ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode, foreign keys on)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (user, catalog, area, stock, sale)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lacto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/lacto.db")).await?;
//!
//! let areas = db.areas().list_all().await?;
//! let sale = db.stock().sell("COLD-01", &instance_id, 3, "Mercado Azul", "operator").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::area::AreaRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;
pub use repository::user::UserRepository;
