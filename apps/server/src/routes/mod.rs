//! # HTTP Routes
//!
//! One module per resource, each exposing a `router()` merged in main:
//!
//! - [`health`] - liveness probe (public)
//! - [`login`] - credential verification and token issuing
//! - [`areas`] - storage area CRUD
//! - [`catalog`] - catalog product CRUD
//! - [`stock`] - stock batches: add/merge, sell, edit, delete, listings
//! - [`reports`] - sales ledger, stock totals, expiry alerts

pub mod areas;
pub mod catalog;
pub mod health;
pub mod login;
pub mod reports;
pub mod stock;
