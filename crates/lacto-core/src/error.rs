//! # Error Types
//!
//! Domain-specific error types for lacto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lacto-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lacto-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP API errors (in apps/server)                                      │
//! │  └── ApiError         - What clients see (serialized + status code)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (lot, id, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule violations.
///
/// These errors represent rejected operations, not defects. They are caught
/// at the boundary around the failing operation and translated to a
/// user-visible message; state is left unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sale requested more units than the batch holds.
    ///
    /// ## When This Occurs
    /// ```text
    /// Sell 8 units of Whole Milk 1L (Lot L001)
    ///      │
    ///      ▼
    /// Batch holds: 5
    ///      │
    ///      ▼
    /// InsufficientStock { name, lot: "L001", available: 5, requested: 8 }
    /// ```
    #[error("Insufficient stock for {name} (lot {lot}): available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        lot: String,
        available: i64,
        requested: i64,
    },

    /// Instance-scoped request named an area the instance does not belong to.
    ///
    /// ## When This Occurs
    /// - A sell/edit/delete path addresses `/areas/FRZ-01/stock/{id}` but the
    ///   batch lives in COLD-01 (stale client state, or a crafted request)
    #[error("Stock instance {instance_id} does not belong to area {area_id}")]
    WrongArea {
        instance_id: String,
        area_id: String,
    },

    /// Area deletion blocked because it still owns stock instances.
    #[error("Area {area_id} still holds {instances} stock instance(s)")]
    AreaInUse { area_id: String, instances: i64 },

    /// Catalog product deletion blocked because stock instances reference it.
    #[error("Catalog product {product_id} is referenced by {instances} stock instance(s)")]
    ProductInUse { product_id: String, instances: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., unparseable date, bad characters in a code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Whole Milk 1L".to_string(),
            lot: "L001".to_string(),
            available: 5,
            requested: 8,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Whole Milk 1L (lot L001): available 5, requested 8"
        );

        let err = CoreError::WrongArea {
            instance_id: "abc".to_string(),
            area_id: "FRZ-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Stock instance abc does not belong to area FRZ-01"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "lot".to_string(),
        };
        assert_eq!(err.to_string(), "lot is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "destination".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
