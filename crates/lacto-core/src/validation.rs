//! # Validation Module
//!
//! Input validation utilities for Lacto WMS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/server)                                   │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (lacto-db)                                        │
//! │  ├── Re-checks quantities inside the transaction                       │
//! │  └── Existence checks (area, catalog product)                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  A validation failure at any layer leaves all state unchanged.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_BATCH_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Normalization
// =============================================================================

/// Normalizes a business code (area id, catalog id, lot): trim + uppercase.
///
/// Codes are entered by hand; "l001 " and "L001" must address the same lot,
/// or the merge key silently fragments into duplicate batches.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a business code (area id, catalog product id, lot).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 32 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use lacto_core::validation::validate_code;
///
/// assert!(validate_code("lot", "L-2024-001").is_ok());
/// assert!(validate_code("lot", "").is_err());
/// assert!(validate_code("lot", "has space").is_err());
/// ```
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (area name, product name).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a sale destination.
///
/// Same shape as a name; kept separate so the error names the right field.
pub fn validate_destination(destination: &str) -> ValidationResult<()> {
    validate_name("destination", destination)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity for add and sell operations.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_BATCH_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_BATCH_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_BATCH_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a replacement quantity for instance edits.
///
/// Unlike [`validate_quantity`], zero is allowed: an edit may zero out a
/// batch without deleting it.
pub fn validate_new_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 || qty > MAX_BATCH_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_BATCH_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Date Parsing
// =============================================================================

/// Parses an expiry date from its wire format (YYYY-MM-DD).
///
/// ## Example
/// ```rust
/// use lacto_core::validation::parse_expiry_date;
///
/// assert!(parse_expiry_date("2024-01-15").is_ok());
/// assert!(parse_expiry_date("15/01/2024").is_err());
/// assert!(parse_expiry_date("2024-02-30").is_err());
/// ```
pub fn parse_expiry_date(raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "expiry_date".to_string(),
        reason: "expected a calendar date in YYYY-MM-DD format".to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" l001 "), "L001");
        assert_eq!(normalize_code("Cold-01"), "COLD-01");
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("lot", "L001").is_ok());
        assert!(validate_code("lot", "L-2024_01").is_ok());

        assert!(validate_code("lot", "").is_err());
        assert!(validate_code("lot", "   ").is_err());
        assert!(validate_code("lot", "has space").is_err());
        assert!(validate_code("lot", &"A".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Cold Room 1").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(500).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_BATCH_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_new_quantity_allows_zero() {
        assert!(validate_new_quantity(0).is_ok());
        assert!(validate_new_quantity(42).is_ok());
        assert!(validate_new_quantity(-1).is_err());
    }

    #[test]
    fn test_parse_expiry_date() {
        assert_eq!(
            parse_expiry_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_expiry_date(" 2024-01-15 ").is_ok());

        assert!(parse_expiry_date("15/01/2024").is_err());
        assert!(parse_expiry_date("2024-02-30").is_err());
        assert!(parse_expiry_date("soon").is_err());
    }
}
