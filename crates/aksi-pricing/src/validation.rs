//! # Validation Module
//!
//! Input validation utilities for pricing requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin UI / order wizard                                      │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: PriceRequest → PriceContext (deserialization)                 │
//! │  └── THIS MODULE: field-level rules                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Components                                                    │
//! │  └── Formula / modifier configuration checks (PricingError)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_CODE_LENGTH, MAX_ITEM_QUANTITY, MAX_SURCHARGE_PERCENT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a business code (modifier, discount, or category code).
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits, `-` and `_` only
///
/// ## Example
/// ```rust
/// use aksi_pricing::validation::validate_code;
///
/// assert!(validate_code("modifier code", "silk_satin").is_ok());
/// assert!(validate_code("modifier code", "").is_err());
/// assert!(validate_code("modifier code", "has space").is_err());
/// ```
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CODE_LENGTH,
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

/// Validates a free-text colour label. Blank labels are allowed.
pub fn validate_color_label(label: &str) -> ValidationResult<()> {
    if label.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "color".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if i64::from(qty) > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a catalog price in minor units.
///
/// ## Example
/// ```rust
/// use aksi_pricing::validation::validate_price_minor;
///
/// assert!(validate_price_minor("basePrice", 10000).is_ok());
/// assert!(validate_price_minor("basePrice", 0).is_ok());
/// assert!(validate_price_minor("basePrice", -100).is_err());
/// ```
pub fn validate_price_minor(field: &str, minor: i64) -> ValidationResult<()> {
    if minor < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount percentage (0-100).
pub fn validate_discount_percent(percent: u32) -> ValidationResult<()> {
    if percent > 100 {
        return Err(ValidationError::OutOfRange {
            field: "discountPercent".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates an urgency surcharge percentage.
pub fn validate_urgency_percent(percent: u32) -> ValidationResult<()> {
    if percent > MAX_SURCHARGE_PERCENT {
        return Err(ValidationError::OutOfRange {
            field: "urgencyPercent".to_string(),
            min: 0,
            max: i64::from(MAX_SURCHARGE_PERCENT),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
