//! # Error Types
//!
//! Domain-specific error types for aksi-pricing.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  aksi-pricing errors (this file)                                       │
//! │  ├── PricingError     - Calculation failures (ranges, formulas, …)     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  price-preview errors (app)                                            │
//! │  └── ConfigError      - Rule file / environment problems               │
//! │                                                                         │
//! │  Flow: ValidationError → PricingError → caller decides                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is a value returned to the immediate caller. Nothing here
//! logs, retries, or formats for end users.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Pricing Error
// =============================================================================

/// Pricing calculation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// `target_level < start_level`, a level below 1, or a level above the
    /// configured maximum.
    #[error("Invalid level range: from={start_level}, to={target_level}")]
    InvalidRange { start_level: u32, target_level: u32 },

    /// A `Range` formula has no tier covering the requested level.
    #[error("No price tier covers level {level}")]
    NoMatchingTier { level: u32 },

    /// An `Expression` formula failed to parse or referenced an unknown name.
    ///
    /// `position` is the byte offset into the expression text.
    #[error("Formula syntax error at {position}: {reason}")]
    FormulaSyntax { position: usize, reason: String },

    /// Expression evaluation exceeded its time or step budget.
    #[error("Formula evaluation exceeded its budget of {budget_ms}ms")]
    FormulaTimeout { budget_ms: u64 },

    /// Division by zero or integer overflow inside an expression or formula.
    #[error("Formula arithmetic error: {reason}")]
    FormulaArithmetic { reason: String },

    /// A formula produced a non-positive price.
    ///
    /// This is a computation bug in the configured formula, not a
    /// condition callers should paper over.
    #[error("Formula produced a non-positive price: {price}")]
    NegativeOrZeroPrice { price: Money },

    /// A modifier with malformed data.
    #[error("Invalid modifier '{code}': {reason}")]
    InvalidModifierConfiguration { code: String, reason: String },

    /// A formula whose configuration cannot be evaluated at all.
    #[error("Invalid formula configuration: {reason}")]
    InvalidFormulaConfiguration { reason: String },

    /// A discount code that is not in the discount catalog.
    #[error("Unknown discount code: {0}")]
    UnknownDiscountCode(String),

    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl PricingError {
    pub(crate) fn syntax(position: usize, reason: impl Into<String>) -> Self {
        PricingError::FormulaSyntax {
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn arithmetic(reason: impl Into<String>) -> Self {
        PricingError::FormulaArithmetic {
            reason: reason.into(),
        }
    }

    pub(crate) fn formula_config(reason: impl Into<String>) -> Self {
        PricingError::InvalidFormulaConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn modifier(code: &str, reason: impl Into<String>) -> Self {
        PricingError::InvalidModifierConfiguration {
            code: code.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request data doesn't meet basic requirements and are
/// raised before any pricing logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;

// =============================================================================
// Unit Tests
// =============================================================================
