//! # aksi-pricing: Price & Modifier Calculation Engine
//!
//! This crate turns a catalog price plus the business rules of a
//! dry-cleaning order into a final, billable amount. It is pure: no I/O,
//! no global state, no log subscriber.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Aksi Pricing                                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   Callers: order-item pricing step, pricing admin preview       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PriceRequest / PriceContext            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ aksi-pricing (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │  color   │ │ formula  │ │ modifier │ │ discount │ │compo-│ │   │
//! │  │   │ resolver │ │evaluator │ │ applier  │ │  policy  │ │ ser  │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CalculationResult (+ audit trail)      │
//! │                                ▼                                        │
//! │        Order summary (sums final prices, outside this crate)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money with half-away-from-zero rounding
//! - [`types`] - Tiers, modifiers, contexts, results
//! - [`color`] - Colour-dependent unit price
//! - [`formula`] - Level/tier formulas and the sandboxed expression evaluator
//! - [`modifier`] - Ordered modifier application with breakdown
//! - [`urgency`] - Urgency surcharge policy
//! - [`discount`] - Discount catalog and category deny-list
//! - [`composer`] - Final order-of-operations sum
//! - [`calculator`] - The facade running all of the above
//! - [`rules`] - Rule tables the calculator is built from
//! - [`request`] - Wire request and its validation
//!
//! ## Example Usage
//!
//! ```rust
//! use aksi_pricing::{PriceCalculator, PriceRequest, Money};
//!
//! let request: PriceRequest = serde_json::from_str(r#"{
//!     "basePrice": 2000,
//!     "modifiers": [{"code": "buttons", "kind": "FIXED", "operation": "ADD", "value": 500}],
//!     "urgencyPercent": 40,
//!     "discountCode": "EVERCARD",
//!     "categoryCode": "CLOTHING"
//! }"#).unwrap();
//!
//! let result = PriceCalculator::default().calculate_request(request).unwrap();
//!
//! // 2000 + 500 + 1000 (40%) - 350 (10% of 3500)
//! assert_eq!(result.final_price, Money::from_minor(3150));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod color;
pub mod composer;
pub mod discount;
pub mod error;
pub mod formula;
pub mod modifier;
pub mod money;
pub mod request;
pub mod rules;
pub mod types;
pub mod urgency;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::PriceCalculator;
pub use error::{PricingError, PricingResult, ValidationError};
pub use formula::{CalculationFormula, FormulaEvaluator};
pub use money::Money;
pub use request::PriceRequest;
pub use rules::PricingRules;
pub use types::*;
pub use urgency::UrgencyLevel;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency of every amount (ISO 4217). Amounts are in kopiykas.
pub const CURRENCY: &str = "UAH";

/// Maximum length of modifier, discount and category codes.
pub const MAX_CODE_LENGTH: usize = 64;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typos at intake (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest urgency surcharge accepted, in percent.
pub const MAX_SURCHARGE_PERCENT: u32 = 500;

/// Level bound used when the rules do not configure one.
pub const DEFAULT_MAX_LEVEL: u32 = 10_000;
