//! # Pricing Rules
//!
//! The configuration the engine is built from: colour synonyms, the discount
//! deny-list and catalog, the expression budget, and the level bound.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pricing.toml / env ──► PricingRules ──► validate() ──►                 │
//! │                                                                         │
//! │      PriceCalculator::new(&rules)                                       │
//! │        ├── ColorDictionary      (immutable lookup)                      │
//! │        ├── DiscountPolicy       (immutable lookup)                      │
//! │        ├── ExpressionBudget                                             │
//! │        └── max_level                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reading files and environment variables is the host application's job;
//! this type only describes the data.
//!
//! ## Example
//! ```toml
//! max_level = 100
//!
//! [colors]
//! black = ["black", "чорний"]
//! natural_white = ["white", "білий"]
//!
//! [discounts]
//! excluded_categories = ["LAUNDRY", "IRONING", "TEXTILE_DYEING"]
//!
//! [discounts.catalog]
//! NONE = 0
//! EVERCARD = 10
//!
//! [expression]
//! timeout_ms = 50
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::ColorSynonyms;
use crate::discount::DiscountSettings;
use crate::error::{PricingResult, ValidationError};
use crate::formula::ExpressionBudget;
use crate::validation;
use crate::DEFAULT_MAX_LEVEL;

/// Longest expression text a rule file may allow.
///
/// Operator chains like `1+1+…` are not counted as nesting, so this bounds
/// the evaluator's recursion.
pub const MAX_EXPRESSION_LENGTH: usize = 8_192;

/// Deepest nesting a rule file may allow.
pub const MAX_EXPRESSION_DEPTH: usize = 256;

/// Expression sandbox limits as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionSettings {
    pub max_length: usize,
    pub max_depth: usize,
    pub max_steps: u64,
    pub timeout_ms: u64,
}

impl Default for ExpressionSettings {
    fn default() -> Self {
        let budget = ExpressionBudget::default();
        ExpressionSettings {
            max_length: budget.max_length,
            max_depth: budget.max_depth,
            max_steps: budget.max_steps,
            timeout_ms: u64::try_from(budget.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl ExpressionSettings {
    pub fn budget(&self) -> ExpressionBudget {
        ExpressionBudget {
            max_length: self.max_length,
            max_depth: self.max_depth,
            max_steps: self.max_steps,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// All rule tables of the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingRules {
    /// Highest level a formula may be evaluated at.
    pub max_level: u32,
    pub colors: ColorSynonyms,
    pub discounts: DiscountSettings,
    pub expression: ExpressionSettings,
}

impl Default for PricingRules {
    fn default() -> Self {
        PricingRules {
            max_level: DEFAULT_MAX_LEVEL,
            colors: ColorSynonyms::default(),
            discounts: DiscountSettings::default(),
            expression: ExpressionSettings::default(),
        }
    }
}

impl PricingRules {
    /// Checks the rules before any lookup table is built.
    pub fn validate(&self) -> PricingResult<()> {
        if self.max_level == 0 {
            return Err(ValidationError::MustBePositive {
                field: "max_level".to_string(),
            }
            .into());
        }

        for category in &self.discounts.excluded_categories {
            validation::validate_code("excluded category", category)?;
        }

        for (code, percent) in &self.discounts.catalog {
            validation::validate_code("discount code", code)?;
            validation::validate_discount_percent(*percent)?;
        }

        let expression = &self.expression;
        for (field, value) in [
            ("expression.max_length", expression.max_length as u64),
            ("expression.max_depth", expression.max_depth as u64),
            ("expression.max_steps", expression.max_steps),
            ("expression.timeout_ms", expression.timeout_ms),
        ] {
            if value == 0 {
                return Err(ValidationError::MustBePositive {
                    field: field.to_string(),
                }
                .into());
            }
        }

        for (field, value, max) in [
            ("expression.max_length", expression.max_length, MAX_EXPRESSION_LENGTH),
            ("expression.max_depth", expression.max_depth, MAX_EXPRESSION_DEPTH),
        ] {
            if value > max {
                return Err(ValidationError::OutOfRange {
                    field: field.to_string(),
                    min: 1,
                    max: max as i64,
                }
                .into());
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
