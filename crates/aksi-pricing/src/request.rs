//! # Price Request
//!
//! The wire shape callers send for one line item, and its conversion into a
//! validated [`PriceContext`].
//!
//! ```json
//! {
//!   "basePrice": 10000, "blackPrice": 12000, "colorPrice": 11000,
//!   "colorLabel": "чорний",
//!   "formula": { "type": "LINEAR", "pricePerLevel": 500 },
//!   "startLevel": 1, "targetLevel": 5,
//!   "modifiers": [{ "code": "silk", "kind": "PERCENTAGE",
//!                   "operation": "MULTIPLY", "value": 50, "priority": 1 }],
//!   "urgencyPercent": 50,
//!   "discountCode": "EVERCARD",
//!   "categoryCode": "CLOTHING"
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{PricingResult, ValidationError};
use crate::formula::CalculationFormula;
use crate::money::Money;
use crate::types::{DiscountSelection, FormulaSelection, Modifier, PriceContext, PriceTier};
use crate::urgency::UrgencyLevel;

/// Pricing input for one line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub base_price: Money,
    #[serde(default)]
    pub black_price: Option<Money>,
    #[serde(default)]
    pub color_price: Option<Money>,
    #[serde(default)]
    pub color_label: Option<String>,

    #[serde(default)]
    pub formula: Option<CalculationFormula>,
    #[serde(default)]
    pub start_level: Option<u32>,
    #[serde(default)]
    pub target_level: Option<u32>,

    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,

    #[serde(default)]
    pub urgency: Option<UrgencyLevel>,
    /// Overrides `urgency` when both are given.
    #[serde(default)]
    pub urgency_percent: Option<u32>,

    #[serde(default)]
    pub discount_code: Option<String>,
    /// Percent for the caller-defined `OTHER` discount.
    #[serde(default)]
    pub discount_percent: Option<u32>,
    #[serde(default)]
    pub category_code: Option<String>,
}

/// `None` for missing or blank strings, trimmed otherwise.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PriceRequest {
    /// Validates the request and builds the context.
    ///
    /// Field rules are those of [`PriceContext::validate`]; formula
    /// configuration and modifier rules are checked later by the components
    /// themselves.
    pub fn into_context(self) -> PricingResult<PriceContext> {
        let formula = match self.formula {
            Some(formula) => Some(FormulaSelection {
                formula,
                start_level: self.start_level.ok_or_else(|| ValidationError::Required {
                    field: "startLevel".to_string(),
                })?,
                target_level: self.target_level.ok_or_else(|| ValidationError::Required {
                    field: "targetLevel".to_string(),
                })?,
            }),
            None => None,
        };

        let urgency_percent = self
            .urgency_percent
            .or_else(|| self.urgency.map(|u| u.percent()))
            .unwrap_or(0);

        let discount = non_blank(self.discount_code).map(|code| DiscountSelection {
            code,
            custom_percent: self.discount_percent,
        });

        let ctx = PriceContext {
            tier: PriceTier {
                base_price: self.base_price,
                black_price: self.black_price,
                color_price: self.color_price,
            },
            color_label: self.color_label,
            quantity: self.quantity.unwrap_or(1),
            formula,
            modifiers: self.modifiers,
            urgency_percent,
            discount,
            category_code: non_blank(self.category_code),
        };
        ctx.validate()?;
        Ok(ctx)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
