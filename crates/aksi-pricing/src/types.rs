//! # Domain Types
//!
//! Value types flowing into and out of the pricing engine.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INPUT                                     OUTPUT                       │
//! │  ┌─────────────────┐                       ┌──────────────────────┐     │
//! │  │  PriceContext   │                       │  CalculationResult   │     │
//! │  │  ─────────────  │   PriceCalculator     │  ──────────────────  │     │
//! │  │  tier           │ ────────────────────► │  base_price          │     │
//! │  │  color_label    │                       │  modifiers_total     │     │
//! │  │  quantity       │                       │  applied_modifiers[] │     │
//! │  │  formula?       │                       │  urgency_amount      │     │
//! │  │  modifiers[]    │                       │  discount_amount     │     │
//! │  │  urgency %      │                       │  final_price         │     │
//! │  │  discount?      │                       │  audit[]             │     │
//! │  │  category?      │                       └──────────────────────┘     │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All types are plain values: built per request from upstream data and
//! dropped after use. Nothing here has a persistent identity.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::color::ColorClass;
use crate::discount::DiscountSkipReason;
use crate::error::{PricingError, PricingResult};
use crate::formula::CalculationFormula;
use crate::money::Money;
use crate::validation;

// =============================================================================
// Price Tier
// =============================================================================

/// Catalog price tiers of a single item.
///
/// `black_price` and `color_price` are optional overrides used for dyeing
/// and colour-sensitive cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub base_price: Money,
    #[serde(default)]
    pub black_price: Option<Money>,
    #[serde(default)]
    pub color_price: Option<Money>,
}

impl PriceTier {
    /// A tier with only a base price.
    pub const fn base(base_price: Money) -> Self {
        PriceTier {
            base_price,
            black_price: None,
            color_price: None,
        }
    }
}

// =============================================================================
// Modifiers
// =============================================================================

/// How a modifier's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierKind {
    /// `value` is an amount in minor units.
    Fixed,
    /// `value` is a percentage (50 = 50%).
    Percentage,
}

/// What a modifier does with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A pricing rule applied to the running price.
///
/// Modifiers run in ascending `priority`; equal priorities keep their input
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub kind: ModifierKind,
    pub operation: ModifierOperation,
    pub value: i64,
    #[serde(default)]
    pub priority: i32,
}

impl Modifier {
    /// Builds a validated modifier.
    ///
    /// ## Rules
    /// - `code` must be a valid code (see [`validation::validate_code`])
    /// - `value` must be non-negative; the sign comes from `operation`
    /// - `DIVIDE` needs a positive divisor
    /// - `FIXED` only supports `ADD` / `SUBTRACT`
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        kind: ModifierKind,
        operation: ModifierOperation,
        value: i64,
        priority: i32,
    ) -> PricingResult<Self> {
        let modifier = Modifier {
            code: code.into(),
            name: name.into(),
            kind,
            operation,
            value,
            priority,
        };
        modifier.validate()?;
        Ok(modifier)
    }

    /// Checks the modifier data without applying it.
    pub fn validate(&self) -> PricingResult<()> {
        validation::validate_code("modifier code", &self.code)
            .map_err(|e| PricingError::modifier(&self.code, e.to_string()))?;

        if self.value < 0 {
            return Err(PricingError::modifier(
                &self.code,
                "value must not be negative",
            ));
        }

        match (self.kind, self.operation) {
            (ModifierKind::Fixed, ModifierOperation::Multiply | ModifierOperation::Divide) => {
                Err(PricingError::modifier(
                    &self.code,
                    format!("{:?} modifiers only support ADD and SUBTRACT", self.kind),
                ))
            }
            (ModifierKind::Percentage, ModifierOperation::Divide) if self.value <= 0 => Err(
                PricingError::modifier(&self.code, "divisor must be positive"),
            ),
            _ => Ok(()),
        }
    }
}

/// A non-fatal condition met while applying a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierWarning {
    /// The delta would have driven the running price below zero.
    #[serde(rename_all = "camelCase")]
    ClampedToZero { requested_delta: Money },
}

/// One step of the modifier breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedModifier {
    pub code: String,
    pub name: String,
    pub kind: ModifierKind,
    pub operation: ModifierOperation,
    pub value: i64,
    /// Change applied to the running price (after clamping).
    pub delta: Money,
    /// Running price after this step.
    pub price_after: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<ModifierWarning>,
}

// =============================================================================
// Price Context
// =============================================================================

/// A formula together with the level range it is evaluated over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaSelection {
    pub formula: CalculationFormula,
    pub start_level: u32,
    pub target_level: u32,
}

/// A discount requested for the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSelection {
    pub code: String,
    /// Percent for caller-defined discounts (`OTHER`).
    #[serde(default)]
    pub custom_percent: Option<u32>,
}

/// The read-only input bundle for a single line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceContext {
    pub tier: PriceTier,
    pub color_label: Option<String>,
    pub quantity: u32,
    pub formula: Option<FormulaSelection>,
    pub modifiers: Vec<Modifier>,
    /// Urgency surcharge in percent (0 = standard turnaround).
    pub urgency_percent: u32,
    pub discount: Option<DiscountSelection>,
    pub category_code: Option<String>,
}

impl PriceContext {
    /// A context for one unit at the tier's prices with nothing else applied.
    pub fn for_tier(tier: PriceTier) -> Self {
        PriceContext {
            tier,
            color_label: None,
            quantity: 1,
            formula: None,
            modifiers: Vec::new(),
            urgency_percent: 0,
            discount: None,
            category_code: None,
        }
    }

    /// Field-level rules every context must satisfy before calculation.
    ///
    /// Formula configuration and modifier data are checked by the components
    /// that use them.
    pub fn validate(&self) -> PricingResult<()> {
        validation::validate_price_minor("basePrice", self.tier.base_price.minor())?;
        if let Some(black) = self.tier.black_price {
            validation::validate_price_minor("blackPrice", black.minor())?;
        }
        if let Some(color) = self.tier.color_price {
            validation::validate_price_minor("colorPrice", color.minor())?;
        }
        if let Some(label) = &self.color_label {
            validation::validate_color_label(label)?;
        }

        validation::validate_quantity(self.quantity)?;
        validation::validate_urgency_percent(self.urgency_percent)?;

        if let Some(discount) = &self.discount {
            validation::validate_code("discountCode", &discount.code)?;
            if let Some(percent) = discount.custom_percent {
                validation::validate_discount_percent(percent)?;
            }
        }
        if let Some(category) = &self.category_code {
            validation::validate_code("categoryCode", category)?;
        }

        Ok(())
    }
}

// =============================================================================
// Calculation Result
// =============================================================================

/// One entry of the ordered audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "step", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntry {
    #[serde(rename_all = "camelCase")]
    ColorResolved {
        color_class: ColorClass,
        unit_price: Money,
    },
    #[serde(rename_all = "camelCase")]
    FormulaEvaluated { description: String, unit_price: Money },
    #[serde(rename_all = "camelCase")]
    QuantityApplied { quantity: u32, amount: Money },
    #[serde(rename_all = "camelCase")]
    ModifiersApplied { count: u32, total: Money },
    #[serde(rename_all = "camelCase")]
    UrgencyApplied { percent: u32, amount: Money },
    #[serde(rename_all = "camelCase")]
    DiscountApplied {
        code: String,
        percent: u32,
        amount: Money,
    },
    #[serde(rename_all = "camelCase")]
    DiscountSkipped {
        code: String,
        reason: DiscountSkipReason,
    },
    #[serde(rename_all = "camelCase")]
    Composed { final_price: Money },
}

/// The billable outcome for one line item, with its full audit trail.
///
/// Equality ignores `execution_time_millis`: two calculations over the same
/// input compare equal even if one of them ran slower.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Unit price (colour-resolved, formula-evaluated) × quantity.
    pub base_price: Money,
    pub modifiers_total: Money,
    pub applied_modifiers: Vec<AppliedModifier>,
    pub urgency_percent: u32,
    pub urgency_amount: Money,
    pub discount_eligible: bool,
    pub discount_percent: u32,
    pub discount_amount: Money,
    /// May be negative; see [`crate::composer::compose`].
    pub final_price: Money,
    pub currency: String,
    pub formula_description: Option<String>,
    pub execution_time_millis: u64,
    pub audit: Vec<AuditEntry>,
}

impl PartialEq for CalculationResult {
    fn eq(&self, other: &Self) -> bool {
        self.base_price == other.base_price
            && self.modifiers_total == other.modifiers_total
            && self.applied_modifiers == other.applied_modifiers
            && self.urgency_percent == other.urgency_percent
            && self.urgency_amount == other.urgency_amount
            && self.discount_eligible == other.discount_eligible
            && self.discount_percent == other.discount_percent
            && self.discount_amount == other.discount_amount
            && self.final_price == other.final_price
            && self.currency == other.currency
            && self.formula_description == other.formula_description
            && self.audit == other.audit
    }
}

impl Eq for CalculationResult {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_new_valid() {
        let m = Modifier::new(
            "silk",
            "Natural silk",
            ModifierKind::Percentage,
            ModifierOperation::Multiply,
            50,
            10,
        )
        .unwrap();
        assert_eq!(m.code, "silk");
        assert_eq!(m.priority, 10);
    }

    #[test]
    fn test_modifier_rejects_negative_value() {
        let err = Modifier::new(
            "bad",
            "",
            ModifierKind::Fixed,
            ModifierOperation::Add,
            -100,
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PricingError::InvalidModifierConfiguration { .. }
        ));
    }

    #[test]
    fn test_modifier_rejects_zero_divisor() {
        let err = Modifier::new(
            "half",
            "",
            ModifierKind::Percentage,
            ModifierOperation::Divide,
            0,
            0,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid modifier 'half': divisor must be positive"
        );
    }

    #[test]
    fn test_modifier_rejects_fixed_multiply() {
        assert!(Modifier::new(
            "x2",
            "",
            ModifierKind::Fixed,
            ModifierOperation::Multiply,
            2,
            0
        )
        .is_err());
    }

    #[test]
    fn test_modifier_rejects_empty_code() {
        assert!(Modifier::new(
            " ",
            "",
            ModifierKind::Fixed,
            ModifierOperation::Add,
            100,
            0
        )
        .is_err());
    }

    #[test]
    fn test_modifier_json_shape() {
        let json = r#"{"code":"buttons","kind":"FIXED","operation":"ADD","value":2500}"#;
        let m: Modifier = serde_json::from_str(json).unwrap();
        assert_eq!(m.kind, ModifierKind::Fixed);
        assert_eq!(m.operation, ModifierOperation::Add);
        assert_eq!(m.priority, 0);
        assert!(m.name.is_empty());
    }

    #[test]
    fn test_result_equality_ignores_timing() {
        let a = CalculationResult {
            base_price: Money::from_minor(100),
            modifiers_total: Money::zero(),
            applied_modifiers: vec![],
            urgency_percent: 0,
            urgency_amount: Money::zero(),
            discount_eligible: true,
            discount_percent: 0,
            discount_amount: Money::zero(),
            final_price: Money::from_minor(100),
            currency: "UAH".to_string(),
            formula_description: None,
            execution_time_millis: 0,
            audit: vec![],
        };
        let mut b = a.clone();
        b.execution_time_millis = 42;
        assert_eq!(a, b);

        b.final_price = Money::from_minor(101);
        assert_ne!(a, b);
    }

    #[test]
    fn test_context_validation() {
        let valid = PriceContext::for_tier(PriceTier::base(Money::from_minor(1000)));
        assert!(valid.validate().is_ok());

        let negative_base = PriceContext::for_tier(PriceTier::base(Money::from_minor(-5000)));
        assert!(matches!(
            negative_base.validate(),
            Err(PricingError::Validation(_))
        ));

        let mut oversized_discount = valid.clone();
        oversized_discount.discount = Some(DiscountSelection {
            code: "OTHER".to_string(),
            custom_percent: Some(250),
        });
        assert!(oversized_discount.validate().is_err());

        let mut bad_category = valid.clone();
        bad_category.category_code = Some("not a code!".to_string());
        assert!(bad_category.validate().is_err());

        let mut bad_black = valid.clone();
        bad_black.tier.black_price = Some(Money::from_minor(-1));
        assert!(bad_black.validate().is_err());

        let mut bad_urgency = valid;
        bad_urgency.urgency_percent = 10_000;
        assert!(bad_urgency.validate().is_err());
    }
}
