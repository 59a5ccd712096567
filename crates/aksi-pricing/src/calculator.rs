//! # Price Calculator
//!
//! Runs every pricing component for one line item, in a fixed order.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PriceContext                                                           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  1. ColorPriceResolver   tier + colour label      → unit price          │
//! │  2. FormulaEvaluator     unit price + levels      → unit price (opt.)   │
//! │  3. Quantity             unit price × quantity    → basePrice           │
//! │  4. Modifiers            basePrice, fixed × qty   → modifiersTotal      │
//! │  5. Urgency              (base + modifiers) × %   → urgencyAmount       │
//! │  6. Discount policy      (… + urgency) × %        → discountAmount      │
//! │  7. compose              base + mod + urg - disc  → finalPrice          │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  CalculationResult (+ audit trail)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator holds only immutable lookup tables, so one instance can be
//! shared across threads (`Arc<PriceCalculator>`) without locking.
//!
//! Debug events are emitted through `tracing`; the crate never installs a
//! subscriber, so without one they cost nothing.

use std::time::Instant;

use tracing::debug;

use crate::color::{ColorDictionary, ColorPriceResolver};
use crate::composer::compose;
use crate::discount::{DiscountDecision, DiscountPolicy};
use crate::error::{PricingError, PricingResult};
use crate::formula::FormulaEvaluator;
use crate::modifier;
use crate::money::Money;
use crate::request::PriceRequest;
use crate::rules::PricingRules;
use crate::types::{AuditEntry, CalculationResult, FormulaSelection, PriceContext};
use crate::urgency::urgency_amount;
use crate::{CURRENCY, DEFAULT_MAX_LEVEL};

/// The pricing engine entry point.
#[derive(Debug, Clone)]
pub struct PriceCalculator {
    colors: ColorPriceResolver,
    formulas: FormulaEvaluator,
    discounts: DiscountPolicy,
    max_level: u32,
}

impl Default for PriceCalculator {
    fn default() -> Self {
        PriceCalculator {
            colors: ColorPriceResolver::default(),
            formulas: FormulaEvaluator::default(),
            discounts: DiscountPolicy::default(),
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

impl PriceCalculator {
    /// Validates `rules` and builds the lookup tables from them.
    pub fn new(rules: &PricingRules) -> PricingResult<Self> {
        rules.validate()?;
        Ok(PriceCalculator {
            colors: ColorPriceResolver::new(ColorDictionary::new(&rules.colors)),
            formulas: FormulaEvaluator::new(rules.expression.budget()),
            discounts: DiscountPolicy::from_settings(&rules.discounts),
            max_level: rules.max_level,
        })
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn formulas(&self) -> &FormulaEvaluator {
        &self.formulas
    }

    /// Validates a request and calculates it.
    pub fn calculate_request(&self, request: PriceRequest) -> PricingResult<CalculationResult> {
        let ctx = request.into_context()?;
        self.calculate(&ctx)
    }

    /// Calculates the billable amount for one line item.
    ///
    /// ## Example
    /// ```rust
    /// use aksi_pricing::{PriceCalculator, PriceContext, PriceTier, Money};
    ///
    /// let mut ctx = PriceContext::for_tier(PriceTier::base(Money::from_minor(2000)));
    /// ctx.urgency_percent = 50;
    ///
    /// let result = PriceCalculator::default().calculate(&ctx).unwrap();
    /// assert_eq!(result.urgency_amount.minor(), 1000);
    /// assert_eq!(result.final_price.minor(), 3000);
    /// ```
    pub fn calculate(&self, ctx: &PriceContext) -> PricingResult<CalculationResult> {
        let started = Instant::now();
        let mut audit = Vec::new();

        ctx.validate()?;

        // 1. Colour
        let (color_class, mut unit_price) = self
            .colors
            .resolve_classified(&ctx.tier, ctx.color_label.as_deref());
        debug!(?color_class, unit_price = %unit_price, "Colour resolved");
        audit.push(AuditEntry::ColorResolved {
            color_class,
            unit_price,
        });

        // 2. Formula
        let mut formula_description = None;
        if let Some(selection) = &ctx.formula {
            self.check_levels(selection)?;
            let description = selection.formula.describe();
            unit_price = self.formulas.evaluate(
                &selection.formula,
                selection.start_level,
                selection.target_level,
                unit_price,
            )?;
            debug!(formula = %description, unit_price = %unit_price, "Formula evaluated");
            audit.push(AuditEntry::FormulaEvaluated {
                description: description.clone(),
                unit_price,
            });
            formula_description = Some(description);
        }

        // 3. Quantity
        let base_price = unit_price.multiply_quantity(i64::from(ctx.quantity));
        audit.push(AuditEntry::QuantityApplied {
            quantity: ctx.quantity,
            amount: base_price,
        });

        // 4. Modifiers
        let modifiers = modifier::apply_for_quantity(base_price, ctx.quantity, &ctx.modifiers)?;
        debug!(
            count = modifiers.applied.len(),
            total = %modifiers.total,
            "Modifiers applied"
        );
        audit.push(AuditEntry::ModifiersApplied {
            count: u32::try_from(modifiers.applied.len()).unwrap_or(u32::MAX),
            total: modifiers.total,
        });

        // 5. Urgency
        let urgency = urgency_amount(base_price + modifiers.total, ctx.urgency_percent);
        debug!(percent = ctx.urgency_percent, amount = %urgency, "Urgency applied");
        audit.push(AuditEntry::UrgencyApplied {
            percent: ctx.urgency_percent,
            amount: urgency,
        });

        // 6. Discount
        let subtotal = base_price + modifiers.total + urgency;
        let (discount_eligible, discount_percent, discount_amount) = match &ctx.discount {
            Some(selection) => {
                let decision = self.discounts.decide(
                    &selection.code,
                    selection.custom_percent,
                    ctx.category_code.as_deref(),
                    subtotal,
                )?;
                debug!(code = %selection.code, ?decision, "Discount decided");
                match decision {
                    DiscountDecision::Applied { percent, amount } => {
                        audit.push(AuditEntry::DiscountApplied {
                            code: selection.code.clone(),
                            percent,
                            amount,
                        });
                        (true, percent, amount)
                    }
                    DiscountDecision::Skipped(reason) => {
                        audit.push(AuditEntry::DiscountSkipped {
                            code: selection.code.clone(),
                            reason,
                        });
                        (self.is_category_eligible(ctx), 0, Money::zero())
                    }
                }
            }
            None => (self.is_category_eligible(ctx), 0, Money::zero()),
        };

        // 7. Compose
        let final_price = compose(base_price, modifiers.total, urgency, discount_amount);
        debug!(final_price = %final_price, "Price composed");
        audit.push(AuditEntry::Composed { final_price });

        Ok(CalculationResult {
            base_price,
            modifiers_total: modifiers.total,
            applied_modifiers: modifiers.applied,
            urgency_percent: ctx.urgency_percent,
            urgency_amount: urgency,
            discount_eligible,
            discount_percent,
            discount_amount,
            final_price,
            currency: CURRENCY.to_string(),
            formula_description,
            execution_time_millis: u64::try_from(started.elapsed().as_millis())
                .unwrap_or(u64::MAX),
            audit,
        })
    }

    fn is_category_eligible(&self, ctx: &PriceContext) -> bool {
        ctx.category_code
            .as_deref()
            .map_or(true, |category| !self.discounts.eligibility().is_excluded(category))
    }

    /// Neither level may exceed `max_level`. The lower bound and ordering are
    /// checked by the formula evaluator.
    fn check_levels(&self, selection: &FormulaSelection) -> PricingResult<()> {
        if selection.start_level > self.max_level || selection.target_level > self.max_level {
            return Err(PricingError::InvalidRange {
                start_level: selection.start_level,
                target_level: selection.target_level,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
