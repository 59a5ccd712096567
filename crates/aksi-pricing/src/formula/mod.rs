//! # Calculation Formulas
//!
//! Level/tier-dependent pricing strategies used for service levelling
//! price configurations.
//!
//! ## Variants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Formula        Result                                                  │
//! │  ───────────    ──────────────────────────────────────────────────────  │
//! │  Linear         base + levelDiff × pricePerLevel                        │
//! │  Range          base + Σ price of the tier covering each level step     │
//! │  TimeBased      base + round(hours × hourlyRate)                        │
//! │                 hours = baseHours + levelDiff × hoursPerLevel × cm/100  │
//! │  Expression     sandboxed integer expression over basePrice, levelDiff, │
//! │                 startLevel, targetLevel and author constants            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `CalculationFormula` is a closed enum. Evaluation is an exhaustive
//! `match`, so adding a variant is a compile error until every dispatch
//! site handles it.
//!
//! Every variant must produce a strictly positive price; anything else is
//! reported as [`PricingError::NegativeOrZeroPrice`].

mod expression;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{PricingError, PricingResult};
use crate::money::{round_half_away, Money};

pub use expression::{Deadline, Expression, ExpressionBudget};

// =============================================================================
// Formula Variants
// =============================================================================

/// `base + levelDiff × price_per_level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LinearFormula {
    pub price_per_level: Money,
}

/// An inclusive level bracket with a per-level price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub from: u32,
    pub to: u32,
    pub price: Money,
}

/// Sum of per-level tier prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RangeFormula {
    pub tiers: Vec<PriceRange>,
}

/// Hourly pricing with a complexity multiplier in percent (100 = 1.0×).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TimeBasedFormula {
    pub hourly_rate: Money,
    pub base_hours: u32,
    pub complexity_multiplier: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_hours: Option<u32>,
}

/// An author-supplied arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionFormula {
    pub text: String,
    #[serde(default)]
    pub variables: BTreeMap<String, i64>,
}

/// The closed set of calculation formulas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationFormula {
    Linear(LinearFormula),
    Range(RangeFormula),
    TimeBased(TimeBasedFormula),
    Expression(ExpressionFormula),
}

impl CalculationFormula {
    /// Human-readable summary used as `formulaDescription`.
    ///
    /// ```rust
    /// use aksi_pricing::formula::{CalculationFormula, LinearFormula};
    /// use aksi_pricing::Money;
    ///
    /// let f = CalculationFormula::Linear(LinearFormula { price_per_level: Money::from_minor(500) });
    /// assert_eq!(f.describe(), "Linear(pricePerLevel=500)");
    /// ```
    pub fn describe(&self) -> String {
        match self {
            CalculationFormula::Linear(f) => {
                format!("Linear(pricePerLevel={})", f.price_per_level.minor())
            }
            CalculationFormula::Range(f) => format!("Range({} tiers)", f.tiers.len()),
            CalculationFormula::TimeBased(f) => format!(
                "TimeBased(hourlyRate={}, baseHours={})",
                f.hourly_rate.minor(),
                f.base_hours
            ),
            CalculationFormula::Expression(f) => format!(
                "Expression('{}', {} variables)",
                f.text,
                f.variables.len()
            ),
        }
    }

    /// Checks the formula configuration without evaluating it.
    pub fn validate(&self, budget: &ExpressionBudget) -> PricingResult<()> {
        match self {
            CalculationFormula::Linear(_) => Ok(()),
            CalculationFormula::Range(f) => f.validate(),
            CalculationFormula::TimeBased(_) => Ok(()),
            CalculationFormula::Expression(f) => f.validate(budget),
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Evaluates formulas with a fixed expression budget.
#[derive(Debug, Clone, Default)]
pub struct FormulaEvaluator {
    budget: ExpressionBudget,
}

impl FormulaEvaluator {
    pub fn new(budget: ExpressionBudget) -> Self {
        FormulaEvaluator { budget }
    }

    pub fn budget(&self) -> &ExpressionBudget {
        &self.budget
    }

    /// Computes the price for going from `start_level` to `target_level`.
    ///
    /// ## Errors
    /// - `InvalidRange` unless `target_level >= start_level >= 1`
    /// - `NoMatchingTier` from `Range` formulas
    /// - `FormulaSyntax` / `FormulaTimeout` / `FormulaArithmetic` from `Expression`
    /// - `NegativeOrZeroPrice` when the result is not strictly positive
    ///
    /// ## Example
    /// ```rust
    /// use aksi_pricing::formula::{CalculationFormula, FormulaEvaluator, LinearFormula};
    /// use aksi_pricing::Money;
    ///
    /// let formula = CalculationFormula::Linear(LinearFormula {
    ///     price_per_level: Money::from_minor(500),
    /// });
    /// let price = FormulaEvaluator::default()
    ///     .evaluate(&formula, 1, 10, Money::from_minor(1000))
    ///     .unwrap();
    /// assert_eq!(price.minor(), 5500);
    /// ```
    pub fn evaluate(
        &self,
        formula: &CalculationFormula,
        start_level: u32,
        target_level: u32,
        base_price: Money,
    ) -> PricingResult<Money> {
        if start_level < 1 || target_level < start_level {
            return Err(PricingError::InvalidRange {
                start_level,
                target_level,
            });
        }

        let price = match formula {
            CalculationFormula::Linear(f) => f.evaluate(start_level, target_level, base_price)?,
            CalculationFormula::Range(f) => f.evaluate(start_level, target_level, base_price)?,
            CalculationFormula::TimeBased(f) => {
                f.evaluate(start_level, target_level, base_price)?
            }
            CalculationFormula::Expression(f) => {
                f.evaluate(start_level, target_level, base_price, &self.budget)?
            }
        };

        if !price.is_positive() {
            return Err(PricingError::NegativeOrZeroPrice { price });
        }

        Ok(price)
    }
}

/// Evaluates with the default expression budget.
pub fn evaluate(
    formula: &CalculationFormula,
    start_level: u32,
    target_level: u32,
    base_price: Money,
) -> PricingResult<Money> {
    FormulaEvaluator::default().evaluate(formula, start_level, target_level, base_price)
}

fn level_diff(start_level: u32, target_level: u32) -> i64 {
    i64::from(target_level.saturating_sub(start_level))
}

fn checked_money(value: i128) -> PricingResult<Money> {
    i64::try_from(value)
        .map(Money::from_minor)
        .map_err(|_| PricingError::arithmetic("result does not fit in a price"))
}

// =============================================================================
// Variant Implementations
// =============================================================================

impl LinearFormula {
    fn evaluate(&self, start_level: u32, target_level: u32, base: Money) -> PricingResult<Money> {
        let diff = level_diff(start_level, target_level) as i128;
        checked_money(base.minor() as i128 + diff * self.price_per_level.minor() as i128)
    }
}

impl RangeFormula {
    fn validate(&self) -> PricingResult<()> {
        if self.tiers.is_empty() {
            return Err(PricingError::formula_config(
                "Range formula needs at least one tier",
            ));
        }
        for tier in &self.tiers {
            if tier.from > tier.to {
                return Err(PricingError::formula_config(format!(
                    "tier {}-{} starts after it ends",
                    tier.from, tier.to
                )));
            }
            if tier.price.is_negative() {
                return Err(PricingError::formula_config(format!(
                    "tier {}-{} has a negative price",
                    tier.from, tier.to
                )));
            }
        }

        // Adjacent tiers may share an endpoint, nothing more.
        let mut sorted: Vec<&PriceRange> = self.tiers.iter().collect();
        sorted.sort_by_key(|t| t.from);
        for pair in sorted.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if upper.from < lower.to {
                return Err(PricingError::formula_config(format!(
                    "tiers {}-{} and {}-{} overlap",
                    lower.from, lower.to, upper.from, upper.to
                )));
            }
        }
        Ok(())
    }

    /// Every level step `L` in `start..target` is priced by the first tier
    /// (ascending `from`, stable) that contains it.
    ///
    /// Closed form: a cursor walks the sorted tiers, so the cost is linear
    /// in the number of tiers rather than in the level span.
    fn evaluate(&self, start_level: u32, target_level: u32, base: Money) -> PricingResult<Money> {
        self.validate()?;

        let mut tiers: Vec<&PriceRange> = self.tiers.iter().collect();
        tiers.sort_by_key(|t| t.from);

        let mut total = base.minor() as i128;
        let mut cursor = start_level;

        for tier in tiers {
            if cursor >= target_level {
                break;
            }
            if tier.to < cursor {
                continue;
            }
            if tier.from > cursor {
                return Err(PricingError::NoMatchingTier { level: cursor });
            }
            let last = tier.to.min(target_level - 1);
            let steps = i128::from(last - cursor) + 1;
            total += steps * tier.price.minor() as i128;
            cursor = last.saturating_add(1);
        }

        if cursor < target_level {
            return Err(PricingError::NoMatchingTier { level: cursor });
        }

        checked_money(total)
    }
}

impl TimeBasedFormula {
    /// Hours in hundredths, floored at `minimum_hours`.
    fn hours_x100(&self, start_level: u32, target_level: u32) -> i128 {
        let diff = level_diff(start_level, target_level) as i128;
        let per_level = i128::from(self.hours_per_level.unwrap_or(1));
        let hours = i128::from(self.base_hours) * 100
            + diff * per_level * i128::from(self.complexity_multiplier);
        match self.minimum_hours {
            Some(min) => hours.max(i128::from(min) * 100),
            None => hours,
        }
    }

    fn evaluate(&self, start_level: u32, target_level: u32, base: Money) -> PricingResult<Money> {
        let hours_x100 = self.hours_x100(start_level, target_level);
        let cost = round_half_away(hours_x100 * self.hourly_rate.minor() as i128, 100);
        checked_money(base.minor() as i128 + cost)
    }
}

impl ExpressionFormula {
    /// Parses the text and checks every identifier against the variable set.
    pub fn validate(&self, budget: &ExpressionBudget) -> PricingResult<()> {
        self.compile(budget).map(|_| ())
    }

    fn compile(&self, budget: &ExpressionBudget) -> PricingResult<Expression> {
        if self.text.trim().is_empty() {
            return Err(PricingError::formula_config(
                "Expression is required for an EXPRESSION formula",
            ));
        }
        let expression = Expression::parse(&self.text, budget)?;
        expression.check_identifiers(|name| {
            self.variables.contains_key(name) || expression::BUILTIN_VARIABLES.contains(&name)
        })?;
        Ok(expression)
    }

    fn evaluate(
        &self,
        start_level: u32,
        target_level: u32,
        base: Money,
        budget: &ExpressionBudget,
    ) -> PricingResult<Money> {
        let deadline = budget.start_deadline();
        let expression = self.compile(budget)?;

        let builtins: [(&str, i64); 4] = [
            ("basePrice", base.minor()),
            ("levelDiff", level_diff(start_level, target_level)),
            ("startLevel", i64::from(start_level)),
            ("targetLevel", i64::from(target_level)),
        ];

        let value = expression.evaluate(&deadline, |name| {
            // Author constants shadow built-ins of the same name.
            self.variables.get(name).copied().or_else(|| {
                builtins
                    .iter()
                    .find(|(builtin, _)| *builtin == name)
                    .map(|(_, v)| *v)
            })
        })?;

        Ok(Money::from_minor(value))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn m(minor: i64) -> Money {
        Money::from_minor(minor)
    }

    fn linear(per_level: i64) -> CalculationFormula {
        CalculationFormula::Linear(LinearFormula {
            price_per_level: m(per_level),
        })
    }

    fn range(tiers: &[(u32, u32, i64)]) -> CalculationFormula {
        CalculationFormula::Range(RangeFormula {
            tiers: tiers
                .iter()
                .map(|&(from, to, price)| PriceRange {
                    from,
                    to,
                    price: m(price),
                })
                .collect(),
        })
    }

    fn time_based(rate: i64, base_hours: u32, cm: u32) -> CalculationFormula {
        CalculationFormula::TimeBased(TimeBasedFormula {
            hourly_rate: m(rate),
            base_hours,
            complexity_multiplier: cm,
            hours_per_level: None,
            minimum_hours: None,
        })
    }

    fn expr(text: &str, vars: &[(&str, i64)]) -> CalculationFormula {
        CalculationFormula::Expression(ExpressionFormula {
            text: text.to_string(),
            variables: vars.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        })
    }

    // -------------------------------------------------------------------------
    // Range preconditions
    // -------------------------------------------------------------------------

    #[test]
    fn test_invalid_range_is_rejected() {
        let err = evaluate(&linear(100), 30, 25, m(1000)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid level range: from=30, to=25");

        assert!(matches!(
            evaluate(&linear(100), 0, 5, m(1000)),
            Err(PricingError::InvalidRange { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // Linear
    // -------------------------------------------------------------------------

    #[test]
    fn test_linear() {
        assert_eq!(evaluate(&linear(500), 1, 10, m(1000)).unwrap(), m(5500));
        assert_eq!(evaluate(&linear(500), 7, 7, m(1000)).unwrap(), m(1000));
    }

    #[test]
    fn test_linear_monotonic_in_target_level() {
        let f = linear(250);
        let mut previous = Money::zero();
        for target in 1..=50 {
            let price = evaluate(&f, 1, target, m(100)).unwrap();
            assert!(price >= previous);
            previous = price;
        }
    }

    #[test]
    fn test_linear_zero_result_is_rejected() {
        let err = evaluate(&linear(0), 1, 10, Money::zero()).unwrap_err();
        assert_eq!(err, PricingError::NegativeOrZeroPrice { price: m(0) });
    }

    // -------------------------------------------------------------------------
    // Range
    // -------------------------------------------------------------------------

    #[test]
    fn test_range_sums_per_level() {
        // Steps 1,2,3,4 at 400; steps 5..9 at 500
        let f = range(&[(1, 4, 400), (5, 9, 500)]);
        assert_eq!(evaluate(&f, 1, 10, m(0)).unwrap(), m(4 * 400 + 5 * 500));
        // Steps 3,4 at 400; 5,6 at 500
        assert_eq!(evaluate(&f, 3, 7, m(1000)).unwrap(), m(1000 + 800 + 1000));
    }

    #[test]
    fn test_range_sorts_tiers_and_first_match_wins() {
        // Unsorted input sharing level 5
        let f = range(&[(5, 10, 500), (1, 5, 400)]);
        // Steps 1..=5 priced by (1,5), steps 6..=9 by (5,10)
        assert_eq!(evaluate(&f, 1, 10, m(0)).unwrap(), m(5 * 400 + 4 * 500));
    }

    #[test]
    fn test_range_gap_is_no_matching_tier() {
        let f = range(&[(1, 4, 400), (8, 12, 500)]);
        assert_eq!(
            evaluate(&f, 1, 10, m(100)).unwrap_err(),
            PricingError::NoMatchingTier { level: 5 }
        );
        // Past the last tier
        assert_eq!(
            evaluate(&f, 10, 20, m(100)).unwrap_err(),
            PricingError::NoMatchingTier { level: 13 }
        );
        // Before the first tier
        let f = range(&[(3, 10, 100)]);
        assert_eq!(
            evaluate(&f, 1, 5, m(100)).unwrap_err(),
            PricingError::NoMatchingTier { level: 1 }
        );
    }

    #[test]
    fn test_range_large_span_is_closed_form() {
        let f = range(&[(1, 1_000_000, 1)]);
        assert_eq!(evaluate(&f, 1, 1_000_001, m(0)).unwrap(), m(1_000_000));
    }

    #[test]
    fn test_range_configuration_errors() {
        assert!(matches!(
            evaluate(&range(&[]), 1, 2, m(100)),
            Err(PricingError::InvalidFormulaConfiguration { .. })
        ));
        assert!(matches!(
            evaluate(&range(&[(5, 1, 100)]), 1, 2, m(100)),
            Err(PricingError::InvalidFormulaConfiguration { .. })
        ));
        assert!(matches!(
            evaluate(&range(&[(1, 5, -100)]), 1, 2, m(100)),
            Err(PricingError::InvalidFormulaConfiguration { .. })
        ));
    }

    #[test]
    fn test_range_rejects_interior_overlap() {
        let budget = ExpressionBudget::default();
        let overlapping = range(&[(5, 15, 600), (1, 10, 400)]);
        assert!(matches!(
            overlapping.validate(&budget),
            Err(PricingError::InvalidFormulaConfiguration { .. })
        ));
        assert!(matches!(
            evaluate(&overlapping, 1, 3, m(100)),
            Err(PricingError::InvalidFormulaConfiguration { .. })
        ));

        assert!(range(&[(1, 5, 400), (5, 10, 600)]).validate(&budget).is_ok());
    }

    // -------------------------------------------------------------------------
    // Time based
    // -------------------------------------------------------------------------

    #[test]
    fn test_time_based() {
        // hours = 2 + 3 × 150/100 = 6.5; 6.5 × 3000 = 19500
        let f = time_based(3000, 2, 150);
        assert_eq!(evaluate(&f, 1, 4, m(500)).unwrap(), m(500 + 19500));
    }

    #[test]
    fn test_time_based_rounds_half_away() {
        // hours = 0 + 1 × 5/100 = 0.05; 0.05 × 1010 = 50.5 → 51
        let f = time_based(1010, 0, 5);
        assert_eq!(evaluate(&f, 1, 2, m(0)).unwrap(), m(51));
    }

    #[test]
    fn test_time_based_hours_per_level_and_minimum() {
        // 3 levels × 8 h × 1.2 = 28.8 h at 2500
        let f = CalculationFormula::TimeBased(TimeBasedFormula {
            hourly_rate: m(2500),
            base_hours: 0,
            complexity_multiplier: 120,
            hours_per_level: Some(8),
            minimum_hours: None,
        });
        assert_eq!(evaluate(&f, 1, 4, m(0)).unwrap(), m(72000));

        let f = CalculationFormula::TimeBased(TimeBasedFormula {
            hourly_rate: m(1000),
            base_hours: 0,
            complexity_multiplier: 100,
            hours_per_level: None,
            minimum_hours: Some(4),
        });
        // 1 level = 1 h, floored to 4 h
        assert_eq!(evaluate(&f, 1, 2, m(0)).unwrap(), m(4000));
    }

    #[test]
    fn test_time_based_monotonic_in_target_level() {
        let f = time_based(1999, 1, 137);
        let mut previous = Money::zero();
        for target in 1..=40 {
            let price = evaluate(&f, 1, target, m(10)).unwrap();
            assert!(price >= previous);
            previous = price;
        }
    }

    // -------------------------------------------------------------------------
    // Expression
    // -------------------------------------------------------------------------

    #[test]
    fn test_expression_with_variables() {
        let f = expr("basePrice + perPointValue", &[("perPointValue", 800)]);
        assert_eq!(evaluate(&f, 1, 5, m(1500)).unwrap(), m(2300));
    }

    #[test]
    fn test_expression_builtins() {
        let f = expr("basePrice * 2 + levelDiff * 100", &[]);
        assert_eq!(evaluate(&f, 1, 10, m(1000)).unwrap(), m(2900));

        let f = expr("startLevel * 1000 + targetLevel", &[]);
        assert_eq!(evaluate(&f, 3, 8, m(1)).unwrap(), m(3008));
    }

    #[test]
    fn test_expression_author_constant_shadows_builtin() {
        let f = expr("basePrice + levelDiff", &[("levelDiff", 25)]);
        assert_eq!(evaluate(&f, 1, 100, m(2000)).unwrap(), m(2025));
    }

    #[test]
    fn test_expression_unknown_identifier() {
        let f = expr("basePrice + missingVar", &[]);
        assert!(matches!(
            evaluate(&f, 1, 5, m(1500)),
            Err(PricingError::FormulaSyntax { .. })
        ));
    }

    #[test]
    fn test_expression_negative_result() {
        let f = expr("basePrice - 2000", &[]);
        assert_eq!(
            evaluate(&f, 1, 3, m(1500)).unwrap_err(),
            PricingError::NegativeOrZeroPrice { price: m(-500) }
        );
    }

    #[test]
    fn test_expression_empty_text() {
        let f = expr("   ", &[]);
        assert!(matches!(
            evaluate(&f, 1, 5, m(1200)),
            Err(PricingError::InvalidFormulaConfiguration { .. })
        ));
    }

    #[test]
    fn test_expression_timeout() {
        let evaluator = FormulaEvaluator::new(ExpressionBudget {
            timeout: Duration::ZERO,
            ..ExpressionBudget::default()
        });
        let f = expr("basePrice + 1", &[]);
        assert!(matches!(
            evaluator.evaluate(&f, 1, 2, m(100)),
            Err(PricingError::FormulaTimeout { .. })
        ));
    }

    #[test]
    fn test_expression_step_budget() {
        let evaluator = FormulaEvaluator::new(ExpressionBudget {
            max_steps: 3,
            ..ExpressionBudget::default()
        });
        let f = expr("1 + 2 + 3 + 4 + 5", &[]);
        assert!(matches!(
            evaluator.evaluate(&f, 1, 2, m(100)),
            Err(PricingError::FormulaTimeout { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // Description & validation
    // -------------------------------------------------------------------------

    #[test]
    fn test_describe() {
        assert_eq!(linear(500).describe(), "Linear(pricePerLevel=500)");
        assert_eq!(range(&[(1, 5, 1), (6, 9, 2)]).describe(), "Range(2 tiers)");
        assert_eq!(
            time_based(2500, 2, 100).describe(),
            "TimeBased(hourlyRate=2500, baseHours=2)"
        );
        assert_eq!(
            expr("basePrice + bonus", &[("bonus", 1)]).describe(),
            "Expression('basePrice + bonus', 1 variables)"
        );
    }

    #[test]
    fn test_validate() {
        let budget = ExpressionBudget::default();
        assert!(linear(1).validate(&budget).is_ok());
        assert!(expr("basePrice + 100", &[]).validate(&budget).is_ok());
        assert!(expr("basePrice +", &[]).validate(&budget).is_err());
        assert!(expr("", &[]).validate(&budget).is_err());
        assert!(range(&[]).validate(&budget).is_err());
    }

    #[test]
    fn test_formula_json_shape() {
        let json = r#"{"type":"TIME_BASED","hourlyRate":2500,"baseHours":1,"complexityMultiplier":200}"#;
        let f: CalculationFormula = serde_json::from_str(json).unwrap();
        assert_eq!(f, time_based(2500, 1, 200));

        let json = r#"{"type":"RANGE","tiers":[{"from":1,"to":5,"price":400}]}"#;
        let f: CalculationFormula = serde_json::from_str(json).unwrap();
        assert_eq!(f, range(&[(1, 5, 400)]));

        let json = r#"{"type":"EXPRESSION","text":"basePrice + 1"}"#;
        let f: CalculationFormula = serde_json::from_str(json).unwrap();
        assert_eq!(f, expr("basePrice + 1", &[]));
    }
}
