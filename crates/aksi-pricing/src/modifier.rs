//! # Modifier Application
//!
//! Applies an ordered list of modifiers to a running price.
//!
//! ## Step Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kind / operation          delta against the CURRENT running price      │
//! │  ─────────────────────     ───────────────────────────────────────────  │
//! │  FIXED / ADD               +value × quantity                            │
//! │  FIXED / SUBTRACT          -value × quantity                            │
//! │  PERCENTAGE / ADD          +round(current × value / 100)                │
//! │  PERCENTAGE / MULTIPLY     +round(current × value / 100)                │
//! │  PERCENTAGE / SUBTRACT     -round(current × value / 100)                │
//! │  PERCENTAGE / DIVIDE       -round(current × 100 / max(1, value))        │
//! │  FIXED / MULTIPLY|DIVIDE   InvalidModifierConfiguration                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Modifiers run in ascending priority; equal priorities keep input order.
//! Application is NOT commutative: a percentage step sees every step before
//! it.
//!
//! The running price starts at the line's base price (unit price already
//! multiplied by quantity), so percentage steps cover the whole line. Fixed
//! amounts are per unit and are multiplied by the quantity.
//!
//! A step that would take the running price below zero is clamped to zero
//! and flagged with [`ModifierWarning::ClampedToZero`].

use crate::error::PricingResult;
use crate::money::Money;
use crate::types::{AppliedModifier, Modifier, ModifierKind, ModifierOperation, ModifierWarning};

/// Result of applying a modifier list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierOutcome {
    /// Sum of every step's delta.
    pub total: Money,
    /// One record per modifier, in application order.
    pub applied: Vec<AppliedModifier>,
}

impl ModifierOutcome {
    /// Running price after the last step.
    pub fn price_after(&self, base_price: Money) -> Money {
        self.applied
            .last()
            .map(|step| step.price_after)
            .unwrap_or(base_price)
    }
}

/// Applies `modifiers` to the base price of a single unit.
pub fn apply(base_price: Money, modifiers: &[Modifier]) -> PricingResult<ModifierOutcome> {
    apply_for_quantity(base_price, 1, modifiers)
}

/// Applies `modifiers` to the base price of a line of `quantity` units.
///
/// Every modifier is validated before any step runs, so a malformed list
/// never produces a partial breakdown.
///
/// ## Example
/// ```rust
/// use aksi_pricing::modifier::apply_for_quantity;
/// use aksi_pricing::{Modifier, ModifierKind, ModifierOperation, Money};
///
/// let silk = Modifier::new("silk", "Silk", ModifierKind::Percentage, ModifierOperation::Multiply, 50, 1).unwrap();
/// let buttons = Modifier::new("buttons", "Buttons", ModifierKind::Fixed, ModifierOperation::Add, 500, 2).unwrap();
///
/// // Two units at 10.00 UAH each
/// let outcome = apply_for_quantity(Money::from_minor(2000), 2, &[buttons, silk]).unwrap();
/// // silk first (priority 1): +1000, then buttons: 2 × 500
/// assert_eq!(outcome.total.minor(), 2000);
/// assert_eq!(outcome.applied[0].code, "silk");
/// ```
pub fn apply_for_quantity(
    base_price: Money,
    quantity: u32,
    modifiers: &[Modifier],
) -> PricingResult<ModifierOutcome> {
    for modifier in modifiers {
        modifier.validate()?;
    }

    let mut ordered: Vec<&Modifier> = modifiers.iter().collect();
    ordered.sort_by_key(|m| m.priority);

    let mut current = base_price;
    let mut total = Money::zero();
    let mut applied = Vec::with_capacity(ordered.len());

    for modifier in ordered {
        let requested = step_delta(modifier, current, quantity);

        let (delta, warning) = if (current + requested).is_negative() {
            (
                -current,
                Some(ModifierWarning::ClampedToZero {
                    requested_delta: requested,
                }),
            )
        } else {
            (requested, None)
        };

        current += delta;
        total += delta;

        applied.push(AppliedModifier {
            code: modifier.code.clone(),
            name: modifier.name.clone(),
            kind: modifier.kind,
            operation: modifier.operation,
            value: modifier.value,
            delta,
            price_after: current,
            warning,
        });
    }

    Ok(ModifierOutcome { total, applied })
}

/// Delta of one validated modifier against the running price.
fn step_delta(modifier: &Modifier, current: Money, quantity: u32) -> Money {
    let value = modifier.value;
    let per_line = Money::from_minor(value).multiply_quantity(i64::from(quantity));
    match (modifier.kind, modifier.operation) {
        (ModifierKind::Fixed, ModifierOperation::Add) => per_line,
        (ModifierKind::Fixed, ModifierOperation::Subtract) => -per_line,
        (ModifierKind::Percentage, ModifierOperation::Add | ModifierOperation::Multiply) => {
            current.percent_of(value)
        }
        (ModifierKind::Percentage, ModifierOperation::Subtract) => -current.percent_of(value),
        (ModifierKind::Percentage, ModifierOperation::Divide) => {
            -current.mul_div_round(100, value.max(1))
        }
        // Rejected by Modifier::validate
        (ModifierKind::Fixed, ModifierOperation::Multiply | ModifierOperation::Divide) => {
            Money::zero()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
