//! # Price Composition
//!
//! The last step of a calculation: a plain sum in a fixed order.
//!
//! ```text
//! final = basePrice + modifiersTotal + urgencyAmount - discountAmount
//! ```
//!
//! Urgency and discount amounts arrive already computed by their policies.
//! Nothing here rounds, scales, or clamps.

use crate::money::Money;

/// Composes the final amount.
///
/// The result is NOT clamped: a discount larger than the subtotal yields a
/// negative amount, and the caller decides what that means for billing.
///
/// ## Example
/// ```rust
/// use aksi_pricing::composer::compose;
/// use aksi_pricing::Money;
///
/// let total = compose(
///     Money::from_minor(2000),
///     Money::from_minor(500),
///     Money::from_minor(1000),
///     Money::from_minor(350),
/// );
/// assert_eq!(total.minor(), 3150);
/// ```
pub fn compose(
    base_price: Money,
    modifiers_total: Money,
    urgency_amount: Money,
    discount_amount: Money,
) -> Money {
    base_price + modifiers_total + urgency_amount - discount_amount
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn m(minor: i64) -> Money {
        Money::from_minor(minor)
    }

    #[test]
    fn test_compose_literal_case() {
        assert_eq!(compose(m(2000), m(500), m(1000), m(350)), m(3150));
    }

    #[test]
    fn test_compose_all_zero() {
        assert_eq!(compose(m(0), m(0), m(0), m(0)), Money::zero());
    }

    #[test]
    fn test_compose_negative_passes_through() {
        assert_eq!(compose(m(0), m(0), m(0), m(100)), m(-100));
        assert_eq!(compose(m(1000), m(-200), m(0), m(900)), m(-100));
    }
}
