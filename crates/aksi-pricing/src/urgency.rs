//! # Urgency Policy
//!
//! Expedited service is charged as a percentage of the modified price.
//!
//! | Level        | Surcharge |
//! |--------------|-----------|
//! | `STANDARD`   | 0%        |
//! | `EXPRESS_48H`| +50%      |
//! | `EXPRESS_24H`| +100%     |
//! | `CUSTOM`     | caller's  |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Turnaround selected for an order item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    #[default]
    Standard,
    #[serde(rename = "EXPRESS_48H")]
    Express48h,
    #[serde(rename = "EXPRESS_24H")]
    Express24h,
    Custom { percent: u32 },
}

impl UrgencyLevel {
    /// Surcharge in percent.
    pub const fn percent(&self) -> u32 {
        match self {
            UrgencyLevel::Standard => 0,
            UrgencyLevel::Express48h => 50,
            UrgencyLevel::Express24h => 100,
            UrgencyLevel::Custom { percent } => *percent,
        }
    }
}

/// `round(subtotal × percent / 100)`, where subtotal is base + modifiers.
///
/// ```rust
/// use aksi_pricing::urgency::urgency_amount;
/// use aksi_pricing::Money;
///
/// assert_eq!(urgency_amount(Money::from_minor(2500), 50).minor(), 1250);
/// ```
pub fn urgency_amount(subtotal: Money, percent: u32) -> Money {
    subtotal.percent_of(i64::from(percent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages() {
        assert_eq!(UrgencyLevel::Standard.percent(), 0);
        assert_eq!(UrgencyLevel::Express48h.percent(), 50);
        assert_eq!(UrgencyLevel::Express24h.percent(), 100);
        assert_eq!(UrgencyLevel::Custom { percent: 30 }.percent(), 30);
    }

    #[test]
    fn test_amount_rounds() {
        assert_eq!(urgency_amount(Money::from_minor(1001), 50).minor(), 501);
        assert_eq!(urgency_amount(Money::from_minor(1001), 0).minor(), 0);
        assert_eq!(urgency_amount(Money::from_minor(2000), 100).minor(), 2000);
    }

    #[test]
    fn test_json_shape() {
        let level: UrgencyLevel = serde_json::from_str(r#"{"type":"EXPRESS_24H"}"#).unwrap();
        assert_eq!(level, UrgencyLevel::Express24h);

        let level: UrgencyLevel =
            serde_json::from_str(r#"{"type":"CUSTOM","percent":25}"#).unwrap();
        assert_eq!(level.percent(), 25);
    }
}
