//! # Colour Price Resolution
//!
//! Picks the unit price of an item from its base/black/colour tiers.
//!
//! ## Resolution Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Label (normalized)      Class          Price used                      │
//! │  ───────────────────     ───────────    ──────────────────────────────  │
//! │  none / blank            -              base                            │
//! │  "чорний", "black", …    Black          black → colour → base           │
//! │  "білий", "natural", …   NaturalWhite   base                            │
//! │  anything else           Other          colour → base                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution is a total function: a missing optional tier always degrades
//! to the base price, never to an error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::PriceTier;

/// The family a colour label falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorClass {
    /// No label was given.
    Unspecified,
    Black,
    NaturalWhite,
    Other,
}

// =============================================================================
// Colour Dictionary
// =============================================================================

/// Synonym lists used to classify colour labels.
///
/// Loaded once from configuration; the defaults cover Ukrainian, Russian
/// and English spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSynonyms {
    pub black: Vec<String>,
    pub natural_white: Vec<String>,
}

impl Default for ColorSynonyms {
    fn default() -> Self {
        let black = [
            "black", "чорний", "чорна", "чорне", "чорні", "черный", "черная", "черное",
            "черные",
        ];
        let natural_white = [
            "white",
            "natural",
            "білий",
            "біла",
            "біле",
            "білі",
            "натуральний",
            "натуральна",
            "натуральне",
            "белый",
            "белая",
            "белое",
            "натуральный",
            "натуральная",
        ];
        ColorSynonyms {
            black: black.iter().map(|s| s.to_string()).collect(),
            natural_white: natural_white.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Immutable lookup table built from [`ColorSynonyms`].
#[derive(Debug, Clone)]
pub struct ColorDictionary {
    black: HashSet<String>,
    natural_white: HashSet<String>,
}

impl ColorDictionary {
    pub fn new(synonyms: &ColorSynonyms) -> Self {
        ColorDictionary {
            black: synonyms.black.iter().map(|s| normalize(s)).collect(),
            natural_white: synonyms.natural_white.iter().map(|s| normalize(s)).collect(),
        }
    }

    /// Classifies a label: trims it and compares case-insensitively.
    pub fn classify(&self, label: Option<&str>) -> ColorClass {
        let label = match label.map(normalize) {
            Some(l) if !l.is_empty() => l,
            _ => return ColorClass::Unspecified,
        };

        if self.black.contains(&label) {
            ColorClass::Black
        } else if self.natural_white.contains(&label) {
            ColorClass::NaturalWhite
        } else {
            ColorClass::Other
        }
    }
}

impl Default for ColorDictionary {
    fn default() -> Self {
        ColorDictionary::new(&ColorSynonyms::default())
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the unit price for a colour label.
#[derive(Debug, Clone, Default)]
pub struct ColorPriceResolver {
    dictionary: ColorDictionary,
}

impl ColorPriceResolver {
    pub fn new(dictionary: ColorDictionary) -> Self {
        ColorPriceResolver { dictionary }
    }

    /// Returns the unit price for `color_label`.
    ///
    /// ## Example
    /// ```rust
    /// use aksi_pricing::color::ColorPriceResolver;
    /// use aksi_pricing::{Money, PriceTier};
    ///
    /// let tier = PriceTier {
    ///     base_price: Money::from_minor(10000),
    ///     black_price: Some(Money::from_minor(12000)),
    ///     color_price: Some(Money::from_minor(11000)),
    /// };
    /// let resolver = ColorPriceResolver::default();
    ///
    /// assert_eq!(resolver.resolve(&tier, Some("чорний")).minor(), 12000);
    /// assert_eq!(resolver.resolve(&tier, Some("red")).minor(), 11000);
    /// assert_eq!(resolver.resolve(&tier, Some("white")).minor(), 10000);
    /// assert_eq!(resolver.resolve(&tier, None).minor(), 10000);
    /// ```
    pub fn resolve(&self, tier: &PriceTier, color_label: Option<&str>) -> Money {
        self.resolve_classified(tier, color_label).1
    }

    /// Same as [`resolve`](Self::resolve), also returning the colour class.
    pub fn resolve_classified(
        &self,
        tier: &PriceTier,
        color_label: Option<&str>,
    ) -> (ColorClass, Money) {
        let class = self.dictionary.classify(color_label);
        let price = match class {
            ColorClass::Black => tier
                .black_price
                .or(tier.color_price)
                .unwrap_or(tier.base_price),
            ColorClass::Other => tier.color_price.unwrap_or(tier.base_price),
            ColorClass::NaturalWhite | ColorClass::Unspecified => tier.base_price,
        };
        (class, price)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn full_tier() -> PriceTier {
        PriceTier {
            base_price: Money::from_minor(10000),
            black_price: Some(Money::from_minor(12000)),
            color_price: Some(Money::from_minor(11000)),
        }
    }

    #[test]
    fn test_resolve_examples() {
        let resolver = ColorPriceResolver::default();
        let tier = full_tier();

        assert_eq!(resolver.resolve(&tier, Some("чорний")).minor(), 12000);
        assert_eq!(resolver.resolve(&tier, Some("red")).minor(), 11000);
        assert_eq!(resolver.resolve(&tier, Some("white")).minor(), 10000);
    }

    #[test]
    fn test_missing_or_blank_label_is_base() {
        let resolver = ColorPriceResolver::default();
        let tier = full_tier();

        assert_eq!(resolver.resolve(&tier, None), tier.base_price);
        assert_eq!(resolver.resolve(&tier, Some("")), tier.base_price);
        assert_eq!(resolver.resolve(&tier, Some("   ")), tier.base_price);
    }

    #[test]
    fn test_label_normalization() {
        let resolver = ColorPriceResolver::default();
        let tier = full_tier();

        assert_eq!(resolver.resolve(&tier, Some("  BLACK ")).minor(), 12000);
        assert_eq!(resolver.resolve(&tier, Some("Чорна")).minor(), 12000);
        assert_eq!(resolver.resolve(&tier, Some("Натуральний")).minor(), 10000);
    }

    #[test]
    fn test_black_falls_back_to_color_then_base() {
        let resolver = ColorPriceResolver::default();

        let color_only = PriceTier {
            black_price: None,
            ..full_tier()
        };
        assert_eq!(resolver.resolve(&color_only, Some("black")).minor(), 11000);

        let base_only = PriceTier::base(Money::from_minor(10000));
        assert_eq!(resolver.resolve(&base_only, Some("black")).minor(), 10000);
    }

    #[test]
    fn test_other_color_with_only_black_price_uses_base() {
        let resolver = ColorPriceResolver::default();
        let black_only = PriceTier {
            base_price: Money::from_minor(10000),
            black_price: Some(Money::from_minor(12000)),
            color_price: None,
        };
        assert_eq!(resolver.resolve(&black_only, Some("green")).minor(), 10000);
    }

    #[test]
    fn test_classification() {
        let dict = ColorDictionary::default();
        assert_eq!(dict.classify(None), ColorClass::Unspecified);
        assert_eq!(dict.classify(Some("черный")), ColorClass::Black);
        assert_eq!(dict.classify(Some("біла")), ColorClass::NaturalWhite);
        assert_eq!(dict.classify(Some("бордовий")), ColorClass::Other);
    }

    #[test]
    fn test_custom_dictionary() {
        let synonyms = ColorSynonyms {
            black: vec!["Noir".to_string()],
            natural_white: vec!["Blanc".to_string()],
        };
        let resolver = ColorPriceResolver::new(ColorDictionary::new(&synonyms));
        let tier = full_tier();

        assert_eq!(resolver.resolve(&tier, Some("noir")).minor(), 12000);
        // "black" is no longer a black synonym
        assert_eq!(resolver.resolve(&tier, Some("black")).minor(), 11000);
        assert_eq!(resolver.resolve(&tier, Some("BLANC")).minor(), 10000);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = ColorPriceResolver::default();
        let tier = full_tier();
        for label in [None, Some("black"), Some("red"), Some("white"), Some("")] {
            assert_eq!(resolver.resolve(&tier, label), resolver.resolve(&tier, label));
        }
    }
}
