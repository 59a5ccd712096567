//! # Discount Policy
//!
//! Decides whether a discount applies to a line item and how much it is.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  discount code ──► DiscountCatalog ──► percent (or UnknownDiscountCode) │
//! │                                            │                            │
//! │  category ──────► DiscountEligibility ─────┤                            │
//! │                   (deny-list)              ▼                            │
//! │                                    excluded?  ──yes──► Skipped          │
//! │                                    percent=0? ──yes──► Skipped          │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                     Applied { round(subtotal × percent / 100) }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both tables are built once from [`DiscountSettings`] and never change
//! afterwards.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{PricingError, PricingResult, ValidationError};
use crate::money::Money;

/// Catalog code whose percent is supplied by the caller.
pub const CUSTOM_DISCOUNT_CODE: &str = "OTHER";

/// Alias accepted for [`CUSTOM_DISCOUNT_CODE`].
pub const CUSTOM_DISCOUNT_ALIAS: &str = "CUSTOM";

// =============================================================================
// Settings
// =============================================================================

/// Discount configuration as loaded from the rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountSettings {
    /// Service categories that never receive a discount.
    pub excluded_categories: Vec<String>,
    /// Discount code → percent. `OTHER` is listed with 0 and takes the
    /// caller's percent instead.
    pub catalog: BTreeMap<String, u32>,
}

impl Default for DiscountSettings {
    fn default() -> Self {
        let catalog = [
            ("NONE", 0),
            ("EVERCARD", 10),
            ("SOCIAL_MEDIA", 5),
            ("MILITARY", 10),
            (CUSTOM_DISCOUNT_CODE, 0),
        ];
        DiscountSettings {
            excluded_categories: vec![
                "LAUNDRY".to_string(),
                "IRONING".to_string(),
                "TEXTILE_DYEING".to_string(),
            ],
            catalog: catalog
                .iter()
                .map(|(code, percent)| (code.to_string(), *percent))
                .collect(),
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

// =============================================================================
// Eligibility
// =============================================================================

/// Category-level deny-list for discounts.
#[derive(Debug, Clone)]
pub struct DiscountEligibility {
    excluded: HashSet<String>,
}

impl DiscountEligibility {
    pub fn new<I, S>(excluded_categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        DiscountEligibility {
            excluded: excluded_categories
                .into_iter()
                .map(|c| normalize_code(c.as_ref()))
                .collect(),
        }
    }

    /// Returns whether `discount_code` may apply to `category_code`.
    ///
    /// An excluded category is never discounted, whatever the code.
    ///
    /// ```rust
    /// use aksi_pricing::discount::DiscountEligibility;
    ///
    /// let eligibility = DiscountEligibility::new(["LAUNDRY", "IRONING"]);
    /// assert!(!eligibility.is_applicable("EVERCARD", "laundry"));
    /// assert!(eligibility.is_applicable("EVERCARD", "CLOTHING"));
    /// ```
    pub fn is_applicable(&self, _discount_code: &str, category_code: &str) -> bool {
        !self.is_excluded(category_code)
    }

    pub fn is_excluded(&self, category_code: &str) -> bool {
        self.excluded.contains(&normalize_code(category_code))
    }

    /// Excluded categories in sorted order.
    pub fn excluded_categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.excluded.iter().map(String::as_str).collect();
        categories.sort_unstable();
        categories
    }
}

impl Default for DiscountEligibility {
    fn default() -> Self {
        DiscountEligibility::new(DiscountSettings::default().excluded_categories)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Known discount codes and their percentages.
#[derive(Debug, Clone)]
pub struct DiscountCatalog {
    percents: BTreeMap<String, u32>,
}

impl DiscountCatalog {
    pub fn new(catalog: &BTreeMap<String, u32>) -> Self {
        DiscountCatalog {
            percents: catalog
                .iter()
                .map(|(code, percent)| (normalize_code(code), *percent))
                .collect(),
        }
    }

    /// Resolves a code (case-insensitive) to its percent.
    ///
    /// `OTHER`/`CUSTOM` return `custom_percent`, which is then required.
    pub fn percent_for(&self, code: &str, custom_percent: Option<u32>) -> PricingResult<u32> {
        let code = normalize_code(code);
        if code == CUSTOM_DISCOUNT_CODE || code == CUSTOM_DISCOUNT_ALIAS {
            return custom_percent.ok_or_else(|| {
                ValidationError::Required {
                    field: "discountPercent".to_string(),
                }
                .into()
            });
        }
        self.percents
            .get(&code)
            .copied()
            .ok_or(PricingError::UnknownDiscountCode(code))
    }
}

impl Default for DiscountCatalog {
    fn default() -> Self {
        DiscountCatalog::new(&DiscountSettings::default().catalog)
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Why a requested discount was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountSkipReason {
    /// The item's category is on the deny-list.
    CategoryExcluded,
    /// The code resolved to 0%.
    ZeroPercent,
}

/// Outcome of a discount decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountDecision {
    Applied { percent: u32, amount: Money },
    Skipped(DiscountSkipReason),
}

impl DiscountDecision {
    pub fn amount(&self) -> Money {
        match self {
            DiscountDecision::Applied { amount, .. } => *amount,
            DiscountDecision::Skipped(_) => Money::zero(),
        }
    }
}

/// Eligibility and catalog combined.
#[derive(Debug, Clone, Default)]
pub struct DiscountPolicy {
    eligibility: DiscountEligibility,
    catalog: DiscountCatalog,
}

impl DiscountPolicy {
    pub fn new(eligibility: DiscountEligibility, catalog: DiscountCatalog) -> Self {
        DiscountPolicy {
            eligibility,
            catalog,
        }
    }

    pub fn from_settings(settings: &DiscountSettings) -> Self {
        DiscountPolicy::new(
            DiscountEligibility::new(&settings.excluded_categories),
            DiscountCatalog::new(&settings.catalog),
        )
    }

    pub fn eligibility(&self) -> &DiscountEligibility {
        &self.eligibility
    }

    /// Decides the discount on `subtotal` (base + modifiers + urgency).
    ///
    /// The code is resolved first, so an unknown code fails even for an
    /// excluded category.
    pub fn decide(
        &self,
        code: &str,
        custom_percent: Option<u32>,
        category_code: Option<&str>,
        subtotal: Money,
    ) -> PricingResult<DiscountDecision> {
        let percent = self.catalog.percent_for(code, custom_percent)?;

        if let Some(category) = category_code {
            if !self.eligibility.is_applicable(code, category) {
                return Ok(DiscountDecision::Skipped(
                    DiscountSkipReason::CategoryExcluded,
                ));
            }
        }

        if percent == 0 {
            return Ok(DiscountDecision::Skipped(DiscountSkipReason::ZeroPercent));
        }

        Ok(DiscountDecision::Applied {
            percent,
            amount: subtotal.percent_of(i64::from(percent)),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
