//! # Rule Configuration
//!
//! Loads the [`PricingRules`] the calculator is built from.
//!
//! ## Load Order (later overrides earlier)
//! 1. Defaults compiled into `aksi-pricing`
//! 2. Rule file: `--config <path>`, or the platform config dir
//!    - `~/.config/aksi-pricing/pricing.toml` (Linux)
//!    - `~/Library/Application Support/ua.aksi.pricing/pricing.toml` (macOS)
//! 3. Environment variables
//!    - `AKSI_EXCLUDED_CATEGORIES`: comma list replacing the deny-list
//!    - `AKSI_EXPRESSION_TIMEOUT_MS`: expression time budget
//!    - `AKSI_MAX_LEVEL`: highest formula level
//!
//! The result is validated once; nothing re-reads it afterwards.

use std::path::{Path, PathBuf};

use aksi_pricing::PricingRules;
use tracing::{debug, info};

use crate::error::ConfigError;

pub const ENV_EXCLUDED_CATEGORIES: &str = "AKSI_EXCLUDED_CATEGORIES";
pub const ENV_EXPRESSION_TIMEOUT_MS: &str = "AKSI_EXPRESSION_TIMEOUT_MS";
pub const ENV_MAX_LEVEL: &str = "AKSI_MAX_LEVEL";

/// Loads, overrides and validates the pricing rules.
pub fn load(config_path: Option<PathBuf>) -> Result<PricingRules, ConfigError> {
    let mut rules = PricingRules::default();

    if let Some(path) = config_path.or_else(default_config_path) {
        if path.exists() {
            info!(?path, "Loading pricing rules from file");
            rules = read_rules(&path)?;
        } else {
            debug!(?path, "Rule file not found, using defaults");
        }
    }

    apply_env_overrides(&mut rules, |key| std::env::var(key).ok())?;

    rules.validate()?;
    Ok(rules)
}

fn read_rules(path: &Path) -> Result<PricingRules, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Applies `AKSI_*` overrides read through `var`.
pub fn apply_env_overrides(
    rules: &mut PricingRules,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(list) = var(ENV_EXCLUDED_CATEGORIES) {
        let categories: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        debug!(?categories, "Overriding excluded categories from environment");
        rules.discounts.excluded_categories = categories;
    }

    if let Some(value) = var(ENV_EXPRESSION_TIMEOUT_MS) {
        rules.expression.timeout_ms = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(ENV_EXPRESSION_TIMEOUT_MS.to_string()))?;
        debug!(timeout_ms = rules.expression.timeout_ms, "Overriding expression timeout");
    }

    if let Some(value) = var(ENV_MAX_LEVEL) {
        rules.max_level = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(ENV_MAX_LEVEL.to_string()))?;
        debug!(max_level = rules.max_level, "Overriding max level");
    }

    Ok(())
}

/// `pricing.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("ua", "aksi", "pricing")
        .map(|dirs| dirs.config_dir().join("pricing.toml"))
}

/// Renders rules as TOML, e.g. to seed a rule file.
pub fn render(rules: &PricingRules) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(rules)?)
}

// =============================================================================
// Unit Tests
// =============================================================================
