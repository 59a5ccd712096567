//! Error types for the preview binary.

use std::path::PathBuf;

use aksi_pricing::PricingError;

/// Rule file and environment problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid pricing rules: {0}")]
    InvalidRules(#[from] PricingError),

    #[error("Failed to render rules: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Command-line usage problems.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("Missing value for {0}")]
    MissingValue(&'static str),

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}
