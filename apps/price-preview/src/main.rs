//! # Aksi Price Preview
//!
//! Calculates one price request for catalog and pricing administration.
//!
//! ## Usage
//! ```text
//! price-preview [--config <pricing.toml>] [request.json | -]
//! price-preview [--config <pricing.toml>] --print-rules
//! ```
//!
//! The request is read from the file argument, or from stdin when it is
//! missing or `-`. The `CalculationResult` is written to stdout as JSON.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging, to stderr)
//! 2. Load pricing rules (defaults → file → env)
//! 3. Build the calculator
//! 4. Read, calculate, print

mod config;
mod error;

use std::io::Read;
use std::path::PathBuf;

use aksi_pricing::{PriceCalculator, PriceRequest};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::UsageError;

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    request: Option<PathBuf>,
    print_rules: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, UsageError> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().ok_or(UsageError::MissingValue("--config"))?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--print-rules" => parsed.print_rules = true,
                "-" => parsed.request = None,
                other if other.starts_with('-') => {
                    return Err(UsageError::UnknownArgument(other.to_string()))
                }
                path => parsed.request = Some(PathBuf::from(path)),
            }
        }

        Ok(parsed)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse(std::env::args().skip(1))?;

    let rules = config::load(args.config)?;
    info!(
        max_level = rules.max_level,
        excluded = rules.discounts.excluded_categories.len(),
        "Pricing rules loaded"
    );

    if args.print_rules {
        print!("{}", config::render(&rules)?);
        return Ok(());
    }

    let calculator = PriceCalculator::new(&rules)?;

    let input = match &args.request {
        Some(path) => {
            info!(?path, "Reading price request");
            std::fs::read_to_string(path)?
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let request: PriceRequest = serde_json::from_str(&input)?;
    let result = match calculator.calculate_request(request) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Price calculation failed");
            return Err(e.into());
        }
    };

    if result.final_price.is_negative() {
        warn!(final_price = %result.final_price, "Final price is negative");
    }
    info!(
        final_price = %result.final_price,
        elapsed_ms = result.execution_time_millis,
        "Price calculated"
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - include the calculator's per-step events
/// - Default: INFO level
///
/// Logs go to stderr so stdout stays valid JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, UsageError> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse(&[]).unwrap(), Args::default());

        let args = parse(&["--config", "rules.toml", "req.json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("rules.toml")));
        assert_eq!(args.request, Some(PathBuf::from("req.json")));

        assert!(parse(&["--print-rules"]).unwrap().print_rules);
        assert_eq!(parse(&["-"]).unwrap().request, None);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(matches!(
            parse(&["--config"]),
            Err(UsageError::MissingValue("--config"))
        ));
        assert!(matches!(
            parse(&["--verbose"]),
            Err(UsageError::UnknownArgument(_))
        ));
    }
}
