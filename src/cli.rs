//! Command-line interface parsing for fxrates
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! an explicit [`RatesConfig`] for the rate store and refresh cycle.

use chrono::Duration;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration as StdDuration;
use thiserror::Error;

use crate::cache::{RateStore, DEFAULT_MAX_AGE_HOURS};
use crate::converter::normalize_code;
use crate::data::rates_api::DEFAULT_BASE_URL;

/// Anchor currencies fetched on refresh unless overridden
pub const DEFAULT_ANCHORS: [&str; 4] = ["USD", "EUR", "GBP", "RUB"];

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// An anchor currency code is not usable
    #[error("Invalid currency code: '{0}'")]
    InvalidCurrency(String),

    /// The freshness window must be positive
    #[error("Invalid max age: {0} hours (must be at least 1)")]
    InvalidMaxAge(u64),

    /// The HTTP timeout must be positive
    #[error("Invalid timeout: {0} seconds (must be at least 1)")]
    InvalidTimeout(u64),

    /// No anchor currencies were given
    #[error("At least one anchor currency is required")]
    NoAnchors,
}

/// fxrates - Convert currencies with cached exchange rates
#[derive(Parser, Debug)]
#[command(name = "fxrates")]
#[command(about = "Currency conversion with cached exchange rates, plus an HTTP request tester")]
#[command(version)]
pub struct Cli {
    /// Path of the rate cache file
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Hours after which cached rates are refreshed
    #[arg(long, value_name = "HOURS", default_value_t = DEFAULT_MAX_AGE_HOURS as u64)]
    pub max_age_hours: u64,

    /// Anchor currencies fetched on refresh, comma separated
    #[arg(
        long,
        value_name = "CODES",
        value_delimiter = ',',
        default_values = DEFAULT_ANCHORS
    )]
    pub anchors: Vec<String>,

    /// Base URL of the exchange rate API
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to do once rates are available
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Interactive converter menu (default)
    Menu,
    /// Show all rates against a base currency, or prompt for bases
    Rates {
        /// Base currency code
        base: Option<String>,
    },
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
    },
    /// Show the exchange rate between two currencies
    Rate {
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
    },
    /// List available currencies and anchors
    List,
    /// Fetch fresh rates now, ignoring the cache age
    Refresh,
    /// Interactive HTTP request tester
    Probe,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RatesConfig {
    /// Location of the rate snapshot
    pub cache_path: PathBuf,
    /// Age after which the snapshot is refreshed
    pub max_age: Duration,
    /// Anchor currencies to fetch, in order, without duplicates
    pub anchors: Vec<String>,
    /// Base URL of the exchange rate API
    pub api_url: String,
    /// HTTP request timeout
    pub timeout: StdDuration,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            cache_path: RateStore::default_path(),
            max_age: Duration::hours(DEFAULT_MAX_AGE_HOURS),
            anchors: DEFAULT_ANCHORS.iter().map(|s| s.to_string()).collect(),
            api_url: DEFAULT_BASE_URL.to_string(),
            timeout: StdDuration::from_secs(10),
        }
    }
}

/// Normalizes a list of anchor codes, dropping duplicates but keeping order
pub fn parse_anchors(codes: &[String]) -> Result<Vec<String>, CliError> {
    let mut anchors: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        let code = normalize_code(code).map_err(|_| CliError::InvalidCurrency(code.clone()))?;
        if !anchors.contains(&code) {
            anchors.push(code);
        }
    }
    if anchors.is_empty() {
        return Err(CliError::NoAnchors);
    }
    Ok(anchors)
}

impl RatesConfig {
    /// Creates a RatesConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RatesConfig)` with defaults filled in
    /// * `Err(CliError)` if an anchor code, the max age or the timeout is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let max_age = i64::try_from(cli.max_age_hours)
            .ok()
            .filter(|hours| *hours > 0)
            .and_then(Duration::try_hours)
            .ok_or(CliError::InvalidMaxAge(cli.max_age_hours))?;

        if cli.timeout_secs == 0 {
            return Err(CliError::InvalidTimeout(cli.timeout_secs));
        }

        Ok(RatesConfig {
            cache_path: cli
                .cache_file
                .clone()
                .unwrap_or_else(RateStore::default_path),
            max_age,
            anchors: parse_anchors(&cli.anchors)?,
            api_url: cli.api_url.clone(),
            timeout: StdDuration::from_secs(cli.timeout_secs),
        })
    }

    /// Rate store for this configuration
    pub fn store(&self) -> RateStore {
        RateStore::new(self.cache_path.clone(), self.max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["fxrates"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.anchors, vec!["USD", "EUR", "GBP", "RUB"]);
        assert_eq!(cli.max_age_hours, 24);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parse_anchor_list() {
        let cli = Cli::parse_from(["fxrates", "--anchors", "usd,jpy", "list"]);
        assert_eq!(cli.anchors, vec!["usd", "jpy"]);
        assert_eq!(cli.command, Some(Command::List));
    }

    #[test]
    fn test_cli_parse_convert() {
        let cli = Cli::parse_from(["fxrates", "convert", "12.5", "usd", "eur"]);
        assert_eq!(
            cli.command,
            Some(Command::Convert {
                amount: 12.5,
                from: "usd".to_string(),
                to: "eur".to_string()
            })
        );
    }

    #[test]
    fn test_cli_parse_negative_amount() {
        let cli = Cli::parse_from(["fxrates", "convert", "-5", "usd", "eur"]);
        assert!(matches!(cli.command, Some(Command::Convert { amount, .. }) if amount == -5.0));
    }

    #[test]
    fn test_cli_parse_verbosity() {
        let cli = Cli::parse_from(["fxrates", "-vv", "refresh"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command, Some(Command::Refresh));
    }

    #[test]
    fn test_config_from_cli_defaults() {
        let cli = Cli::parse_from(["fxrates"]);
        let config = RatesConfig::from_cli(&cli).unwrap();
        assert_eq!(config.max_age, Duration::hours(24));
        assert_eq!(config.anchors, vec!["USD", "EUR", "GBP", "RUB"]);
        assert_eq!(config.api_url, DEFAULT_BASE_URL);
        assert_eq!(config.cache_path, RateStore::default_path());
    }

    #[test]
    fn test_config_from_cli_normalizes_anchors() {
        let cli = Cli::parse_from(["fxrates", "--anchors", " usd,Eur,USD "]);
        let config = RatesConfig::from_cli(&cli).unwrap();
        assert_eq!(config.anchors, vec!["USD", "EUR"]);
    }

    #[test]
    fn test_config_from_cli_rejects_bad_anchor() {
        let cli = Cli::parse_from(["fxrates", "--anchors", "USD,U$D"]);
        let err = RatesConfig::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("U$D"));
    }

    #[test]
    fn test_config_from_cli_rejects_zero_max_age() {
        let cli = Cli::parse_from(["fxrates", "--max-age-hours", "0"]);
        assert!(matches!(
            RatesConfig::from_cli(&cli),
            Err(CliError::InvalidMaxAge(0))
        ));
    }

    #[test]
    fn test_config_from_cli_rejects_out_of_range_max_age() {
        let cli = Cli::parse_from(["fxrates", "--max-age-hours", "10000000000000"]);
        assert!(matches!(
            RatesConfig::from_cli(&cli),
            Err(CliError::InvalidMaxAge(10_000_000_000_000))
        ));

        let max = u64::MAX.to_string();
        let cli = Cli::parse_from(["fxrates", "--max-age-hours", max.as_str()]);
        assert!(matches!(
            RatesConfig::from_cli(&cli),
            Err(CliError::InvalidMaxAge(u64::MAX))
        ));
    }

    #[test]
    fn test_config_from_cli_accepts_large_max_age() {
        let cli = Cli::parse_from(["fxrates", "--max-age-hours", "8760"]);
        let config = RatesConfig::from_cli(&cli).unwrap();
        assert_eq!(config.max_age, Duration::days(365));
    }

    #[test]
    fn test_config_from_cli_rejects_zero_timeout() {
        let cli = Cli::parse_from(["fxrates", "--timeout-secs", "0"]);
        assert!(matches!(
            RatesConfig::from_cli(&cli),
            Err(CliError::InvalidTimeout(0))
        ));
    }

    #[test]
    fn test_config_store_uses_cache_file() {
        let cli = Cli::parse_from(["fxrates", "--cache-file", "/tmp/rates.json"]);
        let config = RatesConfig::from_cli(&cli).unwrap();
        let store = config.store();
        assert_eq!(store.path(), std::path::Path::new("/tmp/rates.json"));
        assert_eq!(store.max_age(), Duration::hours(24));
    }
}
