//! Command line configuration

use std::path::PathBuf;

use cartwright::solvers::path::ShippingBasis;
use clap::{Args, Parser, ValueEnum};
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};

/// Cartwright: cheapest way to buy a list of items across marketplace sellers
#[derive(Debug, Parser)]
#[command(name = "cartwright", about = "Multi-seller shopping cart optimiser", long_about = None)]
pub struct Config {
    /// Listings file (YAML fixture or JSON array)
    #[arg(long, env = "CARTWRIGHT_LISTINGS")]
    pub listings: PathBuf,

    /// Shipping tiers file (YAML fixture or JSON price-list snapshot)
    #[arg(long, env = "CARTWRIGHT_SHIPPING")]
    pub shipping: PathBuf,

    /// Desired item, may be repeated
    #[arg(short, long = "item")]
    pub items: Vec<String>,

    /// File of desired items (YAML fixture, or one name per line)
    #[arg(long, env = "CARTWRIGHT_ITEMS_FILE")]
    pub items_file: Option<PathBuf>,

    /// Order value a seller's shipping tier is looked up against
    #[arg(long, env = "CARTWRIGHT_BASIS", value_enum, default_value_t = ShippingBasis::PathTotal)]
    pub basis: ShippingBasis,

    /// Solver to use
    #[arg(long, env = "CARTWRIGHT_SOLVER", value_enum, default_value_t = SolverKind::Path)]
    pub solver: SolverKind,

    /// Ignore shipping tiers whose ceiling is at or above this order value
    #[arg(long, env = "CARTWRIGHT_VALUE_CAP")]
    pub value_cap: Option<Decimal>,

    /// Drop desired items no seller with shipping tiers offers instead of failing
    #[arg(long)]
    pub allow_partial: bool,

    /// Currency used to display amounts
    #[arg(long, env = "CARTWRIGHT_CURRENCY", value_enum, default_value_t = DisplayCurrency::Eur)]
    pub currency: DisplayCurrency,

    /// Write the plan to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Solver selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SolverKind {
    /// Dynamic program over seller paths.
    Path,

    /// Exact mixed-integer model, charging each seller once on its goods subtotal.
    Milp,
}

/// Display currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DisplayCurrency {
    /// Euro
    Eur,
    /// Pound sterling
    Gbp,
    /// US dollar
    Usd,
}

impl DisplayCurrency {
    /// ISO currency definition.
    pub fn iso(self) -> &'static Currency {
        match self {
            Self::Eur => iso::EUR,
            Self::Gbp => iso::GBP,
            Self::Usd => iso::USD,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_repeated_items_and_modes() -> TestResult {
        let config = Config::try_parse_from([
            "cartwright",
            "--listings",
            "l.yml",
            "--shipping",
            "s.json",
            "--item",
            "Sol Ring",
            "-i",
            "Counterspell",
            "--basis",
            "seller-subtotal",
            "--solver",
            "milp",
            "--value-cap",
            "100",
            "--currency",
            "gbp",
        ])?;

        assert_eq!(config.items, vec!["Sol Ring", "Counterspell"]);
        assert_eq!(config.basis, ShippingBasis::SellerSubtotal);
        assert_eq!(config.solver, SolverKind::Milp);
        assert_eq!(config.value_cap, Some(dec!(100)));
        assert_eq!(config.currency.iso(), iso::GBP);

        Ok(())
    }

    #[test]
    fn defaults_to_reference_path_solver() -> TestResult {
        let config =
            Config::try_parse_from(["cartwright", "--listings", "l.yml", "--shipping", "s.yml"])?;

        assert_eq!(config.basis, ShippingBasis::PathTotal);
        assert_eq!(config.solver, SolverKind::Path);
        assert!(!config.allow_partial);

        Ok(())
    }
}
