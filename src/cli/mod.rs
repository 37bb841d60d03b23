//! Command line configuration

use std::path::PathBuf;

use clap::{Args, Parser};

pub(crate) mod logging;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
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

/// Cascade checkout pricing
#[derive(Debug, Parser)]
#[command(name = "cascade", about = "Price a cart through stacked discounts", long_about = None)]
pub struct CliConfig {
    /// Rule book YAML file
    #[arg(short, long, env = "CASCADE_RULES")]
    pub rules: PathBuf,

    /// Cart YAML file
    #[arg(short, long, env = "CASCADE_CART")]
    pub cart: PathBuf,

    /// Voucher code to apply
    #[arg(short, long)]
    pub voucher: Option<String>,

    /// Issuer of the card used to pay (e.g., ICICI)
    #[arg(short = 'b', long = "card")]
    pub card_issuer: Option<String>,

    /// Customer tier, for tier-restricted vouchers
    #[arg(short, long)]
    pub tier: Option<String>,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_full_command_line() -> TestResult {
        let config = CliConfig::try_parse_from([
            "cascade",
            "--rules",
            "fixtures/rules/demo.yml",
            "--cart",
            "fixtures/carts/demo.yml",
            "--voucher",
            "SUPER69",
            "--card",
            "ICICI",
            "--tier",
            "PREMIUM",
            "--log-format",
            "json",
        ])?;

        assert_eq!(config.voucher.as_deref(), Some("SUPER69"));
        assert_eq!(config.card_issuer.as_deref(), Some("ICICI"));
        assert_eq!(config.tier.as_deref(), Some("PREMIUM"));
        assert_eq!(config.logging.log_format, LogFormat::Json);

        Ok(())
    }

    #[test]
    fn voucher_and_card_are_optional() -> TestResult {
        let config = CliConfig::try_parse_from(["cascade", "-r", "rules.yml", "-c", "cart.yml"])?;

        assert!(config.voucher.is_none());
        assert!(config.card_issuer.is_none());

        Ok(())
    }

    #[test]
    fn rules_and_cart_are_required() {
        assert!(CliConfig::try_parse_from(["cascade"]).is_err());
    }
}
