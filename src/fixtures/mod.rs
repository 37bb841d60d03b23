//! Fixtures
//!
//! YAML loading for rule books and carts. A fixture set named `demo` lives at
//! `fixtures/rules/demo.yml` and `fixtures/carts/demo.yml`.

use std::path::{Path, PathBuf};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::iso::{Currency, EUR, GBP, INR, USD};
use thiserror::Error;

use crate::{items::Cart, rules::RuleBook, rules::RuleError};

pub mod cart;
pub mod rules;

pub use cart::{CartFixture, LineItemFixture};
pub use rules::RulesFixture;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid amount format
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Rule rejected while building the rule book
    #[error("Invalid rule {key}: {source}")]
    Rule {
        /// Table key of the offending rule
        key: String,

        /// Why it was rejected
        source: RuleError,
    },

    /// Rules were not loaded
    #[error("No rules loaded")]
    NoRules,

    /// Cart was not loaded
    #[error("No cart loaded")]
    NoCart,
}

/// A rule book and cart loaded from YAML.
#[derive(Debug)]
pub struct Fixture {
    base_path: PathBuf,
    rules: Option<RuleBook>,
    cart: Option<Cart>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            rules: None,
            cart: None,
        }
    }

    /// Load rules from `rules/<name>.yml` under the base path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a rule is invalid.
    pub fn load_rules(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("rules").join(format!("{name}.yml"));

        self.rules = Some(RulesFixture::from_file(&file_path)?.try_into()?);

        Ok(self)
    }

    /// Load a cart from `carts/<name>.yml` under the base path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("carts").join(format!("{name}.yml"));

        self.cart = Some(CartFixture::from_file(&file_path)?.try_into()?);

        Ok(self)
    }

    /// Load a complete fixture set (rules and cart with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if either fixture file cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_rules(name)?.load_cart(name)?;

        Ok(fixture)
    }

    /// Load a rules file and a cart file from explicit paths
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be loaded.
    pub fn from_files(rules: &Path, cart: &Path) -> Result<Self, FixtureError> {
        Ok(Self {
            base_path: PathBuf::new(),
            rules: Some(RulesFixture::from_file(rules)?.try_into()?),
            cart: Some(CartFixture::from_file(cart)?.try_into()?),
        })
    }

    /// The loaded rule book
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoRules`] if no rules were loaded.
    pub fn rules(&self) -> Result<&RuleBook, FixtureError> {
        self.rules.as_ref().ok_or(FixtureError::NoRules)
    }

    /// The loaded cart
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoCart`] if no cart was loaded.
    pub fn cart(&self) -> Result<&Cart, FixtureError> {
        self.cart.as_ref().ok_or(FixtureError::NoCart)
    }

    /// Take ownership of the loaded rules and cart
    ///
    /// # Errors
    ///
    /// Returns an error if either part was not loaded.
    pub fn into_parts(self) -> Result<(RuleBook, Cart), FixtureError> {
        let rules = self.rules.ok_or(FixtureError::NoRules)?;
        let cart = self.cart.ok_or(FixtureError::NoCart)?;

        Ok((rules, cart))
    }
}

/// Parse an amount string (e.g., "1299.50") into a decimal
///
/// # Errors
///
/// Returns an error if the string is not a decimal number.
pub fn parse_amount(s: &str) -> Result<Decimal, FixtureError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidAmount(s.to_string()))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / Decimal::ONE_HUNDRED))
    } else {
        let value = trimmed
            .parse::<Decimal>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

/// Look up a supported ISO currency code
///
/// # Errors
///
/// Returns an error if the code is not one of INR, GBP, USD or EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code.trim() {
        "INR" => Ok(INR),
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}
