//! Rule Fixtures

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, parse_amount, parse_percentage},
    rules::{BankRule, BrandRule, CategoryRule, RuleBook, RuleError, VoucherRule},
};

/// Rule book as written in YAML
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesFixture {
    /// Brand name -> rule
    pub brands: FxHashMap<String, BrandFixture>,

    /// Category name -> rule
    pub categories: FxHashMap<String, CategoryFixture>,

    /// Voucher code -> rule
    pub vouchers: FxHashMap<String, VoucherFixture>,

    /// Card issuer -> offer
    pub banks: FxHashMap<String, BankFixture>,
}

/// Brand rule fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrandFixture {
    /// Rate (e.g., "40%" or "0.4")
    pub rate: String,

    /// Label override
    pub name: Option<String>,

    /// Minimum base-price spend on the brand (e.g., "2000")
    pub min_purchase: Option<String>,
}

/// Category rule fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryFixture {
    /// Rate (e.g., "10%")
    pub rate: String,

    /// Label override
    pub name: Option<String>,

    /// Brands the category discount never applies to
    #[serde(default)]
    pub excluded_brands: Vec<String>,
}

/// Voucher fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoucherFixture {
    /// Rate (e.g., "69%")
    pub rate: String,

    /// Label override
    pub name: Option<String>,

    /// Cap on the voucher amount (e.g., "5000")
    pub max_discount: Option<String>,

    /// Customer tier the voucher is restricted to
    pub required_tier: Option<String>,
}

/// Bank offer fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankFixture {
    /// Rate (e.g., "10%")
    pub rate: String,

    /// Label override
    pub name: Option<String>,

    /// Minimum original cart price (e.g., "1000")
    pub min_purchase: Option<String>,
}

impl RulesFixture {
    /// Parse a rule book fixture from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// Read and parse a rule book fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }
}

fn rule_error(key: &str) -> impl FnOnce(RuleError) -> FixtureError + '_ {
    move |source| FixtureError::Rule {
        key: key.to_string(),
        source,
    }
}

impl TryFrom<RulesFixture> for RuleBook {
    type Error = FixtureError;

    fn try_from(fixture: RulesFixture) -> Result<Self, Self::Error> {
        let mut book = RuleBook::new();

        for (brand, config) in fixture.brands {
            let mut rule =
                BrandRule::new(parse_percentage(&config.rate)?).map_err(rule_error(&brand))?;

            if let Some(name) = config.name {
                rule = rule.with_name(name);
            }

            if let Some(min) = config.min_purchase.as_deref() {
                rule = rule.with_min_purchase(parse_amount(min)?);
            }

            book = book.with_brand(brand, rule);
        }

        for (category, config) in fixture.categories {
            let mut rule = CategoryRule::new(parse_percentage(&config.rate)?)
                .map_err(rule_error(&category))?;

            if let Some(name) = config.name {
                rule = rule.with_name(name);
            }

            for brand in config.excluded_brands {
                rule = rule.excluding_brand(brand);
            }

            book = book.with_category(category, rule);
        }

        for (code, config) in fixture.vouchers {
            let mut rule =
                VoucherRule::new(parse_percentage(&config.rate)?).map_err(rule_error(&code))?;

            if let Some(name) = config.name {
                rule = rule.with_name(name);
            }

            if let Some(max) = config.max_discount.as_deref() {
                rule = rule
                    .with_max_discount(parse_amount(max)?)
                    .map_err(rule_error(&code))?;
            }

            if let Some(tier) = config.required_tier {
                rule = rule.with_required_tier(tier);
            }

            book = book.with_voucher(code, rule);
        }

        for (issuer, config) in fixture.banks {
            let mut rule =
                BankRule::new(parse_percentage(&config.rate)?).map_err(rule_error(&issuer))?;

            if let Some(name) = config.name {
                rule = rule.with_name(name);
            }

            if let Some(min) = config.min_purchase.as_deref() {
                rule = rule.with_min_purchase(parse_amount(min)?);
            }

            book = book.with_bank(issuer, rule);
        }

        Ok(book)
    }
}
