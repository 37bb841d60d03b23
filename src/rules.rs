//! Rules
//!
//! Static discount configuration. A [`RuleBook`] holds one table per stage, keyed by
//! brand name, category name, voucher code and card issuer respectively. Tables are
//! built once and only read while pricing.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised while building rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    /// Rate was outside `0%..=100%` (rate in percent points).
    #[error("discount rate {0}% is outside 0%..=100%")]
    RateOutOfRange(Decimal),

    /// A voucher cap was negative.
    #[error("maximum discount cannot be negative, got {0}")]
    NegativeCap(Decimal),
}

/// Returns the rate as a fraction (e.g. `0.4` for 40%).
pub fn fraction(rate: Percentage) -> Decimal {
    rate * Decimal::ONE
}

/// Returns the rate in percent points (e.g. `40` for 40%).
pub fn percent_points(rate: Percentage) -> Decimal {
    (fraction(rate) * Decimal::ONE_HUNDRED).normalize()
}

fn checked_rate(rate: Percentage) -> Result<Percentage, RuleError> {
    let value = fraction(rate);

    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(RuleError::RateOutOfRange(percent_points(rate)));
    }

    Ok(rate)
}

/// Brand discount, applied to each matching line's base price.
#[derive(Debug, Clone)]
pub struct BrandRule {
    rate: Percentage,
    name: Option<String>,
    min_purchase: Option<Decimal>,
}

impl BrandRule {
    /// Creates a brand rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RateOutOfRange`] if the rate is not within `0%..=100%`.
    pub fn new(rate: Percentage) -> Result<Self, RuleError> {
        Ok(Self {
            rate: checked_rate(rate)?,
            name: None,
            min_purchase: None,
        })
    }

    /// Overrides the generated label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Only apply when the cart holds at least this much of the brand, at base price.
    #[must_use]
    pub fn with_min_purchase(mut self, amount: Decimal) -> Self {
        self.min_purchase = Some(amount);
        self
    }

    /// Discount rate
    pub fn rate(&self) -> Percentage {
        self.rate
    }

    /// Minimum brand spend, if any
    pub fn min_purchase(&self) -> Option<Decimal> {
        self.min_purchase
    }

    /// Label for the receipt, e.g. `Brand: PUMA 40% off`.
    pub fn label(&self, brand: &str) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!("Brand: {brand} {}% off", percent_points(self.rate))
        })
    }
}

/// Category discount, applied to each matching line's current price.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    rate: Percentage,
    name: Option<String>,
    excluded_brands: SmallVec<[String; 2]>,
}

impl CategoryRule {
    /// Creates a category rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RateOutOfRange`] if the rate is not within `0%..=100%`.
    pub fn new(rate: Percentage) -> Result<Self, RuleError> {
        Ok(Self {
            rate: checked_rate(rate)?,
            name: None,
            excluded_brands: SmallVec::new(),
        })
    }

    /// Overrides the generated label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Never discount lines of this brand.
    #[must_use]
    pub fn excluding_brand(mut self, brand: impl Into<String>) -> Self {
        self.excluded_brands.push(brand.into());
        self
    }

    /// Discount rate
    pub fn rate(&self) -> Percentage {
        self.rate
    }

    /// Whether lines of `brand` are excluded from this rule.
    pub fn excludes(&self, brand: &str) -> bool {
        self.excluded_brands.iter().any(|excluded| excluded == brand)
    }

    /// Label for the receipt, e.g. `Category: T-shirts 10% off`.
    pub fn label(&self, category: &str) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!("Category: {category} {}% off", percent_points(self.rate))
        })
    }
}

/// Voucher, applied once to the subtotal after brand and category discounts.
#[derive(Debug, Clone)]
pub struct VoucherRule {
    rate: Percentage,
    name: Option<String>,
    max_discount: Option<Decimal>,
    required_tier: Option<String>,
}

impl VoucherRule {
    /// Creates a voucher rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RateOutOfRange`] if the rate is not within `0%..=100%`.
    pub fn new(rate: Percentage) -> Result<Self, RuleError> {
        Ok(Self {
            rate: checked_rate(rate)?,
            name: None,
            max_discount: None,
            required_tier: None,
        })
    }

    /// Overrides the generated label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Caps the voucher amount.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NegativeCap`] if `amount` is below zero.
    pub fn with_max_discount(mut self, amount: Decimal) -> Result<Self, RuleError> {
        if amount < Decimal::ZERO {
            return Err(RuleError::NegativeCap(amount));
        }

        self.max_discount = Some(amount);

        Ok(self)
    }

    /// Restricts the voucher to customers of the given tier.
    #[must_use]
    pub fn with_required_tier(mut self, tier: impl Into<String>) -> Self {
        self.required_tier = Some(tier.into());
        self
    }

    /// Discount rate
    pub fn rate(&self) -> Percentage {
        self.rate
    }

    /// Maximum voucher amount, if capped
    pub fn max_discount(&self) -> Option<Decimal> {
        self.max_discount
    }

    /// Whether a customer of `tier` may use this voucher.
    pub fn allows_tier(&self, tier: Option<&str>) -> bool {
        match self.required_tier.as_deref() {
            Some(required) => tier == Some(required),
            None => true,
        }
    }

    /// Label for the receipt, e.g. `Voucher: SUPER69 69% off`.
    pub fn label(&self, code: &str) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!("Voucher: {code} {}% off", percent_points(self.rate))
        })
    }
}

/// Bank offer, applied last to the subtotal after the voucher.
#[derive(Debug, Clone)]
pub struct BankRule {
    rate: Percentage,
    name: Option<String>,
    min_purchase: Option<Decimal>,
}

impl BankRule {
    /// Creates a bank offer.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RateOutOfRange`] if the rate is not within `0%..=100%`.
    pub fn new(rate: Percentage) -> Result<Self, RuleError> {
        Ok(Self {
            rate: checked_rate(rate)?,
            name: None,
            min_purchase: None,
        })
    }

    /// Overrides the generated label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Only apply when the original cart price reaches this amount.
    #[must_use]
    pub fn with_min_purchase(mut self, amount: Decimal) -> Self {
        self.min_purchase = Some(amount);
        self
    }

    /// Discount rate
    pub fn rate(&self) -> Percentage {
        self.rate
    }

    /// Minimum original cart price, if any
    pub fn min_purchase(&self) -> Option<Decimal> {
        self.min_purchase
    }

    /// Label for the receipt, e.g. `Bank: ICICI 10% off`.
    pub fn label(&self, issuer: &str) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!("Bank: {issuer} {}% off", percent_points(self.rate))
        })
    }
}

/// The four rule tables consulted by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    brands: FxHashMap<String, BrandRule>,
    categories: FxHashMap<String, CategoryRule>,
    vouchers: FxHashMap<String, VoucherRule>,
    banks: FxHashMap<String, BankRule>,
}

impl RuleBook {
    /// Creates an empty rule book; nothing will be discounted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the rule for a brand.
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>, rule: BrandRule) -> Self {
        self.brands.insert(brand.into(), rule);
        self
    }

    /// Adds (or replaces) the rule for a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>, rule: CategoryRule) -> Self {
        self.categories.insert(category.into(), rule);
        self
    }

    /// Adds (or replaces) a voucher code.
    #[must_use]
    pub fn with_voucher(mut self, code: impl Into<String>, rule: VoucherRule) -> Self {
        self.vouchers.insert(code.into(), rule);
        self
    }

    /// Adds (or replaces) the offer for a card issuer.
    #[must_use]
    pub fn with_bank(mut self, issuer: impl Into<String>, rule: BankRule) -> Self {
        self.banks.insert(issuer.into(), rule);
        self
    }

    /// Rule for a brand
    pub fn brand(&self, brand: &str) -> Option<&BrandRule> {
        self.brands.get(brand)
    }

    /// Rule for a category
    pub fn category(&self, category: &str) -> Option<&CategoryRule> {
        self.categories.get(category)
    }

    /// Rule for a voucher code
    pub fn voucher(&self, code: &str) -> Option<&VoucherRule> {
        self.vouchers.get(code)
    }

    /// Offer for a card issuer
    pub fn bank(&self, issuer: &str) -> Option<&BankRule> {
        self.banks.get(issuer)
    }

    /// True if no table has any entries.
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
            && self.categories.is_empty()
            && self.vouchers.is_empty()
            && self.banks.is_empty()
    }
}
