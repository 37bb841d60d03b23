//! Pipeline
//!
//! Threads a running price through the four stages in a fixed order:
//!
//! 1. brand & category, per line
//! 2. voucher, on the subtotal after step 1
//! 3. bank offer, on the subtotal after step 2
//!
//! Every stage compounds on the previous subtotal, so the order is part of the
//! result and is never rearranged.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    breakdown::{AppliedDiscount, DiscountedPrice, StageSubtotals},
    items::{Cart, InvalidInput},
    rules::RuleBook,
    stages,
};

/// Errors that stop a cart from being priced. No partial result is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A line had a zero quantity or a negative price.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// An amount exceeded the decimal range.
    #[error("amount overflowed the decimal range")]
    Overflow,
}

/// Checkout context supplied alongside the cart.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checkout<'a> {
    /// Voucher code entered by the shopper
    pub voucher_code: Option<&'a str>,

    /// Issuer of the card used to pay
    pub card_issuer: Option<&'a str>,

    /// Customer tier, checked against tier-restricted vouchers
    pub customer_tier: Option<&'a str>,
}

impl<'a> Checkout<'a> {
    /// Creates an empty context: no voucher, no card, no tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the voucher code.
    #[must_use]
    pub fn voucher(mut self, code: &'a str) -> Self {
        self.voucher_code = Some(code);
        self
    }

    /// Sets the card issuer.
    #[must_use]
    pub fn card(mut self, issuer: &'a str) -> Self {
        self.card_issuer = Some(issuer);
        self
    }

    /// Sets the customer tier.
    #[must_use]
    pub fn tier(mut self, tier: &'a str) -> Self {
        self.customer_tier = Some(tier);
        self
    }
}

/// Prices carts against a fixed rule book.
#[derive(Debug, Clone, Default)]
pub struct DiscountPipeline {
    rules: RuleBook,
}

impl DiscountPipeline {
    /// Creates a pipeline over the given rules.
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    /// The rules this pipeline prices against
    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Price a cart with an optional voucher code and card issuer.
    ///
    /// Unknown codes and issuers contribute no discount. An empty cart prices to zero.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidInput`]: a line has a zero quantity or a negative price.
    /// - [`PipelineError::Overflow`]: an amount exceeded the decimal range.
    pub fn calculate(
        &self,
        cart: &Cart,
        voucher_code: Option<&str>,
        card_issuer: Option<&str>,
    ) -> Result<DiscountedPrice, PipelineError> {
        self.price(
            cart,
            &Checkout {
                voucher_code,
                card_issuer,
                customer_tier: None,
            },
        )
    }

    /// Price a cart with the full checkout context.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidInput`]: a line has a zero quantity or a negative price.
    /// - [`PipelineError::Overflow`]: an amount exceeded the decimal range.
    #[instrument(
        skip_all,
        fields(
            lines = cart.len(),
            voucher = checkout.voucher_code.is_some(),
            card = checkout.card_issuer.is_some(),
        )
    )]
    pub fn price(
        &self,
        cart: &Cart,
        checkout: &Checkout<'_>,
    ) -> Result<DiscountedPrice, PipelineError> {
        cart.validate()?;

        if cart.is_empty() {
            debug!("empty cart");
            return Ok(DiscountedPrice::empty(cart.currency()));
        }

        let original_price = cart.original_price().ok_or(PipelineError::Overflow)?;

        let mut applied = stages::brand_and_category(cart, &self.rules)?;
        let after_brand_and_category = subtract_all(original_price, &applied)?;

        let voucher = stages::voucher_discount(
            checkout.voucher_code,
            checkout.customer_tier,
            after_brand_and_category,
            &self.rules,
        )?;
        let after_voucher = subtract(after_brand_and_category, voucher.as_ref())?;
        applied.extend(voucher);

        let bank = stages::bank_discount(
            checkout.card_issuer,
            original_price,
            after_voucher,
            &self.rules,
        )?;
        let after_bank = subtract(after_voucher, bank.as_ref())?;
        applied.extend(bank);

        debug!(
            %original_price,
            %after_brand_and_category,
            %after_voucher,
            final_price = %after_bank,
            "cart priced"
        );

        Ok(DiscountedPrice::new(
            original_price,
            StageSubtotals {
                after_brand_and_category,
                after_voucher,
                after_bank,
            },
            applied,
            cart.currency(),
        ))
    }

    /// Whether a voucher code exists and is available to a customer of `tier`.
    pub fn validate_voucher(&self, code: &str, tier: Option<&str>) -> bool {
        self.rules
            .voucher(code)
            .is_some_and(|rule| rule.allows_tier(tier))
    }
}

fn subtract(price: Decimal, discount: Option<&AppliedDiscount>) -> Result<Decimal, PipelineError> {
    match discount {
        Some(discount) => price
            .checked_sub(discount.amount())
            .ok_or(PipelineError::Overflow),
        None => Ok(price),
    }
}

fn subtract_all(price: Decimal, discounts: &[AppliedDiscount]) -> Result<Decimal, PipelineError> {
    discounts
        .iter()
        .try_fold(price, |acc, discount| subtract(acc, Some(discount)))
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rust_decimal_macros::dec;
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;
    use crate::{
        breakdown::DiscountKind,
        items::{InputIssue, LineItem},
        rules::{BankRule, BrandRule, CategoryRule, VoucherRule},
    };

    fn pipeline() -> TestResult<DiscountPipeline> {
        Ok(DiscountPipeline::new(
            RuleBook::new()
                .with_brand("PUMA", BrandRule::new(Percentage::from(dec!(0.4)))?)
                .with_category("T-Shirts", CategoryRule::new(Percentage::from(dec!(0.1)))?)
                .with_voucher(
                    "SUPER69",
                    VoucherRule::new(Percentage::from(dec!(0.69)))?,
                )
                .with_voucher(
                    "VIP20",
                    VoucherRule::new(Percentage::from(dec!(0.2)))?.with_required_tier("PREMIUM"),
                )
                .with_bank("ICICI", BankRule::new(Percentage::from(dec!(0.1)))?),
        ))
    }

    fn puma_cart() -> Cart {
        Cart::with_items(
            [LineItem::new("PUMA", "T-Shirts", dec!(60), dec!(50), 2)],
            iso::INR,
        )
    }

    #[test]
    fn full_stack_matches_worked_example() -> TestResult {
        let price = pipeline()?.calculate(&puma_cart(), Some("SUPER69"), Some("ICICI"))?;

        assert_eq!(price.original_price(), dec!(100));
        assert_eq!(price.discount_for(DiscountKind::Brand), dec!(48));
        assert_eq!(price.discount_for(DiscountKind::Category), dec!(10));
        assert_eq!(
            price.subtotals(),
            StageSubtotals {
                after_brand_and_category: dec!(42),
                after_voucher: dec!(13.02),
                after_bank: dec!(11.718),
            }
        );
        assert_eq!(price.final_price(), dec!(11.718));

        let kinds: Vec<_> = price
            .applied_discounts()
            .iter()
            .map(AppliedDiscount::kind)
            .collect();

        assert_eq!(
            kinds,
            [
                DiscountKind::Brand,
                DiscountKind::Category,
                DiscountKind::Voucher,
                DiscountKind::Bank,
            ]
        );

        Ok(())
    }

    #[test]
    fn final_price_is_original_minus_all_discounts() -> TestResult {
        let price = pipeline()?.calculate(&puma_cart(), Some("SUPER69"), Some("ICICI"))?;

        assert_eq!(
            price.final_price(),
            price.original_price() - price.total_discount()
        );

        Ok(())
    }

    #[test]
    fn unknown_codes_are_no_ops() -> TestResult {
        let pipeline = pipeline()?;
        let cart = puma_cart();

        let with_unknown = pipeline.calculate(&cart, Some("BOGUS"), Some("HDFC"))?;
        let without = pipeline.calculate(&cart, None, None)?;

        assert_eq!(with_unknown.final_price(), dec!(42));
        assert_eq!(with_unknown.final_price(), without.final_price());
        assert_eq!(with_unknown.applied_discounts().len(), 2);

        Ok(())
    }

    #[test]
    fn empty_cart_prices_to_zero() -> TestResult {
        let price = pipeline()?.calculate(&Cart::new(iso::INR), Some("SUPER69"), Some("ICICI"))?;

        assert_eq!(price.original_price(), Decimal::ZERO);
        assert_eq!(price.final_price(), Decimal::ZERO);
        assert!(price.applied_discounts().is_empty());

        Ok(())
    }

    #[test]
    fn invalid_line_fails_without_result() -> TestResult {
        let cart = Cart::with_items(
            [
                LineItem::new("PUMA", "T-Shirts", dec!(60), dec!(50), 1),
                LineItem::new("PUMA", "T-Shirts", dec!(60), dec!(-50), 1),
            ],
            iso::INR,
        );

        let result = pipeline()?.calculate(&cart, None, None);

        assert_eq!(
            result.err(),
            Some(PipelineError::InvalidInput(InvalidInput {
                index: 1,
                issue: InputIssue::NegativeCurrentPrice,
            }))
        );

        Ok(())
    }

    #[test]
    fn tier_restricted_voucher_needs_matching_customer() -> TestResult {
        let pipeline = pipeline()?;
        let cart = puma_cart();

        let anonymous = pipeline.calculate(&cart, Some("VIP20"), None)?;
        let premium = pipeline.price(&cart, &Checkout::new().voucher("VIP20").tier("PREMIUM"))?;

        assert_eq!(anonymous.final_price(), dec!(42));
        assert_eq!(premium.final_price(), dec!(33.6));

        Ok(())
    }

    #[test]
    fn validate_voucher_checks_existence_and_tier() -> TestResult {
        let pipeline = pipeline()?;

        assert!(pipeline.validate_voucher("SUPER69", None));
        assert!(pipeline.validate_voucher("VIP20", Some("PREMIUM")));
        assert!(!pipeline.validate_voucher("VIP20", Some("SILVER")));
        assert!(!pipeline.validate_voucher("NOPE", None));

        Ok(())
    }

    #[test]
    fn bank_runs_after_voucher() -> TestResult {
        let pipeline = pipeline()?;
        let price = pipeline.calculate(&puma_cart(), Some("SUPER69"), Some("ICICI"))?;

        // Bank first would give 42 × 0.9 = 37.8, then 37.8 × 0.31 = 11.718 payable but a
        // bank amount of 4.2 rather than 1.302.
        assert_eq!(price.discount_for(DiscountKind::Bank), dec!(1.302));
        assert_eq!(price.discount_for(DiscountKind::Voucher), dec!(28.98));

        Ok(())
    }
}
