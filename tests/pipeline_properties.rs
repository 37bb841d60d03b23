//! Pipeline invariants over a spread of hand-built carts.
//!
//! Every cart is priced with and without each optional stage and checked for:
//!
//! - final price never exceeds the original price and is never negative
//! - final price equals original price minus every applied amount, exactly
//! - discounts are listed in stage order
//! - no matching rules means no discounts

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use rusty_money::iso;
use testresult::TestResult;

use cascade::prelude::*;

fn pct(value: Decimal) -> Percentage {
    Percentage::from(value)
}

fn rules() -> TestResult<RuleBook> {
    Ok(RuleBook::new()
        .with_brand("PUMA", BrandRule::new(pct(dec!(0.4)))?)
        .with_brand("Nike", BrandRule::new(pct(dec!(1)))?)
        .with_category("T-Shirts", CategoryRule::new(pct(dec!(0.1)))?)
        .with_category("Shoes", CategoryRule::new(pct(dec!(0.35)))?)
        .with_voucher(
            "SUPER69",
            VoucherRule::new(pct(dec!(0.69)))?.with_max_discount(dec!(5000))?,
        )
        .with_voucher("FREE", VoucherRule::new(pct(dec!(1)))?)
        .with_bank("ICICI", BankRule::new(pct(dec!(0.1)))?))
}

fn carts() -> Vec<Cart> {
    vec![
        Cart::with_items(
            [LineItem::new("PUMA", "T-Shirts", dec!(60), dec!(50), 2)],
            iso::INR,
        ),
        Cart::with_items(
            [
                LineItem::new("Nike", "Shoes", dec!(4999.99), dec!(3999.99), 3),
                LineItem::new("PUMA", "Shoes", dec!(120), dec!(120), 1),
            ],
            iso::INR,
        ),
        Cart::with_items(
            [
                LineItem::new("PUMA", "T-Shirts", dec!(1000), dec!(100), 1),
                LineItem::new("PUMA", "T-Shirts", dec!(1000), dec!(100), 1),
                LineItem::new("Generic", "Socks", dec!(9.99), dec!(9.99), 7),
            ],
            iso::INR,
        ),
        Cart::with_items(
            [LineItem::new("Generic", "Socks", dec!(0), dec!(0), 1)],
            iso::INR,
        ),
        Cart::with_items(
            [LineItem::new("Unbranded", "Hats", dec!(20000), dec!(20000), 1)],
            iso::INR,
        ),
    ]
}

const VOUCHERS: [Option<&str>; 4] = [None, Some("SUPER69"), Some("FREE"), Some("BOGUS")];
const CARDS: [Option<&str>; 3] = [None, Some("ICICI"), Some("AMEX")];

#[test]
fn invariants_hold_for_every_combination() -> TestResult {
    let pipeline = DiscountPipeline::new(rules()?);

    for cart in carts() {
        for voucher in VOUCHERS {
            for card in CARDS {
                let price = pipeline.calculate(&cart, voucher, card)?;

                assert!(
                    price.final_price() <= price.original_price(),
                    "final above original for {voucher:?}/{card:?}: {price:?}"
                );
                assert!(
                    price.final_price() >= Decimal::ZERO,
                    "negative final for {voucher:?}/{card:?}: {price:?}"
                );
                assert_eq!(
                    price.final_price(),
                    price.original_price() - price.total_discount(),
                    "breakdown does not add up for {voucher:?}/{card:?}"
                );
                assert!(
                    price
                        .applied_discounts()
                        .iter()
                        .all(|discount| discount.amount() >= Decimal::ZERO),
                    "negative discount amount: {price:?}"
                );

                let kinds: Vec<_> = price
                    .applied_discounts()
                    .iter()
                    .map(AppliedDiscount::kind)
                    .collect();

                // Brand and category interleave per line, so compare stage buckets.
                let stage = |kind: &DiscountKind| match kind {
                    DiscountKind::Brand | DiscountKind::Category => 0,
                    DiscountKind::Voucher => 1,
                    DiscountKind::Bank => 2,
                };

                assert!(
                    kinds.windows(2).all(|pair| match pair {
                        [a, b] => stage(a) <= stage(b),
                        _ => true,
                    }),
                    "discounts out of stage order: {kinds:?}"
                );
            }
        }
    }

    Ok(())
}

#[test]
fn no_matching_rules_leaves_price_unchanged() -> TestResult {
    let pipeline = DiscountPipeline::new(rules()?);
    let cart = Cart::with_items(
        [
            LineItem::new("Unbranded", "Hats", dec!(25), dec!(20), 2),
            LineItem::new("Generic", "Socks", dec!(5), dec!(5), 1),
        ],
        iso::INR,
    );

    let price = pipeline.calculate(&cart, Some("BOGUS"), Some("AMEX"))?;

    assert!(price.applied_discounts().is_empty());
    assert_eq!(price.final_price(), price.original_price());
    assert_eq!(price.final_price(), dec!(45));
    assert_eq!(price.message(), "No discounts applied");

    Ok(())
}

#[test]
fn brand_discount_is_exact_while_cart_stays_positive() -> TestResult {
    let pipeline = DiscountPipeline::new(rules()?);
    let cart = Cart::with_items(
        [
            LineItem::new("PUMA", "T-Shirts", dec!(100), dec!(30), 1),
            LineItem::new("Generic", "Socks", dec!(1000), dec!(1000), 1),
        ],
        iso::INR,
    );

    let price = pipeline.calculate(&cart, None, None)?;

    assert_eq!(price.original_price(), dec!(1030));
    assert_eq!(price.discount_for(DiscountKind::Brand), dec!(40));
    assert_eq!(price.discount_for(DiscountKind::Category), dec!(3));
    assert_eq!(price.subtotals().after_brand_and_category, dec!(987));

    Ok(())
}

#[test]
fn bank_is_applied_after_capped_voucher() -> TestResult {
    let pipeline = DiscountPipeline::new(rules()?);
    let cart = Cart::with_items(
        [LineItem::new("Unbranded", "Hats", dec!(20000), dec!(20000), 1)],
        iso::INR,
    );

    let price = pipeline.calculate(&cart, Some("SUPER69"), Some("ICICI"))?;

    // Voucher then bank: 20000 - 5000 = 15000, then 10% = 1500 -> 13500.
    // Bank then voucher would give 20000 - 2000 = 18000, then capped 5000 -> 13000.
    assert_eq!(price.discount_for(DiscountKind::Voucher), dec!(5000));
    assert_eq!(price.discount_for(DiscountKind::Bank), dec!(1500));
    assert_eq!(price.final_price(), dec!(13500));

    Ok(())
}

#[test]
fn pricing_is_deterministic_and_leaves_cart_untouched() -> TestResult {
    let pipeline = DiscountPipeline::new(rules()?);

    for cart in carts() {
        let before = cart.clone();

        let first = pipeline.calculate(&cart, Some("SUPER69"), Some("ICICI"))?;
        let second = pipeline.calculate(&cart, Some("SUPER69"), Some("ICICI"))?;

        assert_eq!(first.subtotals(), second.subtotals());
        assert_eq!(first.applied_discounts(), second.applied_discounts());
        assert_eq!(cart.items(), before.items());
    }

    Ok(())
}

#[test]
fn invalid_lines_are_rejected() -> TestResult {
    let pipeline = DiscountPipeline::new(rules()?);

    let zero_quantity = Cart::with_items(
        [LineItem::new("PUMA", "T-Shirts", dec!(60), dec!(50), 0)],
        iso::INR,
    );
    let negative_base = Cart::with_items(
        [LineItem::new("PUMA", "T-Shirts", dec!(-60), dec!(50), 1)],
        iso::INR,
    );

    assert!(matches!(
        pipeline.calculate(&zero_quantity, None, None),
        Err(PipelineError::InvalidInput(InvalidInput {
            index: 0,
            issue: InputIssue::ZeroQuantity,
        }))
    ));
    assert!(matches!(
        pipeline.calculate(&negative_base, None, None),
        Err(PipelineError::InvalidInput(InvalidInput {
            issue: InputIssue::NegativeBasePrice,
            ..
        }))
    ));

    Ok(())
}

#[test]
fn pipeline_can_be_shared_across_threads() -> TestResult {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}

    let pipeline = DiscountPipeline::new(rules()?);

    assert_send_sync(&pipeline);

    Ok(())
}
