//! Stages
//!
//! The four discount calculators. Each is a pure function over the cart, the rule
//! book and the running subtotal; none of them mutate their inputs.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    breakdown::{AppliedDiscount, DiscountKind},
    items::{Cart, LineItem},
    pipeline::PipelineError,
    rules::{BankRule, BrandRule, CategoryRule, RuleBook, VoucherRule, fraction},
};

/// Calculate `rate` of `amount` without rounding.
///
/// # Errors
///
/// Returns [`PipelineError::Overflow`] if the product cannot be represented.
pub fn percent_of(rate: Percentage, amount: Decimal) -> Result<Decimal, PipelineError> {
    fraction(rate)
        .checked_mul(amount)
        .ok_or(PipelineError::Overflow)
}

/// Brand discount for one line: `rate × base_price × quantity`.
///
/// `brand_total` is the cart's base-price spend on the line's brand; a rule with a
/// minimum purchase contributes nothing until it is reached.
///
/// # Errors
///
/// Returns [`PipelineError::Overflow`] on decimal overflow.
pub fn brand_discount(
    item: &LineItem,
    rule: &BrandRule,
    brand_total: Decimal,
) -> Result<Decimal, PipelineError> {
    if rule.min_purchase().is_some_and(|min| brand_total < min) {
        return Ok(Decimal::ZERO);
    }

    let base_total = item.base_total().ok_or(PipelineError::Overflow)?;

    percent_of(rule.rate(), base_total)
}

/// Category discount for one line: `rate × current_price × quantity`.
///
/// # Errors
///
/// Returns [`PipelineError::Overflow`] on decimal overflow.
pub fn category_discount(item: &LineItem, rule: &CategoryRule) -> Result<Decimal, PipelineError> {
    if rule.excludes(item.brand()) {
        return Ok(Decimal::ZERO);
    }

    let current_total = item.current_total().ok_or(PipelineError::Overflow)?;

    percent_of(rule.rate(), current_total)
}

/// Base-price spend per brand across the whole cart.
fn brand_totals(cart: &Cart) -> Result<FxHashMap<&str, Decimal>, PipelineError> {
    let mut totals: FxHashMap<&str, Decimal> = FxHashMap::default();

    for item in cart {
        let line = item.base_total().ok_or(PipelineError::Overflow)?;
        let total = totals.entry(item.brand()).or_default();

        *total = total.checked_add(line).ok_or(PipelineError::Overflow)?;
    }

    Ok(totals)
}

/// Brand and category stage.
///
/// Emits one entry per non-zero sub-discount, brand before category, lines in cart
/// order. Amounts are exact per line; only the running stage total is limited, so the
/// stage never takes more than the cart's original price.
///
/// # Errors
///
/// Returns [`PipelineError::Overflow`] on decimal overflow.
pub fn brand_and_category(
    cart: &Cart,
    rules: &RuleBook,
) -> Result<SmallVec<[AppliedDiscount; 8]>, PipelineError> {
    let totals = brand_totals(cart)?;
    let mut remaining = cart.original_price().ok_or(PipelineError::Overflow)?;
    let mut applied = SmallVec::new();

    let mut take = |amount: Decimal| {
        let amount = amount.min(remaining);
        remaining -= amount;
        amount
    };

    for (idx, item) in cart.iter().enumerate() {
        if let Some(rule) = rules.brand(item.brand()) {
            let brand_total = totals.get(item.brand()).copied().unwrap_or_default();
            let amount = take(brand_discount(item, rule, brand_total)?);

            if !amount.is_zero() {
                applied.push(AppliedDiscount::for_line(
                    DiscountKind::Brand,
                    idx,
                    rule.label(item.brand()),
                    amount,
                ));
            }
        }

        if let Some(rule) = rules.category(item.category()) {
            let amount = take(category_discount(item, rule)?);

            if !amount.is_zero() {
                applied.push(AppliedDiscount::for_line(
                    DiscountKind::Category,
                    idx,
                    rule.label(item.category()),
                    amount,
                ));
            }
        }
    }

    debug!(entries = applied.len(), "brand and category stage complete");

    Ok(applied)
}

/// Voucher stage: `rate × subtotal`, capped at the voucher's maximum.
///
/// Unknown codes and tier mismatches are not errors; they yield no discount.
///
/// # Errors
///
/// Returns [`PipelineError::Overflow`] on decimal overflow.
pub fn voucher_discount(
    code: Option<&str>,
    customer_tier: Option<&str>,
    subtotal: Decimal,
    rules: &RuleBook,
) -> Result<Option<AppliedDiscount>, PipelineError> {
    let Some(code) = code else {
        return Ok(None);
    };

    let Some(rule) = rules.voucher(code) else {
        debug!(code, "unknown voucher code ignored");
        return Ok(None);
    };

    if !rule.allows_tier(customer_tier) {
        debug!(code, tier = customer_tier, "voucher not available for tier");
        return Ok(None);
    }

    let amount = capped(rule, percent_of(rule.rate(), subtotal)?);

    debug!(code, %amount, "voucher applied");

    Ok(Some(AppliedDiscount::for_cart(
        DiscountKind::Voucher,
        rule.label(code),
        amount,
    )))
}

fn capped(rule: &VoucherRule, amount: Decimal) -> Decimal {
    match rule.max_discount() {
        Some(max) => amount.min(max),
        None => amount,
    }
}

/// Bank stage: `rate × subtotal`, if the original price meets the offer minimum.
///
/// Unknown issuers are not errors; they yield no discount.
///
/// # Errors
///
/// Returns [`PipelineError::Overflow`] on decimal overflow.
pub fn bank_discount(
    issuer: Option<&str>,
    original_price: Decimal,
    subtotal: Decimal,
    rules: &RuleBook,
) -> Result<Option<AppliedDiscount>, PipelineError> {
    let Some(issuer) = issuer else {
        return Ok(None);
    };

    let Some(rule) = rules.bank(issuer) else {
        debug!(issuer, "no offer for card issuer");
        return Ok(None);
    };

    if !meets_minimum(rule, original_price) {
        debug!(issuer, %original_price, "bank offer minimum not met");
        return Ok(None);
    }

    let amount = percent_of(rule.rate(), subtotal)?;

    debug!(issuer, %amount, "bank offer applied");

    Ok(Some(AppliedDiscount::for_cart(
        DiscountKind::Bank,
        rule.label(issuer),
        amount,
    )))
}

fn meets_minimum(rule: &BankRule, original_price: Decimal) -> bool {
    rule.min_purchase().is_none_or(|min| original_price >= min)
}
