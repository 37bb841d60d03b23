//! Breakdown
//!
//! The priced result of a cart: original price, the subtotal after each stage and
//! every discount in the order it was applied.

use std::{fmt, io};

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::rules::percent_points;

/// Errors that can occur when rendering a breakdown.
#[derive(Debug, Error)]
pub enum BreakdownError {
    /// Amount too large to display in minor units.
    #[error("amount {0} cannot be displayed in minor units")]
    Display(Decimal),

    /// IO error
    #[error("IO error")]
    IO,
}

/// The stage that produced a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiscountKind {
    /// Brand rule, on a line's base price
    Brand,

    /// Category rule, on a line's current price
    Category,

    /// Voucher code, on the post brand & category subtotal
    Voucher,

    /// Bank offer, on the post voucher subtotal
    Bank,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscountKind::Brand => "brand",
            DiscountKind::Category => "category",
            DiscountKind::Voucher => "voucher",
            DiscountKind::Bank => "bank",
        })
    }
}

/// A single discount subtracted from the running price.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount {
    kind: DiscountKind,
    label: String,
    amount: Decimal,
    line: Option<usize>,
}

impl AppliedDiscount {
    /// Discount on a specific cart line.
    pub fn for_line(
        kind: DiscountKind,
        line: usize,
        label: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            amount,
            line: Some(line),
        }
    }

    /// Discount on the cart as a whole.
    pub fn for_cart(kind: DiscountKind, label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            kind,
            label: label.into(),
            amount,
            line: None,
        }
    }

    /// Stage that produced the discount
    pub fn kind(&self) -> DiscountKind {
        self.kind
    }

    /// Description of the rule, e.g. `Brand: PUMA 40% off`
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Currency amount subtracted, never negative
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Cart line index for line-level discounts
    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

/// Running price after each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSubtotals {
    /// After brand and category discounts
    pub after_brand_and_category: Decimal,

    /// After the voucher
    pub after_voucher: Decimal,

    /// After the bank offer
    pub after_bank: Decimal,
}

/// Final price breakdown for a cart.
#[derive(Debug, Clone)]
pub struct DiscountedPrice {
    original_price: Decimal,
    subtotals: StageSubtotals,
    applied_discounts: SmallVec<[AppliedDiscount; 8]>,
    currency: &'static Currency,
}

impl DiscountedPrice {
    /// Assemble a breakdown.
    pub fn new(
        original_price: Decimal,
        subtotals: StageSubtotals,
        applied_discounts: SmallVec<[AppliedDiscount; 8]>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            original_price,
            subtotals,
            applied_discounts,
            currency,
        }
    }

    /// Breakdown for an empty cart.
    pub fn empty(currency: &'static Currency) -> Self {
        Self::new(
            Decimal::ZERO,
            StageSubtotals {
                after_brand_and_category: Decimal::ZERO,
                after_voucher: Decimal::ZERO,
                after_bank: Decimal::ZERO,
            },
            SmallVec::new(),
            currency,
        )
    }

    /// Total of `current_price × quantity` before any discount
    pub fn original_price(&self) -> Decimal {
        self.original_price
    }

    /// Subtotal after each stage
    pub fn subtotals(&self) -> StageSubtotals {
        self.subtotals
    }

    /// Discounts in the order they were applied
    pub fn applied_discounts(&self) -> &[AppliedDiscount] {
        &self.applied_discounts
    }

    /// Amount payable
    pub fn final_price(&self) -> Decimal {
        self.subtotals.after_bank
    }

    /// Currency of every amount
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Sum of every applied discount.
    pub fn total_discount(&self) -> Decimal {
        self.applied_discounts
            .iter()
            .map(AppliedDiscount::amount)
            .sum()
    }

    /// Sum of discounts produced by one stage.
    pub fn discount_for(&self, kind: DiscountKind) -> Decimal {
        self.applied_discounts
            .iter()
            .filter(|discount| discount.kind == kind)
            .map(AppliedDiscount::amount)
            .sum()
    }

    /// Difference between the original and final prices.
    pub fn savings(&self) -> Decimal {
        self.original_price - self.final_price()
    }

    /// Savings as a fraction of the original price; zero for a free or empty cart.
    pub fn savings_percent(&self) -> Percentage {
        if self.original_price.is_zero() {
            return Percentage::from(Decimal::ZERO);
        }

        Percentage::from(self.savings() / self.original_price)
    }

    /// One-line summary for the shopper.
    pub fn message(&self) -> String {
        if self.applied_discounts.is_empty() {
            return "No discounts applied".to_string();
        }

        let code = self.currency.iso_alpha_code;
        let applied = self
            .applied_discounts
            .iter()
            .map(|discount| {
                format!("{}: {code} {:.2}", discount.label, rounded(discount.amount, 2))
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "You saved {code} {:.2} ({:.1}%)! Applied: {applied}",
            rounded(self.savings(), 2),
            rounded(percent_points(self.savings_percent()), 1),
        )
    }

    /// Writes the breakdown as a table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be displayed or writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), BreakdownError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Stage", "Discount", "Amount", "Subtotal"]);

        builder.push_record([
            String::new(),
            "original".to_string(),
            String::new(),
            String::new(),
            self.money(self.original_price)?,
        ]);

        for (idx, discount) in self.applied_discounts.iter().enumerate() {
            let subtotal = match discount.kind {
                DiscountKind::Brand | DiscountKind::Category => {
                    self.subtotals.after_brand_and_category
                }
                DiscountKind::Voucher => self.subtotals.after_voucher,
                DiscountKind::Bank => self.subtotals.after_bank,
            };

            builder.push_record([
                format!("#{:<3}", idx + 1),
                discount.kind.to_string(),
                discount.label.clone(),
                format!("-{}", self.money(discount.amount)?),
                self.money(subtotal)?,
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(3..5), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| BreakdownError::IO)?;

        writeln!(out, " Original:  {}", self.money(self.original_price)?)
            .map_err(|_err| BreakdownError::IO)?;
        writeln!(out, " Total:     {}", self.money(self.final_price())?)
            .map_err(|_err| BreakdownError::IO)?;
        writeln!(
            out,
            " Savings:   ({:.2}%) {}",
            rounded(percent_points(self.savings_percent()), 2),
            self.money(self.savings())?
        )
        .map_err(|_err| BreakdownError::IO)?;

        writeln!(out).map_err(|_err| BreakdownError::IO)
    }

    fn money(&self, amount: Decimal) -> Result<String, BreakdownError> {
        let minor = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|value| rounded(value, 0).to_i64())
            .ok_or(BreakdownError::Display(amount))?;

        Ok(Money::from_minor(minor, self.currency).to_string())
    }
}

/// Half-up rounding for display; `{:.N}` on a `Decimal` truncates.
fn rounded(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
