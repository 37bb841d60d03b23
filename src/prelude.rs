//! Cascade prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    breakdown::{AppliedDiscount, BreakdownError, DiscountKind, DiscountedPrice, StageSubtotals},
    fixtures::{Fixture, FixtureError},
    items::{Cart, InputIssue, InvalidInput, LineItem},
    pipeline::{Checkout, DiscountPipeline, PipelineError},
    rules::{BankRule, BrandRule, CategoryRule, RuleBook, RuleError, VoucherRule},
};
