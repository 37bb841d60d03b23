//! Cascade
//!
//! Cascade prices a shopping cart by stacking four kinds of percentage discount in a
//! fixed order: brand and category per line, then a voucher on the resulting subtotal,
//! then a bank-card offer on what is left. The result is a [`DiscountedPrice`] that
//! records the subtotal after every stage and each discount in the order applied.

pub mod breakdown;
pub mod fixtures;
pub mod items;
pub mod pipeline;
pub mod prelude;
pub mod rules;
pub mod stages;

pub use breakdown::DiscountedPrice;
