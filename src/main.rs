//! Cascade command line
//!
//! Loads a rule book and a cart from YAML, prices the cart and prints the breakdown.

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cascade::{
    fixtures::Fixture,
    pipeline::{Checkout, DiscountPipeline},
};

use crate::cli::CliConfig;

mod cli;

/// Cascade entry point
fn main() -> Result<()> {
    let config = CliConfig::parse();

    cli::logging::init_subscriber(&config.logging)?;

    let (rules, cart) = Fixture::from_files(&config.rules, &config.cart)?.into_parts()?;

    info!(lines = cart.len(), "cart loaded");

    let pipeline = DiscountPipeline::new(rules);

    let checkout = Checkout {
        voucher_code: config.voucher.as_deref(),
        card_issuer: config.card_issuer.as_deref(),
        customer_tier: config.tier.as_deref(),
    };

    if let Some(code) = checkout.voucher_code {
        if !pipeline.validate_voucher(code, checkout.customer_tier) {
            info!(code, "voucher not valid for this customer; continuing without it");
        }
    }

    let price = pipeline.price(&cart, &checkout)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    price.write_to(&mut handle)?;

    info!(message = %price.message(), "priced");

    Ok(())
}
