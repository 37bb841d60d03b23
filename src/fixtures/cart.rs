//! Cart Fixtures

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, parse_amount, parse_currency},
    items::{Cart, LineItem},
};

/// Cart as written in YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartFixture {
    /// ISO currency code (e.g., "INR")
    pub currency: String,

    /// Lines in cart order
    #[serde(default)]
    pub items: Vec<LineItemFixture>,
}

/// Line item fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItemFixture {
    /// Display name
    pub name: Option<String>,

    /// Brand
    pub brand: String,

    /// Category
    pub category: String,

    /// List price per unit (e.g., "1000")
    pub base_price: String,

    /// Marked down price per unit; defaults to the base price
    pub current_price: Option<String>,

    /// Number of units
    pub quantity: u32,
}

impl CartFixture {
    /// Parse a cart fixture from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// Read and parse a cart fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }
}

impl TryFrom<LineItemFixture> for LineItem {
    type Error = FixtureError;

    fn try_from(fixture: LineItemFixture) -> Result<Self, Self::Error> {
        let base_price = parse_amount(&fixture.base_price)?;
        let current_price = match fixture.current_price.as_deref() {
            Some(price) => parse_amount(price)?,
            None => base_price,
        };

        let item = LineItem::new(
            fixture.brand,
            fixture.category,
            base_price,
            current_price,
            fixture.quantity,
        );

        Ok(match fixture.name {
            Some(name) => item.with_name(name),
            None => item,
        })
    }
}

impl TryFrom<CartFixture> for Cart {
    type Error = FixtureError;

    fn try_from(fixture: CartFixture) -> Result<Self, Self::Error> {
        let currency = parse_currency(&fixture.currency)?;

        let items = fixture
            .items
            .into_iter()
            .map(LineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::with_items(items, currency))
    }
}
