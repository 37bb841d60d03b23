//! Items

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use thiserror::Error;

/// Reasons a single line item cannot be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputIssue {
    /// Quantity was zero.
    #[error("quantity must be positive")]
    ZeroQuantity,

    /// List price was below zero.
    #[error("base price cannot be negative")]
    NegativeBasePrice,

    /// Current (marked down) price was below zero.
    #[error("current price cannot be negative")]
    NegativeCurrentPrice,
}

/// A line item that failed validation (index into the cart, issue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("line item {index} is invalid: {issue}")]
pub struct InvalidInput {
    /// Position of the offending line in the cart.
    pub index: usize,

    /// What was wrong with it.
    pub issue: InputIssue,
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    name: Option<String>,
    brand: String,
    category: String,
    base_price: Decimal,
    current_price: Decimal,
    quantity: u32,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        brand: impl Into<String>,
        category: impl Into<String>,
        base_price: Decimal,
        current_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            name: None,
            brand: brand.into(),
            category: category.into(),
            base_price,
            current_price,
            quantity,
        }
    }

    /// Attaches a display name, only used when rendering.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Brand
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Category
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Immutable list price for a single unit.
    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    /// Price for a single unit after any static markdowns.
    pub fn current_price(&self) -> Decimal {
        self.current_price
    }

    /// Number of units
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `base_price × quantity`, or `None` on overflow.
    pub fn base_total(&self) -> Option<Decimal> {
        self.base_price.checked_mul(Decimal::from(self.quantity))
    }

    /// `current_price × quantity`, or `None` on overflow.
    pub fn current_total(&self) -> Option<Decimal> {
        self.current_price.checked_mul(Decimal::from(self.quantity))
    }

    /// Checks the line can be priced.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputIssue`] found.
    pub fn validate(&self) -> Result<(), InputIssue> {
        if self.quantity == 0 {
            return Err(InputIssue::ZeroQuantity);
        }

        if self.base_price < Decimal::ZERO {
            return Err(InputIssue::NegativeBasePrice);
        }

        if self.current_price < Decimal::ZERO {
            return Err(InputIssue::NegativeCurrentPrice);
        }

        Ok(())
    }
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    items: Vec<LineItem>,
    currency: &'static Currency,
}

impl Cart {
    /// Create a new, empty cart.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a new cart with the given items.
    pub fn with_items(items: impl Into<Vec<LineItem>>, currency: &'static Currency) -> Self {
        Cart {
            items: items.into(),
            currency,
        }
    }

    /// Append a line. Lines for the same product are never merged.
    pub fn push(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Iterate over the lines in cart order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// The lines as a slice.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Get the number of lines in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Validate every line, stopping at the first bad one.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] naming the first line that cannot be priced.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        self.items
            .iter()
            .enumerate()
            .try_for_each(|(index, item)| {
                item.validate()
                    .map_err(|issue| InvalidInput { index, issue })
            })
    }

    /// Sum of `current_price × quantity` over every line, or `None` on overflow.
    pub fn original_price(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.current_total()?)
        })
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
