//! Pricing calculations over cart data.
//!
//! Pure functions, exact decimal arithmetic. Formatting into a currency
//! string is the rendering layer's job.

use rust_decimal::Decimal;

use super::types::CartLineItem;

/// Price of one line item: base price plus the delta of every selected
/// attribute. No selection means the base price alone.
#[must_use]
pub fn line_item_price(item: &CartLineItem) -> Decimal {
    item.product.price
        + item
            .selected_attributes
            .values()
            .map(|selected| selected.price)
            .sum::<Decimal>()
}

/// Total of the whole cart. Empty carts total zero.
#[must_use]
pub fn cart_total(items: &[CartLineItem]) -> Decimal {
    items.iter().map(line_item_price).sum()
}

/// Number of line items. Each add is one unit; this is not
/// quantity-weighted.
#[must_use]
pub fn item_count(items: &[CartLineItem]) -> usize {
    items.len()
}
