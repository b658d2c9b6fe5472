//! Money calculation using rust_decimal for precision
//!
//! The billing calculator is a pure function over an order's current item
//! set. All arithmetic is `Decimal`; every derived figure is rounded to
//! 2 decimal places before it is stored, so totals never drift at the
//! cent level.

use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::order::{Order, OrderItem};
use shared::util::now_millis;

/// Rounding for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Flat tax rate applied to the subtotal (5%)
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Round a monetary value to storage precision
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Line total for one item: unit price x quantity
pub fn line_total(item: &OrderItem) -> Decimal {
    round_money(item.unit_price * Decimal::from(item.quantity))
}

/// Subtotal over an item set
pub fn subtotal(items: &[OrderItem]) -> Decimal {
    items.iter().map(line_total).sum()
}

/// Tax on a subtotal at the flat rate
pub fn tax_for(subtotal: Decimal) -> Decimal {
    round_money(subtotal * TAX_RATE)
}

/// Re-derive an order's monetary fields from its current item set
///
/// Upholds the invariant `total_amount == subtotal + tax + packaging_fee`
/// after every item mutation. Also bumps `updated_at`.
pub fn recalculate(order: &mut Order, items: &[OrderItem]) {
    order.subtotal = subtotal(items);
    order.tax = tax_for(order.subtotal);
    order.total_amount = order.subtotal + order.tax + order.packaging_fee;
    order.updated_at = now_millis();
}
