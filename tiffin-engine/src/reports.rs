//! Sales reporting queries
//!
//! The core exposes range queries plus a payment-method filter; any CSV
//! or dashboard rendering happens in the layers above.

use crate::orders::money::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::order::{Order, PaymentMethod};

/// Report query: inclusive creation-time range, optional method filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Range start (UTC millis, inclusive)
    pub start: i64,
    /// Range end (UTC millis, inclusive)
    pub end: i64,
    /// Keep only orders settled with this method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
}

impl RangeQuery {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            method: None,
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }
}

/// Aggregate over the settled orders of a range
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SalesSummary {
    /// Number of settled orders counted
    pub orders: u64,
    /// Total settled revenue
    pub revenue: Decimal,
    pub cash_revenue: Decimal,
    pub bank_revenue: Decimal,
    pub split_revenue: Decimal,
    pub average_order_value: Decimal,
}

/// Apply the method filter of a query to an already range-filtered list
pub fn filter_orders(orders: Vec<Order>, query: &RangeQuery) -> Vec<Order> {
    match query.method {
        None => orders,
        Some(method) => orders
            .into_iter()
            .filter(|o| o.payment_method == Some(method))
            .collect(),
    }
}

/// Summarize settled (PAID) orders; unpaid and refunded orders are listed
/// by the range query but never counted as revenue
pub fn sales_summary(orders: &[Order]) -> SalesSummary {
    let mut summary = SalesSummary::default();

    for order in orders.iter().filter(|o| o.is_paid()) {
        summary.orders += 1;
        summary.revenue += order.total_amount;
        match order.payment_method {
            Some(PaymentMethod::Cash) => summary.cash_revenue += order.total_amount,
            Some(PaymentMethod::Bank) => summary.bank_revenue += order.total_amount,
            Some(PaymentMethod::Split) => summary.split_revenue += order.total_amount,
            None => {}
        }
    }

    if summary.orders > 0 {
        summary.average_order_value =
            round_money(summary.revenue / Decimal::from(summary.orders));
    }
    summary
}
