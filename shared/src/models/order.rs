//! Order and order item models
//!
//! Monetary fields are `rust_decimal::Decimal` and serialize as decimal
//! strings, so the wire representation never goes through binary floats.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order type - how the order reaches the customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Seated at a table
    #[default]
    DineIn,
    /// Takeaway parcel
    Parcel,
}

/// Order item preparation status
///
/// Transitions are one-directional: `Pending -> KotPrinted -> Completed`.
/// No status ever reverts once advanced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Pending,
    KotPrinted,
    Completed,
}

/// Order payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
}

/// Payment method recorded at settlement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Bank,
    /// Part cash, part bank transfer
    Split,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (assigned by the store)
    pub id: u64,
    /// Human-readable order number, unique per process lifetime
    pub order_number: String,
    pub order_type: OrderType,
    /// Table number (dine-in only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    /// Customer name (parcel only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Customer phone (parcel only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Sum of item line totals
    pub subtotal: Decimal,
    /// Flat 5% of subtotal
    pub tax: Decimal,
    /// Flat fee set at creation (e.g. parcel packaging), defaults to 0
    pub packaging_fee: Decimal,
    /// subtotal + tax + packaging_fee
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    /// Bank transaction reference (bank/split settlements)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    /// Cash portion of a split settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_amount: Option<Decimal>,
    /// Bank portion of a split settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Creation timestamp (UTC millis)
    pub created_at: i64,
    /// Last update timestamp (UTC millis)
    pub updated_at: i64,
}

impl Order {
    /// Check if the order has been settled
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn is_refunded(&self) -> bool {
        self.payment_status == PaymentStatus::Refunded
    }
}

/// Order item - one menu line on an order
///
/// `unit_price` is a snapshot taken when the item is added; later menu
/// price changes never affect an open order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Item ID (assigned by the store)
    pub id: u64,
    /// Owning order ID
    pub order_id: u64,
    /// Menu item reference
    pub menu_item_id: u64,
    pub quantity: i32,
    /// Unit price snapshot
    pub unit_price: Decimal,
    pub status: ItemStatus,
    /// Special preparation instructions for the kitchen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Creation timestamp (UTC millis)
    pub created_at: i64,
}

impl OrderItem {
    pub fn is_pending(&self) -> bool {
        self.status == ItemStatus::Pending
    }
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewOrder {
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Defaults to 0 when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Partial order update payload
///
/// `None` fields are left untouched. A `packaging_fee` change re-derives
/// the order total.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Used by the free-table flow to mark an order refunded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

/// Settle payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleRequest {
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_amount: Option<Decimal>,
}

impl SettleRequest {
    pub fn cash() -> Self {
        Self {
            method: PaymentMethod::Cash,
            bank_reference: None,
            cash_amount: None,
            bank_amount: None,
        }
    }

    pub fn bank(reference: impl Into<String>) -> Self {
        Self {
            method: PaymentMethod::Bank,
            bank_reference: Some(reference.into()),
            cash_amount: None,
            bank_amount: None,
        }
    }

    pub fn split(reference: impl Into<String>, cash: Decimal, bank: Decimal) -> Self {
        Self {
            method: PaymentMethod::Split,
            bank_reference: Some(reference.into()),
            cash_amount: Some(cash),
            bank_amount: Some(bank),
        }
    }
}

/// Result of a KOT print
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KotTicket {
    /// Items that were `Pending` at call time, in their pre-transition state
    pub printed: Vec<OrderItem>,
    /// Full item set after the transition
    pub items: Vec<OrderItem>,
}

impl KotTicket {
    /// True when the print transitioned nothing
    pub fn is_empty(&self) -> bool {
        self.printed.is_empty()
    }
}

/// Order together with its items (mirror snapshot / query result)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
