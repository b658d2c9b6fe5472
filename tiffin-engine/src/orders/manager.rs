//! OrderManager - order lifecycle, billing and settlement
//!
//! This module handles:
//! - Order creation and partial updates
//! - Item mutations (add / quantity change / removal) with atomic
//!   total recalculation
//! - KOT and bill print transitions
//! - Payment settlement
//! - Mirror notification after every successful mutation
//!
//! # Item status flow
//!
//! ```text
//! add_item            -> PENDING
//! print_kot           -> PENDING items become KOT_PRINTED
//! print_bill          -> all items become COMPLETED
//!                        (Conflict while anything is still PENDING)
//! settle_payment      -> order PAID, method/reference/split recorded
//! ```
//!
//! Transitions are one-directional; re-invoking a print only affects
//! items that have not advanced yet.

use super::money;
use super::store::OrderStore;
use crate::mirror::MirrorHandle;
use crate::reports::{self, RangeQuery, SalesSummary};
use rust_decimal::Decimal;
use shared::models::order::{
    ItemStatus, KotTicket, NewOrder, Order, OrderItem, OrderType, OrderUpdate, OrderWithItems,
    PaymentMethod, PaymentStatus, SettleRequest,
};
use shared::util::now_millis;
use shared::{PosError, PosResult};
use std::sync::Arc;

/// Order manager over the in-memory store
///
/// The `epoch` field is a unique identifier generated on each startup;
/// in-memory state does not survive a restart, so a changed epoch tells
/// downstream consumers to discard anything they derived from the old
/// process.
#[derive(Debug, Clone)]
pub struct OrderManager {
    store: Arc<OrderStore>,
    mirror: Option<MirrorHandle>,
    /// Process instance epoch - unique ID generated on startup
    epoch: String,
}

impl OrderManager {
    /// Create a manager over the given store
    pub fn new(store: Arc<OrderStore>) -> Self {
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "OrderManager started with new epoch");
        Self {
            store,
            mirror: None,
            epoch,
        }
    }

    /// Attach the mirror worker's notification handle
    pub fn set_mirror(&mut self, mirror: MirrorHandle) {
        self.mirror = Some(mirror);
    }

    /// Get the process epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<OrderStore> {
        &self.store
    }

    /// Queue an order for mirroring; never blocks, never fails the caller
    fn notify_mirror(&self, order_id: u64) {
        if let Some(mirror) = &self.mirror {
            mirror.notify(order_id);
        }
    }

    // ========== Order Operations ==========

    /// Create an order with zeroed totals
    ///
    /// Presence checks only: dine-in needs a table number, parcel needs a
    /// customer name. The packaging fee is fixed at creation and flows
    /// into the total from the start.
    pub fn create_order(&self, new: NewOrder) -> PosResult<Order> {
        match new.order_type {
            OrderType::DineIn if new.table_number.is_none() => {
                return Err(PosError::validation("dine-in order requires table_number"));
            }
            OrderType::Parcel if new.customer_name.is_none() => {
                return Err(PosError::validation("parcel order requires customer_name"));
            }
            _ => {}
        }

        let id = self.store.next_order_id();
        let order_number = self.store.next_order_number();
        let packaging_fee = money::round_money(new.packaging_fee.unwrap_or(Decimal::ZERO));
        let now = now_millis();
        let order = Order {
            id,
            order_number: order_number.clone(),
            order_type: new.order_type,
            table_number: new.table_number,
            customer_name: new.customer_name,
            customer_phone: new.customer_phone,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            packaging_fee,
            total_amount: packaging_fee,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            bank_reference: None,
            cash_amount: None,
            bank_amount: None,
            note: new.note,
            created_at: now,
            updated_at: now,
        };

        {
            let mut state = self.store.write();
            state.numbers.insert(order_number.clone(), id);
            state.orders.insert(id, order.clone());
        }

        tracing::info!(order_id = id, order_number = %order_number, order_type = ?order.order_type, "Order created");
        self.notify_mirror(id);
        Ok(order)
    }

    /// Apply a partial update to an order
    ///
    /// A packaging-fee change re-derives the total from the current item
    /// set. Setting `payment_status` to `REFUNDED` is how the free-table
    /// flow closes out an abandoned order.
    pub fn update_order(&self, id: u64, update: OrderUpdate) -> PosResult<Order> {
        let order = {
            let mut state = self.store.write();
            let items = state.items_for(id);
            let order = state
                .orders
                .get_mut(&id)
                .ok_or_else(|| PosError::not_found(format!("order {id}")))?;

            if let Some(table_number) = update.table_number {
                order.table_number = Some(table_number);
            }
            if let Some(customer_name) = update.customer_name {
                order.customer_name = Some(customer_name);
            }
            if let Some(customer_phone) = update.customer_phone {
                order.customer_phone = Some(customer_phone);
            }
            if let Some(note) = update.note {
                order.note = Some(note);
            }
            if let Some(payment_status) = update.payment_status {
                order.payment_status = payment_status;
            }
            if let Some(packaging_fee) = update.packaging_fee {
                order.packaging_fee = money::round_money(packaging_fee);
                money::recalculate(order, &items);
            } else {
                order.updated_at = now_millis();
            }
            order.clone()
        };

        tracing::info!(order_id = id, "Order updated");
        self.notify_mirror(id);
        Ok(order)
    }

    // ========== Item Lifecycle ==========

    /// Add an item to an order and recalculate its totals
    pub fn add_item(
        &self,
        order_id: u64,
        menu_item_id: u64,
        quantity: i32,
        unit_price: Decimal,
        instructions: Option<String>,
    ) -> PosResult<OrderItem> {
        if quantity < 1 {
            return Err(PosError::validation(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }

        let item = {
            let mut state = self.store.write();
            if !state.orders.contains_key(&order_id) {
                return Err(PosError::not_found(format!("order {order_id}")));
            }

            let item = OrderItem {
                id: self.store.next_item_id(),
                order_id,
                menu_item_id,
                quantity,
                unit_price: money::round_money(unit_price),
                status: ItemStatus::Pending,
                instructions,
                created_at: now_millis(),
            };
            state.items.insert(item.id, item.clone());

            let items = state.items_for(order_id);
            if let Some(order) = state.orders.get_mut(&order_id) {
                money::recalculate(order, &items);
            }
            item
        };

        tracing::info!(order_id, item_id = item.id, menu_item_id, quantity, "Item added");
        self.notify_mirror(order_id);
        Ok(item)
    }

    /// Overwrite an item's quantity and recalculate the owning order
    ///
    /// Any integer is accepted here; quantity bounds live in the ordering
    /// clients, not the core.
    pub fn update_quantity(&self, item_id: u64, quantity: i32) -> PosResult<OrderItem> {
        let (item, order_id) = {
            let mut state = self.store.write();
            let item = state
                .items
                .get_mut(&item_id)
                .ok_or_else(|| PosError::not_found(format!("order item {item_id}")))?;
            item.quantity = quantity;
            let item = item.clone();
            let order_id = item.order_id;

            let items = state.items_for(order_id);
            if let Some(order) = state.orders.get_mut(&order_id) {
                money::recalculate(order, &items);
            }
            (item, order_id)
        };

        tracing::info!(order_id, item_id, quantity, "Item quantity updated");
        self.notify_mirror(order_id);
        Ok(item)
    }

    /// Remove an item and recalculate the owning order
    ///
    /// Unknown item ids leave every order total untouched.
    pub fn remove_item(&self, item_id: u64) -> PosResult<()> {
        let order_id = {
            let mut state = self.store.write();
            let item = state
                .items
                .remove(&item_id)
                .ok_or_else(|| PosError::not_found(format!("order item {item_id}")))?;
            let order_id = item.order_id;

            let items = state.items_for(order_id);
            if let Some(order) = state.orders.get_mut(&order_id) {
                money::recalculate(order, &items);
            }
            order_id
        };

        tracing::info!(order_id, item_id, "Item removed");
        self.notify_mirror(order_id);
        Ok(())
    }

    // ========== Print Transitions ==========

    /// Print a kitchen order ticket
    ///
    /// Transitions exactly the items that are `PENDING` at call time and
    /// returns them in their pre-transition state alongside the full
    /// post-transition set. A second consecutive call with no new items
    /// is a no-op with an empty printed set.
    pub fn print_kot(&self, order_id: u64) -> PosResult<KotTicket> {
        let ticket = {
            let mut state = self.store.write();
            if !state.orders.contains_key(&order_id) {
                return Err(PosError::not_found(format!("order {order_id}")));
            }

            let mut printed: Vec<OrderItem> = Vec::new();
            for item in state.items.values_mut() {
                if item.order_id == order_id && item.is_pending() {
                    printed.push(item.clone());
                    item.status = ItemStatus::KotPrinted;
                }
            }
            printed.sort_by_key(|i| i.id);

            KotTicket {
                printed,
                items: state.items_for(order_id),
            }
        };

        tracing::info!(order_id, printed = ticket.printed.len(), "KOT printed");
        if !ticket.is_empty() {
            self.notify_mirror(order_id);
        }
        Ok(ticket)
    }

    /// Print the customer bill
    ///
    /// Fails with `Conflict` while any item is still `PENDING` (the
    /// kitchen has to see everything before the bill goes out). On
    /// success every item becomes `COMPLETED`; returns the full set.
    pub fn print_bill(&self, order_id: u64) -> PosResult<Vec<OrderItem>> {
        let items = {
            let mut state = self.store.write();
            if !state.orders.contains_key(&order_id) {
                return Err(PosError::not_found(format!("order {order_id}")));
            }

            let pending = state
                .items
                .values()
                .filter(|i| i.order_id == order_id && i.is_pending())
                .count();
            if pending > 0 {
                return Err(PosError::conflict(format!(
                    "order {order_id} has {pending} pending item(s), print KOT first"
                )));
            }

            for item in state.items.values_mut() {
                if item.order_id == order_id {
                    item.status = ItemStatus::Completed;
                }
            }
            state.items_for(order_id)
        };

        tracing::info!(order_id, items = items.len(), "Bill printed");
        self.notify_mirror(order_id);
        Ok(items)
    }

    // ========== Settlement ==========

    /// Record the final payment disposition on an order
    ///
    /// Sets `payment_status` to `PAID` and stores the method; bank and
    /// split settlements keep the bank reference, split additionally
    /// keeps both amounts. Re-settling overwrites the previous
    /// disposition. The split amounts are recorded as sent - the ordering
    /// client is responsible for making them add up to the total.
    pub fn settle_payment(&self, order_id: u64, req: SettleRequest) -> PosResult<Order> {
        let order = {
            let mut state = self.store.write();
            let order = state
                .orders
                .get_mut(&order_id)
                .ok_or_else(|| PosError::not_found(format!("order {order_id}")))?;

            order.payment_status = PaymentStatus::Paid;
            order.payment_method = Some(req.method);
            order.bank_reference = match req.method {
                PaymentMethod::Cash => None,
                PaymentMethod::Bank | PaymentMethod::Split => req.bank_reference,
            };
            (order.cash_amount, order.bank_amount) = match req.method {
                PaymentMethod::Split => (
                    req.cash_amount.map(money::round_money),
                    req.bank_amount.map(money::round_money),
                ),
                _ => (None, None),
            };
            order.updated_at = now_millis();
            order.clone()
        };

        tracing::info!(order_id, method = ?order.payment_method, "Payment settled");
        self.notify_mirror(order_id);
        Ok(order)
    }

    // ========== Queries ==========

    pub fn get_order(&self, id: u64) -> PosResult<Order> {
        self.store.get_order(id)
    }

    pub fn get_order_by_number(&self, number: &str) -> PosResult<Order> {
        self.store.get_order_by_number(number)
    }

    pub fn get_order_with_items(&self, id: u64) -> PosResult<OrderWithItems> {
        self.store.get_order_with_items(id)
    }

    pub fn get_item(&self, id: u64) -> PosResult<OrderItem> {
        self.store.get_item(id)
    }

    pub fn items_for_order(&self, order_id: u64) -> Vec<OrderItem> {
        self.store.items_for_order(order_id)
    }

    pub fn list_orders(&self) -> Vec<Order> {
        self.store.list_orders()
    }

    pub fn list_orders_in_range(&self, start: i64, end: i64) -> Vec<Order> {
        self.store.list_orders_in_range(start, end)
    }

    // ========== Reporting ==========

    /// Orders matching a report query, newest first
    pub fn orders_in_range(&self, query: &RangeQuery) -> Vec<Order> {
        reports::filter_orders(self.store.list_orders_in_range(query.start, query.end), query)
    }

    /// Sales summary over the settled orders in a range
    pub fn sales_report(&self, query: &RangeQuery) -> SalesSummary {
        reports::sales_summary(&self.orders_in_range(query))
    }
}
