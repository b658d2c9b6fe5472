//! In-memory order store
//!
//! # State
//!
//! | Map | Key | Value |
//! |-----|-----|-------|
//! | `orders` | order id | [`Order`] |
//! | `items` | item id | [`OrderItem`] |
//! | `numbers` | order number | order id |
//!
//! The whole state sits behind a single `parking_lot::RwLock`; mutations
//! hold the write lock across their entire read-modify-write, so total
//! recalculation is atomic per mutation. Id and order-number assignment
//! use monotonic counters, never a live count - numbers stay unique under
//! concurrent creation and after deletions.
//!
//! The store is the authoritative source of truth for the process
//! lifetime; mirroring is strictly downstream of it.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use shared::models::order::{Order, OrderItem, OrderWithItems};
use shared::{PosError, PosResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Order numbers start above this base, first issue is 1001
const ORDER_NUMBER_BASE: u64 = 1000;

/// Mutable store state, guarded by the store lock
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) orders: HashMap<u64, Order>,
    pub(crate) items: HashMap<u64, OrderItem>,
    pub(crate) numbers: HashMap<String, u64>,
}

impl StoreState {
    /// All items belonging to an order, sorted by item id
    pub(crate) fn items_for(&self, order_id: u64) -> Vec<OrderItem> {
        let mut items: Vec<OrderItem> = self
            .items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        items
    }
}

/// In-memory order store with atomic sequence counters
#[derive(Debug, Default)]
pub struct OrderStore {
    state: RwLock<StoreState>,
    order_seq: AtomicU64,
    item_seq: AtomicU64,
    number_seq: AtomicU64,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Sequences ==========

    pub(crate) fn next_order_id(&self) -> u64 {
        self.order_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn next_item_id(&self) -> u64 {
        self.item_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Next human-readable order number
    pub(crate) fn next_order_number(&self) -> String {
        let n = self.number_seq.fetch_add(1, Ordering::SeqCst) + 1;
        (ORDER_NUMBER_BASE + n).to_string()
    }

    // ========== Locking ==========

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read()
    }

    // ========== Queries ==========

    pub fn get_order(&self, id: u64) -> PosResult<Order> {
        self.read()
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| PosError::not_found(format!("order {id}")))
    }

    pub fn get_order_by_number(&self, number: &str) -> PosResult<Order> {
        let state = self.read();
        state
            .numbers
            .get(number)
            .and_then(|id| state.orders.get(id))
            .cloned()
            .ok_or_else(|| PosError::not_found(format!("order number {number}")))
    }

    pub fn get_item(&self, id: u64) -> PosResult<OrderItem> {
        self.read()
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| PosError::not_found(format!("order item {id}")))
    }

    pub fn items_for_order(&self, order_id: u64) -> Vec<OrderItem> {
        self.read().items_for(order_id)
    }

    pub fn get_order_with_items(&self, id: u64) -> PosResult<OrderWithItems> {
        let state = self.read();
        let order = state
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| PosError::not_found(format!("order {id}")))?;
        let items = state.items_for(id);
        Ok(OrderWithItems { order, items })
    }

    /// All orders, newest first
    pub fn list_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.read().orders.values().cloned().collect();
        sort_newest_first(&mut orders);
        orders
    }

    /// Orders created within `[start, end]` (inclusive, UTC millis),
    /// newest first
    pub fn list_orders_in_range(&self, start: i64, end: i64) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .read()
            .orders
            .values()
            .filter(|o| o.created_at >= start && o.created_at <= end)
            .cloned()
            .collect();
        sort_newest_first(&mut orders);
        orders
    }

    pub fn order_count(&self) -> usize {
        self.read().orders.len()
    }
}

/// Newest first; id breaks same-millisecond ties
fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
