use super::{OrderManager, OrderStore};
use crate::reports::RangeQuery;
use rust_decimal::Decimal;
use shared::models::order::{
    ItemStatus, NewOrder, OrderType, OrderUpdate, PaymentMethod, PaymentStatus, SettleRequest,
};
use shared::PosError;
use std::collections::HashSet;
use std::sync::Arc;

fn test_manager() -> OrderManager {
    OrderManager::new(Arc::new(OrderStore::new()))
}

fn dine_in(table: &str) -> NewOrder {
    NewOrder {
        order_type: OrderType::DineIn,
        table_number: Some(table.to_string()),
        ..Default::default()
    }
}

fn parcel(name: &str, packaging_fee: &str) -> NewOrder {
    NewOrder {
        order_type: OrderType::Parcel,
        customer_name: Some(name.to_string()),
        customer_phone: Some("9880012345".to_string()),
        packaging_fee: Some(packaging_fee.parse().unwrap()),
        ..Default::default()
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ========================================================================
// Creation and validation
// ========================================================================

#[test]
fn create_assigns_ids_numbers_and_zeroed_totals() {
    let manager = test_manager();
    let first = manager.create_order(dine_in("3")).unwrap();
    let second = manager.create_order(parcel("Asha", "10")).unwrap();

    assert_eq!(first.order_number, "1001");
    assert_eq!(second.order_number, "1002");
    assert_eq!(first.subtotal, Decimal::ZERO);
    assert_eq!(first.total_amount, Decimal::ZERO);
    assert_eq!(first.payment_status, PaymentStatus::Unpaid);
    // Packaging fee flows into the total from the start
    assert_eq!(second.total_amount, dec("10.00"));

    assert_eq!(manager.get_order_by_number("1002").unwrap().id, second.id);
}

#[test]
fn each_manager_instance_gets_a_fresh_epoch() {
    let a = test_manager();
    let b = test_manager();
    assert!(!a.epoch().is_empty());
    assert_ne!(a.epoch(), b.epoch());
}

#[test]
fn presence_checks_reject_incomplete_orders() {
    let manager = test_manager();
    let no_table = NewOrder {
        order_type: OrderType::DineIn,
        ..Default::default()
    };
    assert!(matches!(
        manager.create_order(no_table),
        Err(PosError::Validation(_))
    ));

    let no_name = NewOrder {
        order_type: OrderType::Parcel,
        ..Default::default()
    };
    assert!(matches!(
        manager.create_order(no_name),
        Err(PosError::Validation(_))
    ));
}

// ========================================================================
// Billing invariant across item mutations
// ========================================================================

#[test]
fn totals_track_every_item_mutation() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("3")).unwrap();

    let item = manager
        .add_item(order.id, 11, 2, dec("150.00"), None)
        .unwrap();
    let order = manager.get_order(order.id).unwrap();
    assert_eq!(order.subtotal, dec("300.00"));
    assert_eq!(order.tax, dec("15.00"));
    assert_eq!(order.total_amount, dec("315.00"));

    let second = manager
        .add_item(order.id, 12, 1, dec("50"), Some("less spicy".into()))
        .unwrap();
    let order = manager.get_order(order.id).unwrap();
    assert_eq!(order.subtotal, dec("350.00"));
    assert_eq!(order.tax, dec("17.50"));
    assert_eq!(order.total_amount, dec("367.50"));

    manager.update_quantity(item.id, 1).unwrap();
    let order = manager.get_order(order.id).unwrap();
    assert_eq!(order.subtotal, dec("200.00"));
    assert_eq!(order.total_amount, dec("210.00"));

    manager.remove_item(second.id).unwrap();
    let order = manager.get_order(order.id).unwrap();
    assert_eq!(order.subtotal, dec("150.00"));
    assert_eq!(order.tax, dec("7.50"));
    assert_eq!(order.total_amount, dec("157.50"));
}

#[test]
fn quantity_update_accepts_any_integer() {
    // Quantity bounds live in the ordering clients, not the core
    let manager = test_manager();
    let order = manager.create_order(dine_in("1")).unwrap();
    let item = manager.add_item(order.id, 5, 2, dec("20"), None).unwrap();

    manager.update_quantity(item.id, 0).unwrap();
    assert_eq!(manager.get_order(order.id).unwrap().subtotal, Decimal::ZERO);

    manager.update_quantity(item.id, -1).unwrap();
    assert_eq!(
        manager.get_order(order.id).unwrap().subtotal,
        dec("-20.00")
    );
}

#[test]
fn add_item_rejects_zero_quantity_and_unknown_order() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("1")).unwrap();
    assert!(matches!(
        manager.add_item(order.id, 5, 0, dec("20"), None),
        Err(PosError::Validation(_))
    ));
    assert!(matches!(
        manager.add_item(999, 5, 1, dec("20"), None),
        Err(PosError::NotFound(_))
    ));
}

#[test]
fn removing_unknown_item_changes_nothing() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("4")).unwrap();
    manager.add_item(order.id, 8, 1, dec("99.99"), None).unwrap();
    let before = manager.get_order(order.id).unwrap();

    assert!(matches!(
        manager.remove_item(12345),
        Err(PosError::NotFound(_))
    ));
    assert_eq!(manager.get_order(order.id).unwrap(), before);
}

#[test]
fn packaging_fee_change_rederives_total() {
    let manager = test_manager();
    let order = manager.create_order(parcel("Ravi", "0")).unwrap();
    manager.add_item(order.id, 3, 1, dec("100"), None).unwrap();

    let updated = manager
        .update_order(
            order.id,
            OrderUpdate {
                packaging_fee: Some(dec("12.50")),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.subtotal, dec("100.00"));
    assert_eq!(updated.tax, dec("5.00"));
    assert_eq!(updated.total_amount, dec("117.50"));
}

// ========================================================================
// KOT and bill transitions
// ========================================================================

#[test]
fn kot_moves_only_pending_items() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("2")).unwrap();
    manager.add_item(order.id, 1, 1, dec("10"), None).unwrap();
    manager.add_item(order.id, 2, 1, dec("20"), None).unwrap();

    let ticket = manager.print_kot(order.id).unwrap();
    assert_eq!(ticket.printed.len(), 2);
    // Printed set is the pre-transition state
    assert!(ticket.printed.iter().all(|i| i.is_pending()));
    assert!(ticket
        .items
        .iter()
        .all(|i| i.status == ItemStatus::KotPrinted));

    // Second call with no new items is a no-op
    let again = manager.print_kot(order.id).unwrap();
    assert!(again.is_empty());
    assert_eq!(again.items.len(), 2);

    // A late item is the only thing the next ticket carries
    let late = manager.add_item(order.id, 3, 1, dec("5"), None).unwrap();
    let third = manager.print_kot(order.id).unwrap();
    assert_eq!(third.printed.len(), 1);
    assert_eq!(third.printed[0].id, late.id);
}

#[test]
fn bill_requires_kot_first() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("6")).unwrap();
    manager.add_item(order.id, 1, 1, dec("45"), None).unwrap();

    let err = manager.print_bill(order.id).unwrap_err();
    assert!(matches!(err, PosError::Conflict(_)));
    assert_eq!(err.status_code().as_u16(), 409);

    manager.print_kot(order.id).unwrap();
    let items = manager.print_bill(order.id).unwrap();
    assert!(items.iter().all(|i| i.status == ItemStatus::Completed));

    // Re-invoking after completion stays successful
    let items = manager.print_bill(order.id).unwrap();
    assert!(items.iter().all(|i| i.status == ItemStatus::Completed));
}

#[test]
fn print_endpoints_404_unknown_orders() {
    let manager = test_manager();
    assert!(matches!(manager.print_kot(77), Err(PosError::NotFound(_))));
    assert!(matches!(manager.print_bill(77), Err(PosError::NotFound(_))));
}

// ========================================================================
// Settlement
// ========================================================================

#[test]
fn split_settlement_records_both_amounts() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("9")).unwrap();
    manager.add_item(order.id, 1, 1, dec("95.24"), None).unwrap();
    // subtotal 95.24 + tax 4.76 = 100.00
    assert_eq!(manager.get_order(order.id).unwrap().total_amount, dec("100.00"));

    let settled = manager
        .settle_payment(
            order.id,
            SettleRequest::split("TXN-881", dec("60"), dec("40")),
        )
        .unwrap();
    assert_eq!(settled.payment_status, PaymentStatus::Paid);
    assert_eq!(settled.payment_method, Some(PaymentMethod::Split));
    assert_eq!(settled.bank_reference.as_deref(), Some("TXN-881"));
    assert_eq!(settled.cash_amount, Some(dec("60.00")));
    assert_eq!(settled.bank_amount, Some(dec("40.00")));
}

#[test]
fn resettling_overwrites_the_disposition() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("9")).unwrap();
    manager
        .settle_payment(
            order.id,
            SettleRequest::split("TXN-1", dec("60"), dec("40")),
        )
        .unwrap();

    let settled = manager
        .settle_payment(order.id, SettleRequest::cash())
        .unwrap();
    assert_eq!(settled.payment_method, Some(PaymentMethod::Cash));
    assert_eq!(settled.bank_reference, None);
    assert_eq!(settled.cash_amount, None);
    assert_eq!(settled.bank_amount, None);
    assert_eq!(settled.payment_status, PaymentStatus::Paid);
}

#[test]
fn free_table_flow_marks_order_refunded() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("12")).unwrap();
    let item = manager.add_item(order.id, 1, 2, dec("30"), None).unwrap();

    manager.remove_item(item.id).unwrap();
    let order = manager
        .update_order(
            order.id,
            OrderUpdate {
                payment_status: Some(PaymentStatus::Refunded),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(order.is_refunded());
    assert_eq!(order.total_amount, Decimal::ZERO);
}

// ========================================================================
// Concurrency
// ========================================================================

#[test]
fn concurrent_creates_never_reuse_an_order_number() {
    let manager = test_manager();

    std::thread::scope(|s| {
        for t in 0..8 {
            let manager = &manager;
            s.spawn(move || {
                for i in 0..50 {
                    manager.create_order(dine_in(&format!("{t}-{i}"))).unwrap();
                }
            });
        }
    });

    let numbers: HashSet<String> = manager
        .list_orders()
        .into_iter()
        .map(|o| o.order_number)
        .collect();
    assert_eq!(numbers.len(), 400);
    assert_eq!(manager.store().order_count(), 400);
}

#[test]
fn concurrent_item_adds_keep_totals_consistent() {
    let manager = test_manager();
    let order = manager.create_order(dine_in("7")).unwrap();
    let order_id = order.id;

    std::thread::scope(|s| {
        for _ in 0..8 {
            let manager = &manager;
            s.spawn(move || {
                for _ in 0..25 {
                    manager.add_item(order_id, 1, 1, dec("10.00"), None).unwrap();
                }
            });
        }
    });

    // Each add recalculates under the same write lock, so the final
    // totals must reflect every line exactly once.
    assert_eq!(manager.items_for_order(order_id).len(), 200);
    let order = manager.get_order(order_id).unwrap();
    assert_eq!(order.subtotal, dec("2000.00"));
    assert_eq!(order.tax, dec("100.00"));
    assert_eq!(order.total_amount, dec("2100.00"));
}

// ========================================================================
// Listing and reports
// ========================================================================

#[test]
fn range_listing_is_inclusive_and_newest_first() {
    let manager = test_manager();
    let a = manager.create_order(dine_in("1")).unwrap();
    let b = manager.create_order(dine_in("2")).unwrap();
    let c = manager.create_order(dine_in("3")).unwrap();

    let listed = manager.list_orders_in_range(a.created_at, c.created_at);
    assert_eq!(listed.len(), 3);
    // Creation can land in the same millisecond; ids break the tie
    assert_eq!(listed[0].id, c.id);
    assert_eq!(listed[1].id, b.id);
    assert_eq!(listed[2].id, a.id);

    let all = manager.list_orders();
    assert_eq!(all.first().unwrap().id, c.id);
    assert_eq!(all.last().unwrap().id, a.id);
}

#[test]
fn sales_report_filters_by_method() {
    let manager = test_manager();
    let cash = manager.create_order(dine_in("1")).unwrap();
    manager.add_item(cash.id, 1, 1, dec("100"), None).unwrap();
    manager.settle_payment(cash.id, SettleRequest::cash()).unwrap();

    let bank = manager.create_order(dine_in("2")).unwrap();
    manager.add_item(bank.id, 1, 1, dec("200"), None).unwrap();
    manager
        .settle_payment(bank.id, SettleRequest::bank("TXN-5"))
        .unwrap();

    // Open order: listed by range, never counted as revenue
    manager.create_order(dine_in("3")).unwrap();

    let query = RangeQuery::new(0, i64::MAX);
    let summary = manager.sales_report(&query);
    assert_eq!(summary.orders, 2);
    assert_eq!(summary.revenue, dec("315.00"));
    assert_eq!(summary.cash_revenue, dec("105.00"));
    assert_eq!(summary.bank_revenue, dec("210.00"));

    let cash_only = manager.sales_report(&query.clone().with_method(PaymentMethod::Cash));
    assert_eq!(cash_only.orders, 1);
    assert_eq!(cash_only.revenue, dec("105.00"));
}
