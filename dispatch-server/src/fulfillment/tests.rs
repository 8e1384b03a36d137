use shared::models::{LineItem, MonetaryShares, OrderType, PaymentMethod, SubOrderStatus};
use shared::util::now_millis;

use super::money::{items_subtotal, shares_for_subtotal, validate_line_item};
use super::transition::{TransitionCheck, check_transition};
use super::*;
use crate::db::models::{Order, SubOrder};

fn make_item(name: &str, price: f64, quantity: i32) -> LineItem {
    LineItem {
        item_id: None,
        name: name.to_string(),
        price,
        quantity,
    }
}

fn make_sub(status: SubOrderStatus) -> SubOrder {
    SubOrder {
        sub_order_id: "00000000abcdef".to_string(),
        shop_id: "shop:s1".to_string(),
        shop_name: "Test Shop".to_string(),
        owner_id: "actor:owner1".to_string(),
        items: vec![make_item("Noodles", 8.5, 2)],
        subtotal: 17.0,
        shares: MonetaryShares::default(),
        status,
        assigned_worker: None,
        dispatch_job: None,
        confirmation_code: None,
        code_expires_at: None,
        code_issued_at: None,
        delivered_at: None,
        receipt: None,
    }
}

fn make_order(order_type: OrderType, status: SubOrderStatus) -> Order {
    Order {
        id: None,
        order_number: None,
        customer: "actor:cust1".to_string(),
        customer_name: "Alice".to_string(),
        payment_method: PaymentMethod::Cash,
        gateway_order_ref: None,
        order_type,
        delivery_address: None,
        total_amount: 17.0,
        sub_orders: vec![make_sub(status)],
        is_cancelled: false,
        cancellation_reason: None,
        cancelled_at: None,
        special_instructions: None,
        version: 0,
        created_at: now_millis(),
    }
}

// ============================================================================
// Transition guards
// ============================================================================

#[test]
fn test_forward_path_is_allowed() {
    let cases = [
        (SubOrderStatus::Pending, SubOrderStatus::Confirmed),
        (SubOrderStatus::Confirmed, SubOrderStatus::Preparing),
        (SubOrderStatus::Preparing, SubOrderStatus::OutForDelivery),
        // Skipping stages forward is fine, the path is monotonic
        (SubOrderStatus::Pending, SubOrderStatus::Preparing),
        (SubOrderStatus::Confirmed, SubOrderStatus::OutForDelivery),
    ];
    for (from, to) in cases {
        let order = make_order(OrderType::Delivery, from);
        let check = check_transition(&order, &order.sub_orders[0], to).unwrap();
        assert_eq!(check, TransitionCheck::Apply, "{from} -> {to}");
    }
}

#[test]
fn test_backward_moves_are_rejected() {
    let order = make_order(OrderType::Delivery, SubOrderStatus::Preparing);
    let err = check_transition(&order, &order.sub_orders[0], SubOrderStatus::Confirmed);
    assert!(matches!(
        err,
        Err(FulfillmentError::InvalidTransition { .. })
    ));
    let err = check_transition(&order, &order.sub_orders[0], SubOrderStatus::Pending);
    assert!(matches!(
        err,
        Err(FulfillmentError::InvalidTransition { .. })
    ));
}

#[test]
fn test_locked_statuses_reject_everything_but_reapply() {
    for locked in [
        SubOrderStatus::OutForDelivery,
        SubOrderStatus::Rejected,
        SubOrderStatus::Delivered,
        SubOrderStatus::Cancelled,
    ] {
        let order = make_order(OrderType::Delivery, locked);
        let sub = &order.sub_orders[0];

        // Idempotent re-application is accepted
        assert_eq!(
            check_transition(&order, sub, locked).unwrap(),
            TransitionCheck::Reapply
        );

        // Every other target is rejected
        for target in [
            SubOrderStatus::Pending,
            SubOrderStatus::Confirmed,
            SubOrderStatus::Preparing,
            SubOrderStatus::OutForDelivery,
            SubOrderStatus::Delivered,
            SubOrderStatus::Rejected,
            SubOrderStatus::Cancelled,
        ] {
            if target == locked {
                continue;
            }
            assert!(
                matches!(
                    check_transition(&order, sub, target),
                    Err(FulfillmentError::InvalidTransition { .. })
                ),
                "{locked} -> {target} must be rejected"
            );
        }
    }
}

#[test]
fn test_pickup_orders_never_go_out_for_delivery() {
    for from in [
        SubOrderStatus::Pending,
        SubOrderStatus::Confirmed,
        SubOrderStatus::Preparing,
    ] {
        let order = make_order(OrderType::Pickup, from);
        let err = check_transition(&order, &order.sub_orders[0], SubOrderStatus::OutForDelivery);
        assert!(
            matches!(err, Err(FulfillmentError::InvalidTransition { .. })),
            "pickup {from} -> out-for-delivery must be rejected"
        );
    }
}

#[test]
fn test_cancelled_is_unreachable_through_status_entry_point() {
    let order = make_order(OrderType::Delivery, SubOrderStatus::Pending);
    let err = check_transition(&order, &order.sub_orders[0], SubOrderStatus::Cancelled);
    assert!(matches!(
        err,
        Err(FulfillmentError::InvalidTransition { .. })
    ));
}

#[test]
fn test_rejection_branch_open_from_unlocked_statuses() {
    for from in [
        SubOrderStatus::Pending,
        SubOrderStatus::Confirmed,
        SubOrderStatus::Preparing,
    ] {
        let order = make_order(OrderType::Delivery, from);
        assert_eq!(
            check_transition(&order, &order.sub_orders[0], SubOrderStatus::Rejected).unwrap(),
            TransitionCheck::Apply
        );
    }
}

// ============================================================================
// Money
// ============================================================================

#[test]
fn test_items_subtotal_rounds_to_cents() {
    let items = vec![make_item("A", 3.33, 3), make_item("B", 0.1, 2)];
    // 9.99 + 0.20
    assert_eq!(items_subtotal(&items), 10.19);
}

#[test]
fn test_shares_are_derived_from_subtotal() {
    let shares = shares_for_subtotal(100.0);
    assert_eq!(shares.owner_share, 70.0);
    assert_eq!(shares.worker_share, 80.0);
    assert_eq!(shares.platform_fee, 20.0);
    assert_eq!(shares.payment_fee, 2.0);
}

#[test]
fn test_shares_round_half_up() {
    // 33.33 * 0.70 = 23.331 -> 23.33, * 0.02 = 0.6666 -> 0.67
    let shares = shares_for_subtotal(33.33);
    assert_eq!(shares.owner_share, 23.33);
    assert_eq!(shares.payment_fee, 0.67);
}

#[test]
fn test_line_item_validation() {
    assert!(validate_line_item(&make_item("ok", 5.0, 1)).is_ok());
    assert!(validate_line_item(&make_item("neg", -1.0, 1)).is_err());
    assert!(validate_line_item(&make_item("zero-qty", 5.0, 0)).is_err());
    assert!(validate_line_item(&make_item("nan", f64::NAN, 1)).is_err());
}

// ============================================================================
// Receipt
// ============================================================================

#[test]
fn test_receipt_number_format() {
    let sub = make_sub(SubOrderStatus::Confirmed);
    let receipt = build_receipt(Some(42), &sub, now_millis());
    assert_eq!(receipt.number, "R-42-abcdef");
    assert_eq!(receipt.subtotal, 17.0);
    assert_eq!(receipt.items.len(), 1);

    let unnumbered = build_receipt(None, &sub, now_millis());
    assert_eq!(unnumbered.number, "R-NA-abcdef");
}

// ============================================================================
// Credential window helpers
// ============================================================================

#[test]
fn test_has_live_code_window() {
    let now = now_millis();
    let mut sub = make_sub(SubOrderStatus::OutForDelivery);
    assert!(!sub.has_live_code(now));

    sub.confirmation_code = Some("1234".to_string());
    sub.code_expires_at = Some(now + 1000);
    assert!(sub.has_live_code(now));

    sub.code_expires_at = Some(now - 1);
    assert!(!sub.has_live_code(now));

    sub.clear_code();
    assert!(sub.confirmation_code.is_none());
    assert!(sub.code_expires_at.is_none());
    assert!(sub.code_issued_at.is_none());
}
