//! End-to-end delivery flow against an in-memory database.
//!
//! Exercises the full three-actor coordination: placement, the status
//! lifecycle, dispatch broadcast/accept, confirmation codes and the
//! regeneration scan.

use std::sync::Arc;
use std::time::Duration;

use dispatch_server::core::{Config, ServerState};
use dispatch_server::credential::{CodeRegenScheduler, LogCodeSender};
use dispatch_server::db::DbService;
use dispatch_server::db::models::{Actor, Shop};
use dispatch_server::db::repository::{ActorRepository, OrderRepository, ShopRepository};
use dispatch_server::fulfillment::{CartItem, FulfillmentError, PlaceOrderRequest};
use dispatch_server::notify::ChannelConnection;
use shared::message::NotificationEvent;
use shared::models::{ActorRole, DeliveryAddress, OrderType, PaymentMethod, SubOrderStatus};
use shared::util::now_millis;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

async fn setup() -> ServerState {
    let db = DbService::memory().await.unwrap().db;
    let config = Config::from_env();
    ServerState::with_db(&config, db)
}

async fn setup_with_job_cap(cap: usize) -> ServerState {
    let db = DbService::memory().await.unwrap().db;
    let mut config = Config::from_env();
    config.max_jobs_per_worker = cap;
    ServerState::with_db(&config, db)
}

async fn seed_actor(state: &ServerState, name: &str, role: ActorRole, available: bool) -> Actor {
    ActorRepository::new(state.get_db())
        .create(Actor {
            id: None,
            full_name: name.to_string(),
            email: None,
            role,
            is_available: available,
            location: None,
            created_at: now_millis(),
        })
        .await
        .unwrap()
}

async fn seed_shop(state: &ServerState, name: &str, owner: &Actor) -> Shop {
    ShopRepository::new(state.get_db())
        .create(Shop {
            id: None,
            name: name.to_string(),
            owner: owner.id_str(),
            created_at: now_millis(),
        })
        .await
        .unwrap()
}

fn connect(state: &ServerState, actor: &Actor) -> UnboundedReceiver<NotificationEvent> {
    let (conn, rx) = ChannelConnection::new();
    state.bus.register_connection(&actor.id_str(), conn);
    rx
}

fn delivery_request(shop: &Shop) -> PlaceOrderRequest {
    PlaceOrderRequest {
        cart_items: vec![
            CartItem {
                shop_id: shop.id_str(),
                item_id: None,
                name: "Noodles".to_string(),
                price: 8.5,
                quantity: 2,
            },
            CartItem {
                shop_id: shop.id_str(),
                item_id: None,
                name: "Tea".to_string(),
                price: 2.0,
                quantity: 1,
            },
        ],
        payment_method: PaymentMethod::Cash,
        order_type: OrderType::Delivery,
        delivery_address: Some(DeliveryAddress {
            text: "12 Harbour Road".to_string(),
            latitude: None,
            longitude: None,
        }),
        gateway_order_ref: None,
        special_instructions: None,
    }
}

fn drain(rx: &mut UnboundedReceiver<NotificationEvent>) -> Vec<NotificationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_two_worker_dispatch_race() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let w1 = seed_actor(&state, "W1", ActorRole::Worker, true).await;
    let w2 = seed_actor(&state, "W2", ActorRole::Worker, true).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;

    let mut owner_rx = connect(&state, &owner);
    let mut customer_rx = connect(&state, &customer);
    let mut w1_rx = connect(&state, &w1);
    let mut w2_rx = connect(&state, &w2);

    // Place: owner is notified, sub-order pending with frozen shares
    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    assert_eq!(order.sub_orders.len(), 1);
    let sub = &order.sub_orders[0];
    assert_eq!(sub.status, SubOrderStatus::Pending);
    assert_eq!(sub.subtotal, 19.0);
    assert_eq!(sub.shares.owner_share, 13.3);
    assert_eq!(sub.shares.payment_fee, 0.38);
    assert!(order.order_number.is_none());

    let owner_events = drain(&mut owner_rx);
    assert_eq!(owner_events.len(), 1);
    assert_eq!(owner_events[0].kind(), "new-order");

    let order_id = order.id_str();
    let sub_id = sub.sub_order_id.clone();

    // Confirm: order number allocated, receipt frozen
    let order = state
        .fulfillment
        .request_status_change(&owner.id_str(), &order_id, &sub_id, SubOrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(order.order_number, Some(1));
    let receipt = order.sub_orders[0].receipt.clone().unwrap();
    assert!(receipt.number.starts_with("R-1-"));

    // Preparing: receipt untouched
    let order = state
        .fulfillment
        .request_status_change(&owner.id_str(), &order_id, &sub_id, SubOrderStatus::Preparing)
        .await
        .unwrap();
    assert_eq!(order.sub_orders[0].receipt.as_ref().unwrap(), &receipt);

    // Out for delivery: code issued, job broadcast to both workers
    let order = state
        .fulfillment
        .request_status_change(
            &owner.id_str(),
            &order_id,
            &sub_id,
            SubOrderStatus::OutForDelivery,
        )
        .await
        .unwrap();
    let sub = &order.sub_orders[0];
    assert_eq!(sub.status, SubOrderStatus::OutForDelivery);
    assert!(sub.dispatch_job.is_some());
    let code = sub.confirmation_code.clone().unwrap();
    assert_eq!(code.len(), 4);

    let w1_events = drain(&mut w1_rx);
    let w2_events = drain(&mut w2_rx);
    assert_eq!(w1_events.len(), 1);
    assert_eq!(w1_events[0].kind(), "job-offer");
    assert_eq!(w2_events.len(), 1);

    // Customer saw every status change, the last one carrying the code
    let customer_events = drain(&mut customer_rx);
    assert_eq!(customer_events.len(), 3);
    match customer_events.last().unwrap() {
        NotificationEvent::StatusChanged(p) => {
            assert_eq!(p.status, SubOrderStatus::OutForDelivery);
            assert_eq!(p.code.as_deref(), Some(code.as_str()));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let job_id = match &w1_events[0] {
        NotificationEvent::JobOffer(offer) => offer.job_id.clone(),
        other => panic!("unexpected event: {:?}", other),
    };

    // Both workers see the open offer
    assert_eq!(state.dispatch.list_offers(&w1.id_str()).await.unwrap().len(), 1);
    assert_eq!(state.dispatch.list_offers(&w2.id_str()).await.unwrap().len(), 1);

    // W1 accepts first, W2 loses the race
    let job = state.dispatch.accept(&w1.id_str(), &job_id).await.unwrap();
    assert_eq!(job.assigned_to.as_deref(), Some(w1.id_str().as_str()));
    let lost = state.dispatch.accept(&w2.id_str(), &job_id).await;
    assert!(matches!(lost, Err(FulfillmentError::JobAlreadyResolved(_))));

    // W2's local view drops the offer
    let w2_events = drain(&mut w2_rx);
    assert_eq!(w2_events.len(), 1);
    match &w2_events[0] {
        NotificationEvent::JobWithdrawn(p) => {
            assert_eq!(p.job_id, job_id);
            assert_eq!(p.taken_by, w1.id_str());
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Assignment recorded on the sub-order; status unchanged
    let order = state.fulfillment.get_order(&order_id).await.unwrap();
    let sub = &order.sub_orders[0];
    assert_eq!(sub.assigned_worker.as_deref(), Some(w1.id_str().as_str()));
    assert_eq!(sub.status, SubOrderStatus::OutForDelivery);

    // Wrong code fails; the right one delivers exactly once
    let bad = state.credentials.redeem(&order_id, &sub_id, "wrong").await;
    assert!(matches!(bad, Err(FulfillmentError::InvalidOrExpiredCredential)));

    let order = state.credentials.redeem(&order_id, &sub_id, &code).await.unwrap();
    let sub = &order.sub_orders[0];
    assert_eq!(sub.status, SubOrderStatus::Delivered);
    assert!(sub.delivered_at.is_some());
    assert!(sub.confirmation_code.is_none());
    assert!(sub.dispatch_job.is_none());

    // Not repeatable
    let again = state.credentials.redeem(&order_id, &sub_id, &code).await;
    assert!(matches!(again, Err(FulfillmentError::InvalidOrExpiredCredential)));

    // The terminal status is locked
    let locked = state
        .fulfillment
        .request_status_change(&owner.id_str(), &order_id, &sub_id, SubOrderStatus::Preparing)
        .await;
    assert!(matches!(locked, Err(FulfillmentError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_zero_candidate_job_served_by_late_joiner() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    // Worker exists but is off shift
    let worker = seed_actor(&state, "W1", ActorRole::Worker, false).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;
    let mut worker_rx = connect(&state, &worker);

    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    let order_id = order.id_str();
    let sub_id = order.sub_orders[0].sub_order_id.clone();

    let order = state
        .fulfillment
        .request_status_change(
            &owner.id_str(),
            &order_id,
            &sub_id,
            SubOrderStatus::OutForDelivery,
        )
        .await
        .unwrap();
    assert!(order.sub_orders[0].dispatch_job.is_some());

    // Nobody was offered anything yet
    assert!(drain(&mut worker_rx).is_empty());
    assert!(state.dispatch.list_offers(&worker.id_str()).await.unwrap().is_empty());

    // Worker comes on shift: the job is discovered without being recreated
    ActorRepository::new(state.get_db())
        .set_availability(&worker.id_str(), true)
        .await
        .unwrap();
    let offered = state.dispatch.on_worker_available(&worker.id_str()).await.unwrap();
    assert_eq!(offered, 1);

    let events = drain(&mut worker_rx);
    assert_eq!(events.len(), 1);
    let job_id = match &events[0] {
        NotificationEvent::JobOffer(offer) => offer.job_id.clone(),
        other => panic!("unexpected event: {:?}", other),
    };
    assert_eq!(
        job_id,
        order.sub_orders[0].dispatch_job.clone().unwrap()
    );

    // A second scan has nothing to add
    assert_eq!(state.dispatch.on_worker_available(&worker.id_str()).await.unwrap(), 0);

    // And the job is acceptable
    let job = state.dispatch.accept(&worker.id_str(), &job_id).await.unwrap();
    assert_eq!(job.assigned_to.as_deref(), Some(worker.id_str().as_str()));
}

#[tokio::test]
async fn test_concurrent_accepts_have_single_winner() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;
    let mut workers = Vec::new();
    for i in 0..4 {
        workers.push(seed_actor(&state, &format!("W{}", i), ActorRole::Worker, true).await);
    }

    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    let order_id = order.id_str();
    let sub_id = order.sub_orders[0].sub_order_id.clone();
    let order = state
        .fulfillment
        .request_status_change(
            &owner.id_str(),
            &order_id,
            &sub_id,
            SubOrderStatus::OutForDelivery,
        )
        .await
        .unwrap();
    let job_id = order.sub_orders[0].dispatch_job.clone().unwrap();

    let mut handles = Vec::new();
    for worker in &workers {
        let state = state.clone();
        let job_id = job_id.clone();
        let worker_id = worker.id_str();
        handles.push(tokio::spawn(async move {
            state.dispatch.accept(&worker_id, &job_id).await
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(FulfillmentError::JobAlreadyResolved(_)) => losers += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(losers, 3);

    // The recorded assignment matches the resolved job
    let order = state.fulfillment.get_order(&order_id).await.unwrap();
    let assigned = order.sub_orders[0].assigned_worker.clone().unwrap();
    assert!(workers.iter().any(|w| w.id_str() == assigned));
}

#[tokio::test]
async fn test_cancel_window() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let stranger = seed_actor(&state, "Eve", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;

    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    let order_id = order.id_str();

    // Only the customer may cancel
    let denied = state.fulfillment.cancel(&stranger.id_str(), &order_id, None).await;
    assert!(matches!(denied, Err(FulfillmentError::Forbidden(_))));

    let cancelled = state
        .fulfillment
        .cancel(&customer.id_str(), &order_id, Some("changed mind".to_string()))
        .await
        .unwrap();
    assert!(cancelled.is_cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("changed mind"));
    assert!(cancelled.cancelled_at.is_some());
    assert!(
        cancelled
            .sub_orders
            .iter()
            .all(|s| s.status == SubOrderStatus::Cancelled)
    );

    // Second cancel fails
    let again = state.fulfillment.cancel(&customer.id_str(), &order_id, None).await;
    assert!(matches!(again, Err(FulfillmentError::AlreadyCancelled(_))));

    // A fresh order past pending cannot be cancelled
    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    let order_id = order.id_str();
    let sub_id = order.sub_orders[0].sub_order_id.clone();
    state
        .fulfillment
        .request_status_change(&owner.id_str(), &order_id, &sub_id, SubOrderStatus::Confirmed)
        .await
        .unwrap();
    let closed = state.fulfillment.cancel(&customer.id_str(), &order_id, None).await;
    assert!(matches!(closed, Err(FulfillmentError::CancelWindowClosed)));
}

#[tokio::test]
async fn test_code_issue_is_idempotent_until_expiry() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;

    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    let order_id = order.id_str();
    let sub_id = order.sub_orders[0].sub_order_id.clone();

    // Customer-initiated issue before delivery even starts
    let first = state
        .credentials
        .issue_or_reissue(&customer.id_str(), &order_id, &sub_id)
        .await
        .unwrap();
    assert!(!first.existing);

    // Resend inside the validity window returns the identical code
    let second = state
        .credentials
        .issue_or_reissue(&customer.id_str(), &order_id, &sub_id)
        .await
        .unwrap();
    assert!(second.existing);
    assert_eq!(second.code, first.code);
    assert_eq!(second.expires_at, first.expires_at);

    // Force expiry, then a reissue mints a fresh code
    let repo = OrderRepository::new(state.get_db());
    let mut order = repo.find_by_id(&order_id).await.unwrap().unwrap();
    let expected = order.version;
    order.version += 1;
    order.sub_order_mut(&sub_id).unwrap().code_expires_at = Some(now_millis() - 1000);
    repo.save_versioned(&order, expected).await.unwrap().unwrap();

    let third = state
        .credentials
        .issue_or_reissue(&customer.id_str(), &order_id, &sub_id)
        .await
        .unwrap();
    assert!(!third.existing);
    assert!(third.expires_at > first.expires_at);

    // Only the order's customer may issue
    let denied = state
        .credentials
        .issue_or_reissue(&owner.id_str(), &order_id, &sub_id)
        .await;
    assert!(matches!(denied, Err(FulfillmentError::Forbidden(_))));
}

#[tokio::test]
async fn test_regeneration_scan_rotates_expired_codes() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;

    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    let order_id = order.id_str();
    let sub_id = order.sub_orders[0].sub_order_id.clone();

    let order = state
        .fulfillment
        .request_status_change(
            &owner.id_str(),
            &order_id,
            &sub_id,
            SubOrderStatus::OutForDelivery,
        )
        .await
        .unwrap();
    let original_code = order.sub_orders[0].confirmation_code.clone().unwrap();

    let scheduler = CodeRegenScheduler::new(
        state.get_db(),
        state.bus.clone(),
        Arc::new(LogCodeSender),
        120,
        Duration::from_secs(3600),
        CancellationToken::new(),
    );

    // Live code: nothing to do
    assert_eq!(scheduler.tick().await.unwrap(), 0);

    // Expire it, as if the 2-hour window lapsed mid-delivery
    let repo = OrderRepository::new(state.get_db());
    let mut stale = repo.find_by_id(&order_id).await.unwrap().unwrap();
    let expected = stale.version;
    stale.version += 1;
    stale.sub_order_mut(&sub_id).unwrap().code_expires_at = Some(now_millis() - 1000);
    repo.save_versioned(&stale, expected).await.unwrap().unwrap();

    assert_eq!(scheduler.tick().await.unwrap(), 1);
    let refreshed = repo.find_by_id(&order_id).await.unwrap().unwrap();
    let sub = &refreshed.sub_orders[0];
    assert!(sub.has_live_code(now_millis()));
    assert_ne!(sub.confirmation_code.as_deref(), Some(original_code.as_str()));

    // Delivered sub-orders are skipped even if a stale-looking code remains
    let code = sub.confirmation_code.clone().unwrap();
    state.credentials.redeem(&order_id, &sub_id, &code).await.unwrap();
    assert_eq!(scheduler.tick().await.unwrap(), 0);
}

#[tokio::test]
async fn test_pickup_hand_off_without_credential_flow() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;

    let mut req = delivery_request(&shop);
    req.order_type = OrderType::Pickup;
    req.delivery_address = None;
    let order = state
        .fulfillment
        .place_order(&customer.id_str(), req)
        .await
        .unwrap();
    let order_id = order.id_str();
    let sub_id = order.sub_orders[0].sub_order_id.clone();

    // Pickup orders never enter out-for-delivery
    let denied = state
        .fulfillment
        .request_status_change(
            &owner.id_str(),
            &order_id,
            &sub_id,
            SubOrderStatus::OutForDelivery,
        )
        .await;
    assert!(matches!(denied, Err(FulfillmentError::InvalidTransition { .. })));

    // The owner hands over directly: stamp, no code, no job
    let order = state
        .fulfillment
        .request_status_change(&owner.id_str(), &order_id, &sub_id, SubOrderStatus::Delivered)
        .await
        .unwrap();
    let sub = &order.sub_orders[0];
    assert_eq!(sub.status, SubOrderStatus::Delivered);
    assert!(sub.delivered_at.is_some());
    assert!(sub.confirmation_code.is_none());
    assert!(sub.dispatch_job.is_none());
    assert!(sub.assigned_worker.is_none());
}

#[tokio::test]
async fn test_worker_job_cap_blocks_second_accept() {
    let state = setup_with_job_cap(1).await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let worker = seed_actor(&state, "W1", ActorRole::Worker, true).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;

    let mut job_ids = Vec::new();
    for _ in 0..2 {
        let order = state
            .fulfillment
            .place_order(&customer.id_str(), delivery_request(&shop))
            .await
            .unwrap();
        let order_id = order.id_str();
        let sub_id = order.sub_orders[0].sub_order_id.clone();
        let order = state
            .fulfillment
            .request_status_change(
                &owner.id_str(),
                &order_id,
                &sub_id,
                SubOrderStatus::OutForDelivery,
            )
            .await
            .unwrap();
        job_ids.push(order.sub_orders[0].dispatch_job.clone().unwrap());
    }

    state.dispatch.accept(&worker.id_str(), &job_ids[0]).await.unwrap();
    let capped = state.dispatch.accept(&worker.id_str(), &job_ids[1]).await;
    assert!(matches!(capped, Err(FulfillmentError::WorkerAtCapacity(_))));

    // At capacity the late-join scan skips the worker too
    assert_eq!(state.dispatch.on_worker_available(&worker.id_str()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_order_number_allocated_once_across_sub_orders() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner1 = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let owner2 = seed_actor(&state, "Carol", ActorRole::Owner, false).await;
    let shop1 = seed_shop(&state, "Noodle Bar", &owner1).await;
    let shop2 = seed_shop(&state, "Tea House", &owner2).await;

    let mut req = delivery_request(&shop1);
    req.cart_items.push(CartItem {
        shop_id: shop2.id_str(),
        item_id: None,
        name: "Oolong".to_string(),
        price: 4.0,
        quantity: 1,
    });
    let order = state
        .fulfillment
        .place_order(&customer.id_str(), req)
        .await
        .unwrap();
    assert_eq!(order.sub_orders.len(), 2);
    let order_id = order.id_str();

    let first_sub = order
        .sub_orders
        .iter()
        .find(|s| s.owner_id == owner1.id_str())
        .unwrap()
        .sub_order_id
        .clone();
    let second_sub = order
        .sub_orders
        .iter()
        .find(|s| s.owner_id == owner2.id_str())
        .unwrap()
        .sub_order_id
        .clone();

    let order = state
        .fulfillment
        .request_status_change(&owner1.id_str(), &order_id, &first_sub, SubOrderStatus::Confirmed)
        .await
        .unwrap();
    let number = order.order_number.unwrap();

    // The second sub-order's confirmation reuses the order's number
    let order = state
        .fulfillment
        .request_status_change(&owner2.id_str(), &order_id, &second_sub, SubOrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(order.order_number, Some(number));

    // A second order gets the next number
    let order2 = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop1))
        .await
        .unwrap();
    let order2_id = order2.id_str();
    let sub2 = order2.sub_orders[0].sub_order_id.clone();
    let order2 = state
        .fulfillment
        .request_status_change(&owner1.id_str(), &order2_id, &sub2, SubOrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(order2.order_number, Some(number + 1));
}

#[tokio::test]
async fn test_owner_gate_on_status_changes() {
    let state = setup().await;
    let customer = seed_actor(&state, "Alice", ActorRole::Customer, false).await;
    let owner = seed_actor(&state, "Bob", ActorRole::Owner, false).await;
    let other_owner = seed_actor(&state, "Carol", ActorRole::Owner, false).await;
    let shop = seed_shop(&state, "Noodle Bar", &owner).await;

    let order = state
        .fulfillment
        .place_order(&customer.id_str(), delivery_request(&shop))
        .await
        .unwrap();
    let order_id = order.id_str();
    let sub_id = order.sub_orders[0].sub_order_id.clone();

    let denied = state
        .fulfillment
        .request_status_change(
            &other_owner.id_str(),
            &order_id,
            &sub_id,
            SubOrderStatus::Confirmed,
        )
        .await;
    assert!(matches!(denied, Err(FulfillmentError::Forbidden(_))));
}
