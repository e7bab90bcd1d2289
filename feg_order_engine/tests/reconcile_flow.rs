use chrono::Utc;
use feg_common::{Money, Secret};
use feg_order_engine::{
    checkout::{compute_signature, EnvSecretSource, SecretChain, StoreSecretSource, VerificationError, WebhookVerifier},
    db_types::{CheckoutSessionUpdate, OrderStatusType, PaymentStatus, ProductVariant, SessionId, SessionStatus},
    events::{notification_hooks, EventHandlers},
    helpers::is_valid_order_number,
    traits::{OrderManagement, OrderReconciliation, SecretStore},
    OrderQueryApi,
    ReconcileOutcome,
    ReconciliationApi,
    SqliteDatabase,
};
use serde_json::json;
use support::{
    fakes::{RecordingInventory, RecordingNotifier, Sent},
    prepare_env::{setup, tear_down},
};

mod support;

const SECRET: &str = "whsec_reconcile_flow_test";
const SECRET_NAME: &str = "STRIPE_WEBHOOK_SECRET";

type Api = ReconciliationApi<SqliteDatabase, RecordingInventory>;

struct Harness {
    db: SqliteDatabase,
    inventory: RecordingInventory,
    notifier: RecordingNotifier,
    verifier: WebhookVerifier<SecretChain>,
    api: Api,
}

async fn harness(notifier: RecordingNotifier) -> Harness {
    let db = setup().await;
    db.store_secret(SECRET_NAME, &Secret::new(SECRET.to_string())).await.unwrap();
    db.set_stock("Total Essential", ProductVariant::TotalEssential, 10).await.unwrap();
    let inventory = RecordingInventory::new(db.clone());
    let handlers = EventHandlers::new(10, notification_hooks(notifier.clone()));
    let producers = handlers.producers();
    handlers.start_handlers();
    let api = ReconciliationApi::new(db.clone(), inventory.clone(), producers);
    let chain = SecretChain::new().with_source(StoreSecretSource::new(db.clone())).with_source(EnvSecretSource);
    let verifier = WebhookVerifier::new(chain).with_secret_name(SECRET_NAME);
    Harness { db, inventory, notifier, verifier, api }
}

fn completed_body(session_id: &str, items: &str) -> Vec<u8> {
    json!({
        "id": "evt_test_1",
        "object": "event",
        "type": "checkout.session.completed",
        "livemode": false,
        "data": {"object": {
            "id": session_id,
            "object": "checkout.session",
            "amount_total": 5998,
            "currency": "usd",
            "customer_details": {"email": "a@b.com", "name": "Alice Liddell"},
            "payment_intent": "pi_flow_1",
            "payment_status": "paid",
            "metadata": {
                "order_items": items,
                "customer_name": "Alice Liddell",
                "shipping_address": r#"{"line1":"1 Main St","city":"Austin","state":"TX","postal_code":"78701"}"#
            }
        }}
    })
    .to_string()
    .into_bytes()
}

fn sign(body: &[u8]) -> String {
    let ts = Utc::now().timestamp();
    format!("t={ts},v1={}", compute_signature(SECRET, ts, body))
}

async fn deliver(h: &Harness, body: &[u8]) -> ReconcileOutcome {
    let event = h.verifier.verify(body, Some(&sign(body))).await.expect("Signature should verify");
    h.api.reconcile(event).await.expect("Reconciliation should succeed")
}

const ITEMS: &str = r#"[{"id":"p1","name":"Total Essential","quantity":2,"price":29.99}]"#;

#[tokio::test]
async fn end_to_end_completed_checkout() {
    let h = harness(RecordingNotifier::default()).await;
    let body = completed_body("cs_test_e2e", ITEMS);
    let outcome = deliver(&h, &body).await;
    let ReconcileOutcome::OrderCreated(details) = outcome else { panic!("Expected a new order") };

    let order = &details.order;
    assert_eq!(order.total, Money::from(5998));
    assert_eq!(order.total.to_string(), "59.98");
    assert_eq!(order.currency, "USD");
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.customer_email, "a@b.com");
    assert!(order.customer_id.is_some());
    assert_eq!(order.shipping_address.0.city, "Austin");
    assert_eq!(order.billing_address.0, order.shipping_address.0);
    assert!(order.test_mode);

    let items = h.db.fetch_order_items(order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].unit_price.to_string(), "29.99");
    assert_eq!(items[0].total_price.to_string(), "59.98");

    let calls = h.inventory.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].product_name, "Total Essential");
    assert_eq!(calls[0].quantity, 2);
    assert_eq!(h.db.fetch_stock("Total Essential", ProductVariant::TotalEssential).await.unwrap(), Some(8));

    let session = h.db.fetch_checkout_session(&SessionId::from("cs_test_e2e")).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Complete);
    assert_eq!(session.payment_intent.as_deref(), Some("pi_flow_1"));

    let sent = h.notifier.wait_for(2).await;
    assert_eq!(sent.len(), 2);
    let number = order.order_number.to_string();
    assert!(sent.contains(&Sent::Confirmation { order_number: number.clone(), email: "a@b.com".into(), items: 1 }));
    assert!(sent.contains(&Sent::AdminAlert { order_number: number, customer: "Alice Liddell".into() }));
    tear_down(h.db).await;
}

#[tokio::test]
async fn replays_are_idempotent() {
    let h = harness(RecordingNotifier::default()).await;
    let body = completed_body("cs_test_replay", ITEMS);
    let first = deliver(&h, &body).await;
    let first_order = first.order().cloned().unwrap();
    for _ in 0..4 {
        let outcome = deliver(&h, &body).await;
        assert_eq!(outcome, ReconcileOutcome::AlreadyProcessed(first_order.clone()));
    }
    let session_id = SessionId::from("cs_test_replay");
    assert_eq!(h.db.count_orders_for_session(&session_id).await.unwrap(), 1);
    assert_eq!(h.db.fetch_order_items(first_order.id).await.unwrap().len(), 1);
    assert_eq!(h.inventory.calls().len(), 1);
    let _ = h.notifier.wait_for(2).await;
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(h.notifier.sent().len(), 2);
    tear_down(h.db).await;
}

#[tokio::test]
async fn malformed_items_still_create_an_order() {
    let h = harness(RecordingNotifier::default()).await;
    let body = completed_body("cs_test_bad_items", "[{\"id\": \"p1\", \"name\": ");
    let ReconcileOutcome::OrderCreated(details) = deliver(&h, &body).await else { panic!("Expected a new order") };
    assert!(details.items.is_empty());
    assert!(h.db.fetch_order_items(details.order.id).await.unwrap().is_empty());
    assert!(h.inventory.calls().is_empty());
    tear_down(h.db).await;
}

#[tokio::test]
async fn notification_failures_do_not_affect_the_order() {
    let h = harness(RecordingNotifier::failing()).await;
    let body = completed_body("cs_test_mail_down", ITEMS);
    let outcome = deliver(&h, &body).await;
    assert!(matches!(outcome, ReconcileOutcome::OrderCreated(_)));
    assert_eq!(h.notifier.wait_for(2).await.len(), 2);
    let order = h.db.fetch_order_by_session_id(&SessionId::from("cs_test_mail_down")).await.unwrap();
    assert!(order.is_some());
    tear_down(h.db).await;
}

#[tokio::test]
async fn expired_unknown_session_is_a_no_op() {
    let h = harness(RecordingNotifier::default()).await;
    let body = json!({
        "type": "checkout.session.expired",
        "data": {"object": {"id": "cs_never_seen"}}
    })
    .to_string();
    let outcome = deliver(&h, body.as_bytes()).await;
    assert_eq!(outcome, ReconcileOutcome::SessionExpired { updated: false });
    tear_down(h.db).await;
}

#[tokio::test]
async fn expiry_does_not_touch_completed_sessions() {
    let h = harness(RecordingNotifier::default()).await;
    let _ = deliver(&h, &completed_body("cs_test_done", ITEMS)).await;
    let body = json!({"type": "checkout.session.expired", "data": {"object": {"id": "cs_test_done"}}}).to_string();
    let outcome = deliver(&h, body.as_bytes()).await;
    assert_eq!(outcome, ReconcileOutcome::SessionExpired { updated: false });
    let session = h.db.fetch_checkout_session(&SessionId::from("cs_test_done")).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Complete);
    tear_down(h.db).await;
}

#[tokio::test]
async fn payment_failure_marks_the_session() {
    let h = harness(RecordingNotifier::default()).await;
    let open = CheckoutSessionUpdate {
        session_id: SessionId::from("cs_test_pf"),
        customer_email: "a@b.com".into(),
        amount_total: Money::from(5998),
        currency: "USD".into(),
        payment_intent: Some("pi_flow_1".into()),
        metadata: json!({}),
        status: SessionStatus::Open,
        payment_status: PaymentStatus::Pending,
        test_mode: true,
    };
    h.db.upsert_checkout_session(open).await.unwrap();
    let body = json!({
        "type": "payment_intent.payment_failed",
        "data": {"object": {
            "id": "pi_flow_1", "amount": 5998, "currency": "usd",
            "last_payment_error": {"message": "Your card has insufficient funds."}
        }}
    })
    .to_string();
    let outcome = deliver(&h, body.as_bytes()).await;
    assert_eq!(outcome, ReconcileOutcome::PaymentFailed { updated: true });
    let session = h.db.fetch_checkout_session(&SessionId::from("cs_test_pf")).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.failure_reason.as_deref(), Some("Your card has insufficient funds."));
    let sent = h.notifier.wait_for(1).await;
    assert!(sent.contains(&Sent::PaymentFailure {
        payment_intent: "pi_flow_1".into(),
        reason: "Your card has insufficient funds.".into()
    }));
    tear_down(h.db).await;
}

#[tokio::test]
async fn tampered_payloads_never_reach_the_store() {
    let h = harness(RecordingNotifier::default()).await;
    let body = completed_body("cs_test_tampered", ITEMS);
    let signature = sign(&body);
    let tampered = String::from_utf8(body).unwrap().replace("5998", "1");
    let err = h.verifier.verify(tampered.as_bytes(), Some(&signature)).await.unwrap_err();
    assert!(matches!(err, VerificationError::Signature(_)));
    let order = h.db.fetch_order_by_session_id(&SessionId::from("cs_test_tampered")).await.unwrap();
    assert!(order.is_none());
    tear_down(h.db).await;
}

#[tokio::test]
async fn secret_comes_from_the_store() {
    let h = harness(RecordingNotifier::default()).await;
    let secret = h.db.fetch_secret(SECRET_NAME).await.unwrap().unwrap();
    assert_eq!(secret.reveal(), SECRET);
    assert!(h.db.fetch_secret("NOT_A_SECRET").await.unwrap().is_none());
    tear_down(h.db).await;
}

#[tokio::test]
async fn order_lookup() {
    let h = harness(RecordingNotifier::default()).await;
    let ReconcileOutcome::OrderCreated(created) = deliver(&h, &completed_body("cs_test_lookup", ITEMS)).await else {
        panic!("Expected a new order")
    };
    let query = OrderQueryApi::new(h.db.clone());
    let by_session = query.order_for_session(&SessionId::from("cs_test_lookup")).await.unwrap().unwrap();
    assert_eq!(by_session, created);
    let by_number = query.order_by_number(&created.order.order_number).await.unwrap().unwrap();
    assert_eq!(by_number.order.id, created.order.id);
    assert!(query.order_for_session(&SessionId::from("cs_nope")).await.unwrap().is_none());
    tear_down(h.db).await;
}

#[tokio::test]
async fn late_payment_failure_does_not_touch_completed_sessions() {
    let h = harness(RecordingNotifier::default()).await;
    let _ = deliver(&h, &completed_body("cs_test_late_fail", ITEMS)).await;
    let body = json!({
        "type": "payment_intent.payment_failed",
        "data": {"object": {"id": "pi_flow_1", "amount": 5998, "currency": "usd"}}
    })
    .to_string();
    let outcome = deliver(&h, body.as_bytes()).await;
    assert_eq!(outcome, ReconcileOutcome::PaymentFailed { updated: false });
    let session = h.db.fetch_checkout_session(&SessionId::from("cs_test_late_fail")).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Complete);
    tear_down(h.db).await;
}

fn with_order_number(body: &[u8], order_number: &str) -> Vec<u8> {
    let mut value: serde_json::Value = serde_json::from_slice(body).unwrap();
    value["data"]["object"]["metadata"]["order_number"] = json!(order_number);
    value.to_string().into_bytes()
}

#[tokio::test]
async fn sessions_sharing_a_declared_order_number_both_get_orders() {
    let h = harness(RecordingNotifier::default()).await;
    let declared = "FEG-1718000000000-ABC123";
    let first = deliver(&h, &with_order_number(&completed_body("cs_test_number_a", ITEMS), declared)).await;
    let ReconcileOutcome::OrderCreated(first) = first else { panic!("Expected a new order") };
    assert_eq!(first.order.order_number.as_str(), declared);

    let body = with_order_number(&completed_body("cs_test_number_b", ITEMS), declared);
    let ReconcileOutcome::OrderCreated(second) = deliver(&h, &body).await else { panic!("Expected a new order") };
    assert_ne!(second.order.order_number.as_str(), declared);
    assert!(is_valid_order_number(second.order.order_number.as_str()));
    assert_eq!(second.items.len(), 1);
    for _ in 0..3 {
        let outcome = deliver(&h, &body).await;
        assert_eq!(outcome, ReconcileOutcome::AlreadyProcessed(second.order.clone()));
    }
    assert_eq!(h.db.count_orders_for_session(&SessionId::from("cs_test_number_a")).await.unwrap(), 1);
    assert_eq!(h.db.count_orders_for_session(&SessionId::from("cs_test_number_b")).await.unwrap(), 1);
    assert_eq!(h.inventory.calls().len(), 2);
    tear_down(h.db).await;
}

#[tokio::test]
async fn oversized_quantities_record_the_order_without_items() {
    let h = harness(RecordingNotifier::default()).await;
    let items = r#"[{"id":"p1","name":"Total Essential","quantity":92233720368547758,"price":1000.0}]"#;
    let outcome = deliver(&h, &completed_body("cs_test_oversized", items)).await;
    let ReconcileOutcome::OrderCreated(details) = outcome else { panic!("Expected a new order") };
    assert!(details.items.is_empty());
    assert_eq!(details.order.total, Money::from(5998));
    assert!(h.db.fetch_order_items(details.order.id).await.unwrap().is_empty());
    assert!(h.inventory.calls().is_empty());
    assert_eq!(h.db.fetch_stock("Total Essential", ProductVariant::TotalEssential).await.unwrap(), Some(10));
    tear_down(h.db).await;
}
