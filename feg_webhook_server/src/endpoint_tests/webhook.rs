use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use feg_common::Money;
use feg_order_engine::{
    checkout::{SecretChain, StaticSecretSource, WebhookVerifier},
    db_types::{Customer, ProductVariant, SessionId},
    events::EventProducers,
    traits::{InsertOrderResult, ReconciliationDbError},
    ReconciliationApi,
};
use serde_json::json;

use super::helpers::{post_request, sample_items, sample_order, signature_for, TEST_SECRET};
use crate::{
    endpoint_tests::mocks::{MockInventory, MockOrderStore},
    webhook_routes::StripeWebhookRoute,
};

const JSON: (&str, &str) = ("content-type", "application/json");

fn configure(db: MockOrderStore, inventory: MockInventory, chain: SecretChain) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReconciliationApi::new(db, inventory, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(WebhookVerifier::new(chain)))
            .service(
                web::scope("/webhooks").service(StripeWebhookRoute::<MockOrderStore, MockInventory, SecretChain>::new()),
            );
    }
}

fn secrets() -> SecretChain {
    SecretChain::new().with_source(StaticSecretSource::new(TEST_SECRET))
}

fn completed_body() -> String {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "livemode": false,
        "data": {"object": {
            "id": "cs_test_1",
            "amount_total": 5998,
            "currency": "usd",
            "customer_details": {"email": "a@b.com", "name": "Alice Liddell"},
            "payment_intent": "pi_1",
            "payment_status": "paid",
            "metadata": {
                "order_items": r#"[{"id":"p1","name":"Total Essential","quantity":2,"price":29.99}]"#
            }
        }}
    })
    .to_string()
}

fn customer() -> Customer {
    Customer {
        id: 1,
        email: "a@b.com".into(),
        first_name: "Alice".into(),
        last_name: "Liddell".into(),
        phone: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn post(
    body: &str,
    headers: &[(&str, &str)],
    db: MockOrderStore,
    inventory: MockInventory,
) -> (StatusCode, String) {
    post_request("/webhooks/stripe", body, headers, configure(db, inventory, secrets())).await.expect("Request failed")
}

#[actix_web::test]
async fn completed_checkout_creates_an_order() {
    let body = completed_body();
    let signature = signature_for(&body);
    let mut db = MockOrderStore::new();
    db.expect_fetch_or_create_customer().times(1).returning(|_| Ok(customer()));
    db.expect_upsert_checkout_session()
        .times(1)
        .returning(|_| Err(ReconciliationDbError::DatabaseError("session table is read-only".into())));
    db.expect_insert_order()
        .withf(|o| o.session_id == SessionId::from("cs_test_1") && o.total == Money::from(5998) && o.currency == "USD")
        .times(1)
        .returning(|_| Ok(InsertOrderResult::Inserted(sample_order())));
    db.expect_insert_order_items()
        .withf(|id, items| *id == 1 && items.len() == 1 && items[0].quantity == 2)
        .times(1)
        .returning(|_, _| Ok(sample_items()));
    let mut inventory = MockInventory::new();
    inventory
        .expect_decrement_stock()
        .withf(|a| a.product_name == "Total Essential" && a.variant == ProductVariant::TotalEssential && a.quantity == 2)
        .times(1)
        .returning(|_| Ok(true));
    let (status, body) = post(&body, &[JSON, ("stripe-signature", signature.as_str())], db, inventory).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn replayed_checkout_is_acknowledged() {
    let body = completed_body();
    let signature = signature_for(&body);
    let mut db = MockOrderStore::new();
    db.expect_fetch_or_create_customer().returning(|_| Ok(customer()));
    db.expect_upsert_checkout_session()
        .returning(|_| Err(ReconciliationDbError::DatabaseError("not needed".into())));
    db.expect_insert_order().times(1).returning(|_| Ok(InsertOrderResult::AlreadyExists(sample_order())));
    // No item inserts and no stock changes on a replay
    let (status, body) = post(&body, &[JSON, ("stripe-signature", signature.as_str())], db, MockInventory::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn order_insert_failure_asks_for_a_retry() {
    let body = completed_body();
    let signature = signature_for(&body);
    let mut db = MockOrderStore::new();
    db.expect_fetch_or_create_customer().returning(|_| Ok(customer()));
    db.expect_upsert_checkout_session()
        .returning(|_| Err(ReconciliationDbError::DatabaseError("disk I/O error".into())));
    db.expect_insert_order().returning(|_| Err(ReconciliationDbError::DatabaseError("disk I/O error".into())));
    let (status, body) = post(&body, &[JSON, ("stripe-signature", signature.as_str())], db, MockInventory::new()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Error creating order record"}"#);
}

#[actix_web::test]
async fn tampered_body_is_rejected() {
    let body = completed_body();
    let signature = signature_for(&body);
    let tampered = body.replace("5998", "1");
    // The store mock has no expectations, so any call into it would fail the test
    let headers = [JSON, ("stripe-signature", signature.as_str())];
    let (status, body) = post(&tampered, &headers, MockOrderStore::new(), MockInventory::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"error":"Webhook signature verification failed: No signatures found matching the expected signature for payload"}"#
    );
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let (status, body) = post(&completed_body(), &[JSON], MockOrderStore::new(), MockInventory::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Webhook signature verification failed: No signature header was provided"}"#);
}

#[actix_web::test]
async fn malformed_signature_is_rejected() {
    let headers = [JSON, ("stripe-signature", "v1=deadbeef")];
    let (status, body) = post(&completed_body(), &headers, MockOrderStore::new(), MockInventory::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Unable to extract timestamp and signatures from header"));
}

#[actix_web::test]
async fn non_json_content_is_rejected() {
    let body = completed_body();
    let signature = signature_for(&body);
    let headers = [("content-type", "text/plain"), ("stripe-signature", signature.as_str())];
    let (status, body) = post(&body, &headers, MockOrderStore::new(), MockInventory::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid content type. Expected application/json, but got text/plain"}"#);
}

#[actix_web::test]
async fn json_with_charset_is_accepted() {
    let body = json!({"type": "customer.created", "data": {"object": {"id": "cus_1"}}}).to_string();
    let signature = signature_for(&body);
    let headers = [("content-type", "application/json; charset=utf-8"), ("stripe-signature", signature.as_str())];
    let (status, body) = post(&body, &headers, MockOrderStore::new(), MockInventory::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn missing_secret_is_a_server_error() {
    let body = completed_body();
    let signature = signature_for(&body);
    let cfg = configure(MockOrderStore::new(), MockInventory::new(), SecretChain::new());
    let headers = [JSON, ("stripe-signature", signature.as_str())];
    let (status, body) = post_request("/webhooks/stripe", &body, &headers, cfg).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"The webhook secret is not configured"}"#);
}

#[actix_web::test]
async fn expired_unknown_session_is_acknowledged() {
    let body = json!({"type": "checkout.session.expired", "data": {"object": {"id": "cs_gone"}}}).to_string();
    let signature = signature_for(&body);
    let mut db = MockOrderStore::new();
    db.expect_expire_checkout_session()
        .withf(|id| id.as_str() == "cs_gone")
        .times(1)
        .returning(|_| Ok(false));
    let (status, body) = post(&body, &[JSON, ("stripe-signature", signature.as_str())], db, MockInventory::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn failed_payment_is_recorded() {
    let body = json!({
        "type": "payment_intent.payment_failed",
        "data": {"object": {
            "id": "pi_1", "amount": 5998, "currency": "usd",
            "last_payment_error": {"message": "Your card was declined."}
        }}
    })
    .to_string();
    let signature = signature_for(&body);
    let mut db = MockOrderStore::new();
    db.expect_fail_checkout_session()
        .withf(|pi, reason| pi == "pi_1" && reason == "Your card was declined.")
        .times(1)
        .returning(|_, _| Ok(None));
    let (status, _) = post(&body, &[JSON, ("stripe-signature", signature.as_str())], db, MockInventory::new()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn session_without_id_is_a_bad_request() {
    let body = json!({"type": "checkout.session.completed", "data": {"object": {"amount_total": 100}}}).to_string();
    let signature = signature_for(&body);
    let headers = [JSON, ("stripe-signature", signature.as_str())];
    let (status, _) = post(&body, &headers, MockOrderStore::new(), MockInventory::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
