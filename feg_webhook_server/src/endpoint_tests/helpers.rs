use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use feg_common::Money;
use feg_order_engine::{
    checkout::compute_signature,
    db_types::{
        Json,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        PaymentStatus,
        ProductVariant,
        SessionId,
        ShippingAddress,
    },
};
use log::debug;
use serde_json::json;

pub const TEST_SECRET: &str = "whsec_endpoint_tests";

pub fn signature_for(body: &str) -> String {
    let ts = Utc::now().timestamp();
    format!("t={ts},v1={}", compute_signature(TEST_SECRET, ts, body.as_bytes()))
}

pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    call(TestRequest::get().uri(path), configure).await
}

pub async fn post_request<F>(
    path: &str,
    body: &str,
    headers: &[(&str, &str)],
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::post().uri(path).set_payload(body.to_string());
    for &(name, value) in headers {
        req = req.insert_header((name, value));
    }
    call(req, configure).await
}

async fn call<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = res.into_body().try_into_bytes().map_err(|_| "Could not read the response body".to_string())?;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

pub fn sample_address() -> ShippingAddress {
    ShippingAddress {
        line1: "1 Main St".into(),
        line2: None,
        city: "Austin".into(),
        state: "TX".into(),
        postal_code: "78701".into(),
        country: "US".into(),
    }
}

pub fn sample_order() -> Order {
    let created = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
    Order {
        id: 1,
        order_number: OrderNumber::from("FEG-1718000000000-X4K9QZ".to_string()),
        session_id: SessionId::from("cs_test_1"),
        customer_id: Some(1),
        customer_email: "a@b.com".into(),
        customer_name: "Alice Liddell".into(),
        customer_phone: None,
        status: OrderStatusType::Pending,
        payment_status: PaymentStatus::Paid,
        payment_intent: Some("pi_1".into()),
        subtotal: Money::from(5998),
        tax: Money::default(),
        shipping: Money::default(),
        discount: Money::default(),
        total: Money::from(5998),
        currency: "USD".into(),
        shipping_address: Json(sample_address()),
        billing_address: Json(sample_address()),
        metadata: Json(json!({})),
        test_mode: true,
        created_at: created,
        updated_at: created,
    }
}

pub fn sample_items() -> Vec<OrderItem> {
    vec![OrderItem {
        id: 1,
        order_id: 1,
        product_id: "p1".into(),
        product_name: "Total Essential".into(),
        variant: ProductVariant::TotalEssential,
        quantity: 2,
        unit_price: Money::from(2999),
        total_price: Money::from(5998),
        created_at: Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap(),
    }]
}
