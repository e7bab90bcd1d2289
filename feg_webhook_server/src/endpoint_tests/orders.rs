use actix_web::{http::StatusCode, web, web::ServiceConfig};
use feg_order_engine::{db_types::SessionId, traits::ReconciliationDbError, OrderQueryApi};
use serde_json::Value;

use super::helpers::{get_request, sample_items, sample_order};
use crate::{
    endpoint_tests::mocks::MockOrderQueries,
    routes::{OrderByNumberRoute, OrderForSessionRoute},
};

fn configure(db: MockOrderQueries) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderQueryApi::new(db)))
            .service(OrderForSessionRoute::<MockOrderQueries>::new())
            .service(OrderByNumberRoute::<MockOrderQueries>::new());
    }
}

#[actix_web::test]
async fn order_for_session() {
    let mut db = MockOrderQueries::new();
    db.expect_fetch_order_by_session_id()
        .withf(|id| id == &SessionId::from("cs_test_1"))
        .returning(|_| Ok(Some(sample_order())));
    db.expect_fetch_order_items().withf(|id| *id == 1).returning(|_| Ok(sample_items()));
    let (status, body) = get_request("/orders/session/cs_test_1", configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["order"]["order_number"], "FEG-1718000000000-X4K9QZ");
    assert_eq!(json["order"]["total"], 59.98);
    assert_eq!(json["order"]["currency"], "USD");
    assert_eq!(json["order"]["shipping_address"]["city"], "Austin");
    assert_eq!(json["items"][0]["quantity"], 2);
    assert_eq!(json["items"][0]["variant"], "total_essential");
}

#[actix_web::test]
async fn order_for_unknown_session() {
    let mut db = MockOrderQueries::new();
    db.expect_fetch_order_by_session_id().returning(|_| Ok(None));
    let (status, body) = get_request("/orders/session/cs_nope", configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. No order exists for checkout session cs_nope"}"#);
}

#[actix_web::test]
async fn order_by_number() {
    let mut db = MockOrderQueries::new();
    db.expect_fetch_order_by_order_number()
        .withf(|n| n.as_str() == "FEG-1718000000000-X4K9QZ")
        .returning(|_| Ok(Some(sample_order())));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    let (status, body) = get_request("/orders/FEG-1718000000000-X4K9QZ", configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["order"]["session_id"], "cs_test_1");
    assert_eq!(json["items"].as_array().map(|a| a.len()), Some(1));
}

#[actix_web::test]
async fn order_lookup_backend_failure() {
    let mut db = MockOrderQueries::new();
    db.expect_fetch_order_by_order_number()
        .returning(|_| Err(ReconciliationDbError::DatabaseError("database is locked".into())));
    let (status, _) = get_request("/orders/FEG-1-ABCDEF", configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
