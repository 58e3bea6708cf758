use actix_web::{
    http::{Method, StatusCode},
    test::TestRequest,
};
use serde_json::json;
use storefront_engine::{
    db_types::{Amount, OrderStatusType, TransactionStatus},
    LedgerQueries,
    PaymentProviderError,
};

use super::{
    helpers::{new_test_db, send_request},
    mocks::{accepting_provider, MockProvider},
};
use crate::config::ServerConfig;

fn checkout_body(phone: &str) -> serde_json::Value {
    json!({
        "buyer_name": "Asha Juma",
        "buyer_phone": phone,
        "items": [
            { "product_id": "sku-kanga", "quantity": 2, "unit_price": 2500 },
            { "product_id": "sku-kikoi", "quantity": 1, "unit_price": 5000 }
        ]
    })
}

#[actix_web::test]
async fn checkout_dispatches_payment() {
    let db = new_test_db().await;
    let config = ServerConfig::default();
    let req = TestRequest::post().uri("/checkout").set_json(checkout_body("0712 345 678"));
    let res = send_request(req, &config, db.clone(), accepting_provider("SP-1")).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment request dispatched, confirm on your phone");
    assert!(body.get("step").is_none());
    let order_number = body["order_number"].as_str().expect("no order number").to_string();
    assert!(order_number.starts_with("ORD-"));

    let tx = db.fetch_transaction_by_provider_id("SP-1").await.unwrap().expect("transaction not recorded");
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.amount, Amount::from(10_000));
    assert_eq!(tx.buyer_phone, "255712345678");
    let order = db.fetch_order_by_number(&order_number).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(tx.order_id, Some(order.id));
}

#[actix_web::test]
async fn invalid_phone_is_rejected() {
    let db = new_test_db().await;
    let mut provider = MockProvider::new();
    provider.expect_request_payment().never();
    let req = TestRequest::post().uri("/checkout").set_json(checkout_body("12345"));
    let res = send_request(req, &ServerConfig::default(), db.clone(), provider).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["step"], "validate the checkout request");
    assert!(body.get("order_number").is_none());
    assert!(db.fetch_customer_by_phone("12345").await.unwrap().is_none());
}

#[actix_web::test]
async fn malformed_checkout_is_rejected() {
    let db = new_test_db().await;
    let req = TestRequest::post()
        .uri("/checkout")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"buyer_name\": \"Asha\", \"items\": ");
    let res = send_request(req, &ServerConfig::default(), db, MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["success"], false);
}

#[actix_web::test]
async fn provider_failure_is_a_bad_gateway() {
    let db = new_test_db().await;
    let mut provider = MockProvider::new();
    provider.expect_request_payment().times(1).returning(|_| {
        Err(PaymentProviderError::Rejected {
            message: "Invalid phone number".into(),
            payload: r#"{"status":"error","message":"Invalid phone number","trace":"x"}"#.into(),
        })
    });
    let req = TestRequest::post().uri("/checkout").set_json(checkout_body("0712345678"));
    let res = send_request(req, &ServerConfig::default(), db.clone(), provider).await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    let body = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["step"], "request the payment");
    // neither the provider's response nor its message is passed on
    assert!(!res.body.contains("trace"));
    assert!(!res.body.contains("Invalid phone number"));
    assert_eq!(body["message"], "We could not send the payment request to your phone. Please try again.");
    let order_number = body["order_number"].as_str().expect("order number should be reported");
    let order = db.fetch_order_by_number(order_number).await.unwrap().expect("order should be kept");
    assert_eq!(order.status, OrderStatusType::Pending);
    assert!(db.fetch_transactions_for_order(order.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn unreachable_provider_details_stay_in_the_logs() {
    let db = new_test_db().await;
    let mut provider = MockProvider::new();
    provider.expect_request_payment().times(1).returning(|_| {
        Err(PaymentProviderError::Timeout(
            "error sending request for url (https://api.sonicpesa.com/api/v1/payment/create_order)".into(),
        ))
    });
    let req = TestRequest::post().uri("/checkout").set_json(checkout_body("0712345678"));
    let res = send_request(req, &ServerConfig::default(), db, provider).await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(!res.body.contains("sonicpesa.com"));
    assert!(!res.body.contains("did not respond in time"));
    assert_eq!(res.json()["step"], "request the payment");
}

#[actix_web::test]
async fn checkout_preflight() {
    let db = new_test_db().await;
    let req = TestRequest::default().method(Method::OPTIONS).uri("/checkout");
    let res = send_request(req, &ServerConfig::default(), db, MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.is_empty());
    assert_eq!(res.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(res.header("Access-Control-Allow-Methods"), Some("GET, POST, OPTIONS"));
}

#[actix_web::test]
async fn checkout_only_accepts_post() {
    let db = new_test_db().await;
    let req = TestRequest::get().uri("/checkout");
    let res = send_request(req, &ServerConfig::default(), db, MockProvider::new()).await;
    assert!(res.status.is_client_error());
}
