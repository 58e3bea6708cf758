use actix_web::{
    http::{Method, StatusCode},
    test::TestRequest,
};
use serde_json::json;
use storefront_common::Secret;
use storefront_engine::{
    db_types::{Amount, OrderStatusType, PaymentStatus, TransactionStatus},
    LedgerQueries,
};

use super::{
    helpers::{new_test_db, place_order, send_request},
    mocks::MockProvider,
};
use crate::{
    config::{ServerConfig, WebhookConfig},
    helpers::calculate_hmac,
};

fn callback(order_id: &str, result: &str) -> TestRequest {
    TestRequest::post().uri("/webhook/sonicpesa").set_json(json!({ "order_id": order_id, "result": result }))
}

#[actix_web::test]
async fn successful_payment_completes_order() {
    let db = new_test_db().await;
    let order_number = place_order(&db, "SP-10").await;
    let config = ServerConfig::default();
    let res = send_request(callback("SP-10", "SUCCESS"), &config, db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], true);

    let tx = db.fetch_transaction_by_provider_id("SP-10").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.profit, Amount::from(3_000));
    let order = db.fetch_order_by_number(&order_number).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    let customer = db.fetch_customer_by_phone("255712345678").await.unwrap().unwrap();
    assert_eq!(customer.total_orders, 1);
    assert_eq!(customer.total_spent, Amount::from(10_000));

    // a redelivery is acknowledged but changes nothing
    let res = send_request(callback("SP-10", "SUCCESS"), &config, db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], true);
    let customer = db.fetch_customer_by_phone("255712345678").await.unwrap().unwrap();
    assert_eq!(customer.total_orders, 1);
}

#[actix_web::test]
async fn failed_payment_fails_order_payment() {
    let db = new_test_db().await;
    let order_number = place_order(&db, "SP-11").await;
    let config = ServerConfig::default();
    let res = send_request(callback("SP-11", "FAILED"), &config, db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    let tx = db.fetch_transaction_by_provider_id("SP-11").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Failed);
    assert_eq!(tx.profit, Amount::from(0));
    let order = db.fetch_order_by_number(&order_number).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Failed);
}

#[actix_web::test]
async fn malformed_callback_is_acknowledged() {
    let db = new_test_db().await;
    let req = TestRequest::post()
        .uri("/webhook/sonicpesa")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("this is not json");
    let res = send_request(req, &ServerConfig::default(), db, MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], false);
}

#[actix_web::test]
async fn unknown_charge_is_recorded() {
    let db = new_test_db().await;
    let req = TestRequest::post()
        .uri("/webhook/sonicpesa")
        .set_json(json!({ "order_id": 777, "result": "SUCCESS", "amount": "20000", "buyer_phone": "255755000111" }));
    let res = send_request(req, &ServerConfig::default(), db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], true);
    let tx = db.fetch_transaction_by_provider_id("777").await.unwrap().expect("transaction was not synthesized");
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.order_id, None);
    assert_eq!(tx.amount, Amount::from(20_000));
    assert_eq!(tx.profit, Amount::from(6_000));
}

fn signed_config() -> ServerConfig {
    let webhook = WebhookConfig { hmac_checks: true, hmac_secret: Secret::new("shh".to_string()), ..Default::default() };
    ServerConfig { webhook, ..Default::default() }
}

#[actix_web::test]
async fn unsigned_callback_is_forbidden() {
    let db = new_test_db().await;
    place_order(&db, "SP-12").await;
    let res = send_request(callback("SP-12", "SUCCESS"), &signed_config(), db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let tx = db.fetch_transaction_by_provider_id("SP-12").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
}

#[actix_web::test]
async fn signed_callback_is_accepted() {
    let db = new_test_db().await;
    place_order(&db, "SP-13").await;
    let body = r#"{"order_id":"SP-13","result":"SUCCESS"}"#;
    let signature = calculate_hmac("shh", body.as_bytes()).unwrap();
    let req = TestRequest::post()
        .uri("/webhook/sonicpesa")
        .insert_header(("Content-Type", "application/json"))
        .insert_header(("X-SonicPesa-Signature", signature.as_str()))
        .set_payload(body);
    let res = send_request(req, &signed_config(), db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], true);
    let tx = db.fetch_transaction_by_provider_id("SP-13").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
}

#[actix_web::test]
async fn tampered_callback_is_forbidden() {
    let db = new_test_db().await;
    place_order(&db, "SP-14").await;
    let signature = calculate_hmac("shh", br#"{"order_id":"SP-14","result":"FAILED"}"#).unwrap();
    let req = TestRequest::post()
        .uri("/webhook/sonicpesa")
        .insert_header(("Content-Type", "application/json"))
        .insert_header(("X-SonicPesa-Signature", signature.as_str()))
        .set_payload(r#"{"order_id":"SP-14","result":"SUCCESS"}"#);
    let res = send_request(req, &signed_config(), db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn whitelist_is_enforced() {
    let db = new_test_db().await;
    place_order(&db, "SP-15").await;
    let mut config = ServerConfig::default();
    config.webhook.whitelist = Some(vec!["196.249.1.2".parse().unwrap()]);

    let req = callback("SP-15", "SUCCESS").peer_addr("10.0.0.5:4000".parse().unwrap());
    let res = send_request(req, &config, db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let tx = db.fetch_transaction_by_provider_id("SP-15").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);

    let req = callback("SP-15", "SUCCESS").peer_addr("196.249.1.2:4000".parse().unwrap());
    let res = send_request(req, &config, db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    let tx = db.fetch_transaction_by_provider_id("SP-15").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
}

#[actix_web::test]
async fn forwarded_address_is_used_when_configured() {
    let db = new_test_db().await;
    place_order(&db, "SP-16").await;
    let mut config = ServerConfig::default();
    config.use_x_forwarded_for = true;
    config.webhook.whitelist = Some(vec!["196.249.1.2".parse().unwrap()]);
    let req = callback("SP-16", "SUCCESS")
        .peer_addr("10.0.0.5:4000".parse().unwrap())
        .insert_header(("X-Forwarded-For", "196.249.1.2"));
    let res = send_request(req, &config, db.clone(), MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn webhook_preflight_skips_checks() {
    let db = new_test_db().await;
    let mut config = signed_config();
    config.webhook.whitelist = Some(vec![]);
    let req = TestRequest::default().method(Method::OPTIONS).uri("/webhook/sonicpesa");
    let res = send_request(req, &config, db, MockProvider::new()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("Access-Control-Allow-Origin"), Some("*"));
}
