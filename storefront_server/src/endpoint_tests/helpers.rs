use actix_web::{
    body::MessageBody,
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    App,
};
use log::debug;
use serde_json::Value;
use storefront_engine::{
    checkout_objects::{CartLine, CheckoutRequest},
    db_types::Amount,
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CheckoutApi,
    SqliteDatabase,
};

use super::mocks::{accepting_provider, MockProvider};
use crate::{
    config::ServerConfig,
    server::{configure_routes, cors_headers},
};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

pub async fn new_test_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

/// Sends `req` through an app wired up exactly as the server wires it.
pub async fn send_request(
    req: TestRequest,
    config: &ServerConfig,
    db: SqliteDatabase,
    provider: MockProvider,
) -> TestResponse {
    let app = App::new()
        .wrap(cors_headers(&config.cors_allowed_origin))
        .configure(|cfg| configure_routes(cfg, config, db, provider, EventProducers::default()));
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        // Middleware rejections arrive as errors rather than responses
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let headers = res.headers().clone();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, headers, body }
}

/// A 10,000 TZS checkout for Asha, placed directly through the engine. SonicPesa answers with `provider_order_id`.
pub async fn place_order(db: &SqliteDatabase, provider_order_id: &str) -> String {
    let api = CheckoutApi::new(
        db.clone(),
        accepting_provider(provider_order_id),
        ServerConfig::default().checkout_options(),
        EventProducers::default(),
    );
    let cart = vec![CartLine::new("sku-kikoi", 2, Amount::from(5_000))];
    let request = CheckoutRequest::new("Asha Juma", "0712345678", cart);
    let receipt = api.checkout(request).await.expect("checkout failed");
    receipt.order.order_number
}
