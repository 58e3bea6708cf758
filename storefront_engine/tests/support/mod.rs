#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use log::*;
use storefront_engine::{
    checkout_objects::{CartLine, CheckoutOptions, CheckoutRequest},
    db_types::Amount,
    events::EventProducers,
    CheckoutApi,
    PaymentDispatch,
    PaymentProvider,
    PaymentProviderError,
    PaymentRequest,
    ReconciliationApi,
    SqliteDatabase,
};

/// A fresh, migrated database in the temp directory.
pub async fn new_database() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/storefront_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

/// Stands in for the payment provider, recording every request it receives.
#[derive(Clone)]
pub struct StubProvider {
    response: Result<PaymentDispatch, PaymentProviderError>,
    pub requests: Arc<Mutex<Vec<PaymentRequest>>>,
}

impl StubProvider {
    pub fn accepting(provider_order_id: Option<&str>) -> Self {
        let dispatch = PaymentDispatch { provider_order_id: provider_order_id.map(String::from) };
        Self { response: Ok(dispatch), requests: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn failing(error: PaymentProviderError) -> Self {
        Self { response: Err(error), requests: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PaymentProvider for StubProvider {
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentDispatch, PaymentProviderError> {
        self.requests.lock().unwrap().push(request);
        self.response.clone()
    }
}

pub fn checkout_api(db: &SqliteDatabase, provider: StubProvider) -> CheckoutApi<SqliteDatabase, StubProvider> {
    CheckoutApi::new(db.clone(), provider, CheckoutOptions::default(), EventProducers::default())
}

pub fn reconciliation_api(db: &SqliteDatabase) -> ReconciliationApi<SqliteDatabase> {
    ReconciliationApi::new(db.clone(), EventProducers::default())
}

/// Two kangas at 2,500 and a kikoi at 5,000: 10,000 TZS.
pub fn cart() -> Vec<CartLine> {
    vec![CartLine::new("sku-kanga", 2, Amount::from(2_500)), CartLine::new("sku-kikoi", 1, Amount::from(5_000))]
}

pub fn checkout_request(phone: &str) -> CheckoutRequest {
    CheckoutRequest::new("Asha Juma", phone, cart())
}
