use cucumber::World;
use log::*;
use storefront_engine::{
    checkout_objects::{CartLine, CheckoutReceipt, CheckoutRequest},
    db_types::{Amount, ProfitMargin},
    events::EventProducers,
    helpers::PhoneRules,
    ExpiryApi,
    ReconciliationApi,
    SqliteDatabase,
    StorefrontDatabase,
};

use crate::support::{checkout_api, new_database, StubProvider};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<Storefront>,
}

#[derive(Debug)]
pub struct Storefront {
    pub db: SqliteDatabase,
    pub reconciliation: ReconciliationApi<SqliteDatabase>,
    pub expiry: ExpiryApi<SqliteDatabase>,
    pub receipts: Vec<CheckoutReceipt>,
}

impl StorefrontWorld {
    pub fn system(&mut self) -> &mut Storefront {
        self.system.as_mut().expect("Storefront not initialised")
    }
}

impl Storefront {
    pub async fn new(margin: ProfitMargin) -> Self {
        let db = new_database().await;
        debug!("🚀️ Storefront ready at {}", db.url());
        let reconciliation = ReconciliationApi::new(db.clone(), EventProducers::default()).with_margin(margin);
        let expiry = ExpiryApi::new(db.clone(), EventProducers::default());
        Self { db, reconciliation, expiry, receipts: Vec::new() }
    }

    /// Checks out a single-item cart. SonicPesa accepts the charge under `provider_order_id`.
    pub async fn checkout(&mut self, name: &str, phone: &str, provider_order_id: &str, amount: i64) {
        let api = checkout_api(&self.db, StubProvider::accepting(Some(provider_order_id)));
        let request = CheckoutRequest::new(name, phone, vec![CartLine::new("sku-test", 1, Amount::from(amount))]);
        let receipt = api.checkout(request).await.expect("Checkout failed");
        self.receipts.push(receipt);
    }

    pub fn normalized_phone(phone: &str) -> String {
        PhoneRules::default().normalize(phone).expect("Not a valid phone number")
    }
}
