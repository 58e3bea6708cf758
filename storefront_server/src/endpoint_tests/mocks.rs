use mockall::mock;
use storefront_engine::{PaymentDispatch, PaymentProvider, PaymentProviderError, PaymentRequest};

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentDispatch, PaymentProviderError>;
    }
}

/// A provider that accepts exactly one charge and answers with `provider_order_id`.
pub fn accepting_provider(provider_order_id: &str) -> MockProvider {
    let id = provider_order_id.to_string();
    let mut provider = MockProvider::new();
    provider
        .expect_request_payment()
        .times(1)
        .returning(move |_| Ok(PaymentDispatch { provider_order_id: Some(id.clone()) }));
    provider
}
