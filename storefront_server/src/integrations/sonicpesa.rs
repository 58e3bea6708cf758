use log::*;
use sonicpesa_tools::{CreateOrderRequest, PaymentCallback, SonicPesaApi, SonicPesaApiError, SonicPesaConfig};
use storefront_engine::{
    db_types::PaymentResult,
    PaymentDispatch,
    PaymentProvider,
    PaymentProviderError,
    PaymentRequest,
};

/// Charges buyers through SonicPesa's USSD push API.
#[derive(Clone)]
pub struct SonicPesaProvider {
    api: SonicPesaApi,
}

impl SonicPesaProvider {
    pub fn new(config: SonicPesaConfig) -> Result<Self, SonicPesaApiError> {
        let api = SonicPesaApi::new(config)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &SonicPesaApi {
        &self.api
    }
}

impl PaymentProvider for SonicPesaProvider {
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentDispatch, PaymentProviderError> {
        let PaymentRequest { correlation_id, buyer_phone, amount, currency, buyer_name, buyer_email } = request;
        let body = CreateOrderRequest::new(buyer_phone, amount, currency)
            .with_buyer_name(buyer_name)
            .with_buyer_email(buyer_email);
        let response = self.api.create_order(&body, &correlation_id).await.map_err(|e| {
            if let Some(payload) = e.payload() {
                debug!("📲️ [{correlation_id}] SonicPesa error response: {payload}");
            }
            provider_error(e)
        })?;
        if response.provider_order_id.is_none() {
            warn!(
                "📲️ [{correlation_id}] SonicPesa accepted the charge but did not return an order id. Its callback \
                 will not match the ledger entry. Response: {}",
                response.payload
            );
        }
        Ok(PaymentDispatch { provider_order_id: response.provider_order_id })
    }
}

/// Maps SonicPesa client failures onto the provider-agnostic error the engine understands.
pub fn provider_error(err: SonicPesaApiError) -> PaymentProviderError {
    match err {
        SonicPesaApiError::Initialization(s) | SonicPesaApiError::RestRequestError(s) => {
            PaymentProviderError::Unreachable(s)
        },
        SonicPesaApiError::Timeout(s) => PaymentProviderError::Timeout(s),
        SonicPesaApiError::QueryError { status, payload } => PaymentProviderError::HttpStatus { status, payload },
        SonicPesaApiError::Rejected { message, payload } => PaymentProviderError::Rejected { message, payload },
        SonicPesaApiError::JsonError { message, payload } => PaymentProviderError::InvalidResponse { message, payload },
        SonicPesaApiError::RestResponseError(message) => {
            PaymentProviderError::InvalidResponse { message, payload: String::default() }
        },
    }
}

pub fn payment_result_from_callback(callback: PaymentCallback) -> PaymentResult {
    PaymentResult {
        provider_order_id: callback.order_id,
        result: callback.result,
        amount: callback.amount,
        currency: callback.currency,
        buyer_phone: callback.buyer_phone,
        reference: callback.reference,
        timestamp: callback.timestamp,
    }
}
