use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::Value;

use crate::{
    config::SonicPesaConfig,
    data_objects::{CreateOrderRequest, CreateOrderResponse},
    helpers::{error_message, extract_order_id, is_error_body},
    SonicPesaApiError,
};

#[derive(Clone)]
pub struct SonicPesaApi {
    config: SonicPesaConfig,
    client: Arc<Client>,
}

impl SonicPesaApi {
    pub fn new(config: SonicPesaConfig) -> Result<Self, SonicPesaApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| SonicPesaApiError::Initialization(format!("Invalid API key. {e}")))?;
        headers.insert("X-API-KEY", key);
        if !config.api_secret.reveal().is_empty() {
            let secret = HeaderValue::from_str(config.api_secret.reveal().as_str())
                .map_err(|e| SonicPesaApiError::Initialization(format!("Invalid API secret. {e}")))?;
            headers.insert("X-API-SECRET", secret);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SonicPesaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &SonicPesaConfig {
        &self.config
    }

    /// Asks SonicPesa to push a USSD payment prompt to the buyer's phone.
    ///
    /// A successful return only means the prompt was dispatched. Whether the buyer actually paid is reported later
    /// via the payment webhook. `correlation_id` only tags the log lines for this call. The request is never retried
    /// here; a timeout is reported as [`SonicPesaApiError::Timeout`] even though the charge may still go through.
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
        correlation_id: &str,
    ) -> Result<CreateOrderResponse, SonicPesaApiError> {
        let url = self.config.create_order_url.as_str();
        debug!(
            "📲️ [{correlation_id}] Requesting a USSD push of {} {} to {}",
            request.amount, request.currency, request.buyer_phone
        );
        let response = self.client.post(url).json(request).send().await.map_err(|e| {
            if e.is_timeout() {
                SonicPesaApiError::Timeout(e.to_string())
            } else {
                SonicPesaApiError::RestRequestError(e.to_string())
            }
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| SonicPesaApiError::RestResponseError(e.to_string()))?;
        trace!("📲️ [{correlation_id}] SonicPesa responded with {status}: {text}");
        if !status.is_success() {
            return Err(SonicPesaApiError::QueryError { status: status.as_u16(), payload: text });
        }
        let payload = serde_json::from_str::<Value>(&text)
            .map_err(|e| SonicPesaApiError::JsonError { message: e.to_string(), payload: text.clone() })?;
        if is_error_body(&payload) {
            return Err(SonicPesaApiError::Rejected { message: error_message(&payload), payload: text });
        }
        let provider_order_id = extract_order_id(&payload);
        match &provider_order_id {
            Some(id) => info!("📲️ [{correlation_id}] USSD push dispatched. SonicPesa order id: {id}"),
            None => warn!(
                "📲️ [{correlation_id}] USSD push dispatched, but SonicPesa did not return an order id. The payment \
                 callback for this charge will not match a ledger entry. Response: {text}"
            ),
        }
        Ok(CreateOrderResponse { provider_order_id, payload })
    }
}
