use serde::Serialize;
use thiserror::Error;

use crate::db_types::Amount;

/// A request to push a payment prompt to a buyer's phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    /// Ties provider log lines back to the order. Providers are not required to send it anywhere.
    pub correlation_id: String,
    /// Normalized phone number, e.g. `255712345678`
    pub buyer_phone: String,
    pub amount: Amount,
    pub currency: String,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
}

/// A payment prompt the provider has accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDispatch {
    /// The provider's id for the charge, quoted in its callbacks. Providers do not always return one.
    pub provider_order_id: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum PaymentProviderError {
    #[error("The payment provider could not be reached. {0}")]
    Unreachable(String),
    #[error("The payment provider did not respond in time. {0}")]
    Timeout(String),
    #[error("The payment provider responded with HTTP {status}.")]
    HttpStatus { status: u16, payload: String },
    #[error("The payment provider rejected the request. {message}")]
    Rejected { message: String, payload: String },
    #[error("The payment provider sent a response that could not be read. {message}")]
    InvalidResponse { message: String, payload: String },
}

impl PaymentProviderError {
    /// The provider's raw response, for diagnostics. Never show this to buyers.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { payload, .. } | Self::Rejected { payload, .. } | Self::InvalidResponse { payload, .. } => {
                Some(payload.as_str())
            },
            Self::Unreachable(_) | Self::Timeout(_) => None,
        }
    }
}

/// The mobile-money provider that charges buyers by pushing a USSD prompt to their phone.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Asks the provider to prompt the buyer for payment. Success means the prompt was dispatched, not that the buyer
    /// paid; the outcome arrives later through the payment callback.
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentDispatch, PaymentProviderError>;
}
