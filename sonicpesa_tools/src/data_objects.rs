use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_common::Amount;

use crate::helpers::{optional_string_or_number, string_or_number};

/// The body of a create-order call. Absent buyer names and emails are sent as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub buyer_email: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub amount: Amount,
    pub currency: String,
}

impl CreateOrderRequest {
    pub fn new<S: Into<String>>(buyer_phone: S, amount: Amount, currency: S) -> Self {
        Self {
            buyer_email: String::default(),
            buyer_name: String::default(),
            buyer_phone: buyer_phone.into(),
            amount,
            currency: currency.into(),
        }
    }

    pub fn with_buyer_name(mut self, name: Option<String>) -> Self {
        self.buyer_name = name.unwrap_or_default();
        self
    }

    pub fn with_buyer_email(mut self, email: Option<String>) -> Self {
        self.buyer_email = email.unwrap_or_default();
        self
    }
}

#[derive(Debug, Clone)]
pub struct CreateOrderResponse {
    /// SonicPesa's id for the charge. Callbacks quote it as `order_id`.
    pub provider_order_id: Option<String>,
    pub payload: Value,
}

/// The result of a USSD charge, as posted by SonicPesa to the storefront webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    #[serde(deserialize_with = "string_or_number")]
    pub order_id: String,
    /// "SUCCESS" for a completed charge. Anything else is a failure.
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub buyer_phone: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub timestamp: Option<String>,
}
