use std::fmt::Display;

use serde::{Deserialize, Serialize};
use storefront_engine::checkout_objects::CheckoutStep;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The reply to a checkout. `step` names the stage a failed checkout reached, e.g. "request the payment".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl CheckoutResponse {
    pub fn success<S: Display>(message: S, order_number: String) -> Self {
        Self { success: true, message: message.to_string(), order_number: Some(order_number), step: None }
    }

    pub fn failure<S: Display>(message: S, step: CheckoutStep, order_number: Option<String>) -> Self {
        Self { success: false, message: message.to_string(), order_number, step: Some(step.to_string()) }
    }
}
