//! A small client for the SonicPesa payment API.
//!
//! SonicPesa charges buyers by pushing a USSD prompt to their phone. [`SonicPesaApi::create_order`] asks the provider
//! to start such a charge; the outcome arrives later as a [`PaymentCallback`] posted to the storefront's webhook.
mod api;
mod config;
mod data_objects;
mod error;
pub mod helpers;

pub use api::SonicPesaApi;
pub use config::{SonicPesaConfig, DEFAULT_CREATE_ORDER_URL};
pub use data_objects::{CreateOrderRequest, CreateOrderResponse, PaymentCallback};
pub use error::SonicPesaApiError;
