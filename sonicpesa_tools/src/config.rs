use std::time::Duration;

use log::*;
use storefront_common::Secret;

pub const DEFAULT_CREATE_ORDER_URL: &str = "https://api.sonicpesa.com/api/v1/payment/create_order";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SonicPesaConfig {
    pub create_order_url: String,
    pub api_key: Secret<String>,
    /// Optional. The secret header is only sent when this is not empty.
    pub api_secret: Secret<String>,
    pub timeout: Duration,
}

impl Default for SonicPesaConfig {
    fn default() -> Self {
        Self {
            create_order_url: DEFAULT_CREATE_ORDER_URL.to_string(),
            api_key: Secret::default(),
            api_secret: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SonicPesaConfig {
    pub fn new_from_env_or_default() -> Self {
        let create_order_url = std::env::var("SF_SONICPESA_API_URL").unwrap_or_else(|_| {
            info!("🪛️ SF_SONICPESA_API_URL not set, using {DEFAULT_CREATE_ORDER_URL}");
            DEFAULT_CREATE_ORDER_URL.to_string()
        });
        let api_key = Secret::new(std::env::var("SF_SONICPESA_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SF_SONICPESA_API_KEY not set. Payment requests will be rejected by SonicPesa.");
            String::default()
        }));
        let api_secret = Secret::new(std::env::var("SF_SONICPESA_API_SECRET").unwrap_or_default());
        let timeout = std::env::var("SF_SONICPESA_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid SF_SONICPESA_TIMEOUT value '{s}'. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or_else(|| {
                info!("🪛️ Using a {DEFAULT_TIMEOUT_SECS}s timeout for SonicPesa requests");
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            });
        Self { create_order_url, api_key, api_secret, timeout }
    }
}
