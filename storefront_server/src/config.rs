//! Server configuration.
//!
//! Every setting is read from an `SF_*` environment variable. Missing or invalid values are logged and replaced with
//! their defaults, so the server always starts. Run the binary with any argument to see the full list.
use std::{env, net::IpAddr, str::FromStr};

use chrono::Duration;
use log::*;
use sonicpesa_tools::SonicPesaConfig;
use storefront_common::{parse_boolean_flag, Secret, DEFAULT_CURRENCY};
use storefront_engine::{
    checkout_objects::CheckoutOptions,
    db_types::ProfitMargin,
    helpers::{PhoneRules, DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_DIGITS},
};

const DEFAULT_SF_HOST: &str = "127.0.0.1";
const DEFAULT_SF_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_PENDING_ORDER_TIMEOUT_HRS: i64 = 24;
const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";
pub const DEFAULT_WEBHOOK_HMAC_HEADER: &str = "X-SonicPesa-Signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    pub currency: String,
    pub phone_rules: PhoneRules,
    pub profit_margin: ProfitMargin,
    /// If true, a checkout fails when its pending transaction cannot be recorded, even though the buyer has already
    /// been sent the payment prompt.
    pub strict_ledger: bool,
    /// The time before an unpaid order is considered abandoned and cancelled.
    pub pending_order_timeout: Duration,
    pub cors_allowed_origin: String,
    pub sonicpesa: SonicPesaConfig,
    pub webhook: WebhookConfig,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// If supplied, webhook calls are only accepted from these addresses.
    pub whitelist: Option<Vec<IpAddr>>,
    pub hmac_checks: bool,
    pub hmac_secret: Secret<String>,
    pub hmac_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            whitelist: None,
            hmac_checks: false,
            hmac_secret: Secret::default(),
            hmac_header: DEFAULT_WEBHOOK_HMAC_HEADER.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SF_HOST.to_string(),
            port: DEFAULT_SF_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            currency: DEFAULT_CURRENCY.to_string(),
            phone_rules: PhoneRules::default(),
            profit_margin: ProfitMargin::default(),
            strict_ledger: false,
            pending_order_timeout: Duration::hours(DEFAULT_PENDING_ORDER_TIMEOUT_HRS),
            cors_allowed_origin: DEFAULT_CORS_ALLOWED_ORIGIN.to_string(),
            sonicpesa: SonicPesaConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SF_HOST").ok().unwrap_or_else(|| DEFAULT_SF_HOST.into());
        let port = parse_or_default("SF_PORT", DEFAULT_SF_PORT);
        let database_url = env::var("SF_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SF_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SF_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SF_USE_FORWARDED").ok(), false);
        let currency = env::var("SF_CURRENCY")
            .map(|s| s.trim().to_uppercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let country_code = env::var("SF_COUNTRY_CODE")
            .map(|s| s.trim().trim_start_matches('+').to_string())
            .ok()
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string());
        let national_digits = parse_or_default("SF_NATIONAL_NUMBER_DIGITS", DEFAULT_NATIONAL_DIGITS);
        let phone_rules = PhoneRules::new(country_code, national_digits);
        let profit_margin = parse_or_default("SF_PROFIT_MARGIN", ProfitMargin::default());
        let strict_ledger = parse_boolean_flag(env::var("SF_STRICT_LEDGER").ok(), false);
        let timeout_hrs = parse_or_default("SF_PENDING_ORDER_TIMEOUT", DEFAULT_PENDING_ORDER_TIMEOUT_HRS);
        let pending_order_timeout = Duration::hours(timeout_hrs.max(0));
        let cors_allowed_origin =
            env::var("SF_CORS_ALLOWED_ORIGIN").ok().unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string());
        let sonicpesa = SonicPesaConfig::new_from_env_or_default();
        let webhook = WebhookConfig::from_env_or_default();
        info!(
            "🪛️ Charging in {currency} with a {profit_margin} profit margin. Unpaid orders are cancelled after {} hrs",
            pending_order_timeout.num_hours()
        );
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            currency,
            phone_rules,
            profit_margin,
            strict_ledger,
            pending_order_timeout,
            cors_allowed_origin,
            sonicpesa,
            webhook,
        }
    }

    /// The checkout settings derived from this configuration.
    pub fn checkout_options(&self) -> CheckoutOptions {
        CheckoutOptions {
            currency: self.currency.clone(),
            phone_rules: self.phone_rules.clone(),
            strict_ledger: self.strict_ledger,
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let whitelist = env::var("SF_WEBHOOK_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The webhook IP whitelist was configured, but is empty. The server will run, but won't accept \
                     any payment callbacks."
                );
            },
            None => info!("🪛️ No webhook IP whitelist is set."),
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Webhook IP whitelist: {addrs}");
            },
        }
        let hmac_checks = parse_boolean_flag(env::var("SF_WEBHOOK_HMAC_CHECKS").ok(), false);
        let hmac_secret = Secret::new(env::var("SF_WEBHOOK_HMAC_SECRET").unwrap_or_default());
        if hmac_checks && hmac_secret.reveal().is_empty() {
            error!(
                "🪛️ SF_WEBHOOK_HMAC_CHECKS is on, but SF_WEBHOOK_HMAC_SECRET is not set. Every payment callback will be \
                 rejected."
            );
        }
        let hmac_header = env::var("SF_WEBHOOK_HMAC_HEADER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_HMAC_HEADER.to_string());
        Self { whitelist, hmac_checks, hmac_secret, hmac_header }
    }
}

/// Parses a comma-separated list of IP addresses. "none", "false" or "0" explicitly disable the whitelist.
pub fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>().map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in the whitelist: {e}")).ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn parse_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}
