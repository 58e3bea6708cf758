use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::{DefaultHeaders, Logger},
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::*;
use storefront_engine::{
    events::EventProducers,
    CheckoutApi,
    PaymentProvider,
    ReconciliationApi,
    SqliteDatabase,
    StorefrontDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    helpers::get_remote_ip,
    integrations::{audit_log::create_audit_log_handlers, sonicpesa::SonicPesaProvider},
    middleware::HmacMiddlewareFactory,
    routes::{checkout_preflight, health, webhook_preflight, CheckoutRoute, SonicpesaWebhookRoute},
};

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_audit_log_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _expiry_worker = start_expiry_worker(db.clone(), producers.clone(), config.pending_order_timeout);
    let provider =
        SonicPesaProvider::new(config.sonicpesa.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, provider, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<P>(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: P,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    P: PaymentProvider + Clone + Send + 'static,
{
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(cors_headers(&config.cors_allowed_origin))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("storefront::access_log"))
            .configure(|cfg| configure_routes(cfg, &config, db.clone(), provider.clone(), producers.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_addr)?
    .run();
    Ok(srv)
}

/// The CORS headers added to every response.
pub fn cors_headers(allowed_origin: &str) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", allowed_origin.to_string()))
        .add(("Access-Control-Allow-Headers", ALLOWED_HEADERS))
        .add(("Access-Control-Allow-Methods", ALLOWED_METHODS))
}

/// Registers the APIs and every route on `cfg`.
///
/// The preflight route for the webhook is registered ahead of the `/webhook` scope so that `OPTIONS` requests never
/// hit the IP whitelist or the signature check.
pub fn configure_routes<B, P>(
    cfg: &mut ServiceConfig,
    config: &ServerConfig,
    db: B,
    provider: P,
    producers: EventProducers,
) where
    B: StorefrontDatabase + Clone + 'static,
    P: PaymentProvider + 'static,
{
    let checkout_api = CheckoutApi::new(db.clone(), provider, config.checkout_options(), producers.clone());
    let reconciliation_api = ReconciliationApi::new(db, producers)
        .with_margin(config.profit_margin)
        .with_default_currency(config.currency.as_str());
    let use_x_forwarded_for = config.use_x_forwarded_for;
    let use_forwarded = config.use_forwarded;
    let whitelist = config.webhook.whitelist.clone();
    let webhook = &config.webhook;
    let webhook_scope = web::scope("/webhook")
        .wrap(HmacMiddlewareFactory::new(&webhook.hmac_header, webhook.hmac_secret.clone(), webhook.hmac_checks))
        .wrap_fn(move |req, srv| {
            let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
            let whitelisted = match (peer_ip, &whitelist) {
                (_, None) => true,
                (Some(ip), Some(whitelist)) => {
                    debug!("💻️ Payment callback from {ip}");
                    whitelist.contains(&ip)
                },
                (None, Some(_)) => {
                    warn!("💻️ No IP address found in payment callback request, denying access.");
                    false
                },
            };
            if whitelisted {
                srv.call(req).boxed_local()
            } else {
                warn!("💻️ Payment callback from {peer_ip:?} is not whitelisted. Denying access.");
                ok(req.error_response(ServerError::ForbiddenPeer)).boxed_local()
            }
        })
        .service(SonicpesaWebhookRoute::<B>::new());
    cfg.app_data(web::Data::new(checkout_api))
        .app_data(web::Data::new(reconciliation_api))
        .service(health)
        .service(checkout_preflight)
        .service(webhook_preflight)
        .service(CheckoutRoute::<B, P>::new())
        .service(webhook_scope);
}
