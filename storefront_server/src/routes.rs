//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here waits on the database or on SonicPesa, so they
//! are all async and never block.
use actix_web::{get, options, web, HttpResponse, Responder};
use log::*;
use sonicpesa_tools::PaymentCallback;
use storefront_engine::{
    checkout_objects::{CheckoutError, CheckoutRequest, CheckoutStep},
    CheckoutApi,
    PaymentProvider,
    ReconciliationApi,
    ReconciliationError,
    ReconciliationOutcome,
    StorefrontDatabase,
};

use crate::{
    data_objects::{CheckoutResponse, JsonResponse},
    integrations::sonicpesa::payment_result_from_callback,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------  Preflight  ----------------------------------------------------
// The CORS headers themselves are added to every response by the server's default headers.
#[options("/checkout")]
pub async fn checkout_preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}

#[options("/webhook/sonicpesa")]
pub async fn webhook_preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl StorefrontDatabase, PaymentProvider);
/// Route handler for the checkout endpoint.
///
/// Saves the order and asks SonicPesa to push a payment prompt to the buyer's phone. A successful response only means
/// the prompt went out; the buyer confirms on their phone and the result arrives on the webhook.
///
/// | Outcome                        | Status |
/// |--------------------------------|--------|
/// | Payment prompt dispatched      | 200    |
/// | Invalid request                | 400    |
/// | SonicPesa refused or timed out | 502    |
/// | Order could not be saved       | 500    |
pub async fn checkout<B, P>(body: web::Bytes, api: web::Data<CheckoutApi<B, P>>) -> HttpResponse
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    trace!("💻️ Received checkout request");
    let request = match serde_json::from_slice::<CheckoutRequest>(body.as_ref()) {
        Ok(r) => r,
        Err(e) => {
            debug!("💻️ Could not deserialize checkout request. {e}");
            let message = format!("Invalid checkout request. {e}");
            return HttpResponse::BadRequest().json(CheckoutResponse::failure(message, CheckoutStep::Validation, None));
        },
    };
    match api.checkout(request).await {
        Ok(receipt) => {
            let order_number = receipt.order.order_number;
            debug!("💻️ Checkout for order {order_number} complete");
            HttpResponse::Ok()
                .json(CheckoutResponse::success("Payment request dispatched, confirm on your phone", order_number))
        },
        Err(e) => checkout_error_response(e),
    }
}

fn checkout_error_response(err: CheckoutError) -> HttpResponse {
    let step = err.step();
    match err {
        CheckoutError::Validation(e) => {
            debug!("💻️ Rejected checkout request. {e}");
            HttpResponse::BadRequest().json(CheckoutResponse::failure(e, step, None))
        },
        CheckoutError::Payment { order_number, source } => {
            warn!("💻️ Payment request for order {order_number} failed. {source}");
            if let Some(payload) = source.payload() {
                debug!("💻️ Provider response for order {order_number}: {payload}");
            }
            let message = "We could not send the payment request to your phone. Please try again.";
            HttpResponse::BadGateway().json(CheckoutResponse::failure(message, step, Some(order_number)))
        },
        CheckoutError::Persistence { step, reason } => {
            error!("💻️ Checkout failed: could not {step}. {reason}");
            let message = "Your order could not be saved. Please try again.";
            HttpResponse::InternalServerError().json(CheckoutResponse::failure(message, step, None))
        },
    }
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(sonicpesa_webhook => Post "/sonicpesa" impl StorefrontDatabase);
/// Route handler for SonicPesa payment callbacks.
///
/// SonicPesa retries deliveries that do not get a 200 response, and reconciliation is idempotent, so this handler
/// always answers 200. Whether the callback was applied is reported in the `success` field.
pub async fn sonicpesa_webhook<B>(body: web::Bytes, api: web::Data<ReconciliationApi<B>>) -> HttpResponse
where B: StorefrontDatabase {
    trace!("💻️ Received SonicPesa callback: {}", String::from_utf8_lossy(body.as_ref()));
    let callback = match serde_json::from_slice::<PaymentCallback>(body.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            warn!("💻️ Could not deserialize SonicPesa callback. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Could not read payment callback."));
        },
    };
    let provider_order_id = callback.order_id.clone();
    let result = payment_result_from_callback(callback);
    let response = match api.reconcile(result).await {
        Ok(ReconciliationOutcome::Settled { transaction, .. }) => {
            JsonResponse::success(format!("Payment {provider_order_id} is {}.", transaction.status))
        },
        Ok(ReconciliationOutcome::Synthesized { transaction }) => {
            JsonResponse::success(format!("Payment {provider_order_id} recorded as {}.", transaction.status))
        },
        Ok(ReconciliationOutcome::Duplicate { .. }) => {
            JsonResponse::success(format!("Payment {provider_order_id} was already processed."))
        },
        Err(ReconciliationError::MissingProviderOrderId) => {
            warn!("💻️ SonicPesa callback did not include an order id");
            JsonResponse::failure("Payment callback is missing an order id.")
        },
        Err(ReconciliationError::StoreError(e)) => {
            error!("💻️ Could not reconcile SonicPesa callback for {provider_order_id}. {e}");
            JsonResponse::failure("Payment callback could not be processed.")
        },
    };
    HttpResponse::Ok().json(response)
}
