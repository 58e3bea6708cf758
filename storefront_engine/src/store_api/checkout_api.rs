use std::fmt::Debug;

use log::*;

use crate::{
    checkout_objects::{CheckoutError, CheckoutOptions, CheckoutReceipt, CheckoutRequest, CheckoutStep},
    db_types::NewPaymentTransaction,
    events::{EventProducers, OrderPlacedEvent},
    helpers::new_order_number,
    traits::{PaymentProvider, PaymentRequest, PendingOrder, StoreError, StorefrontDatabase},
};

/// `CheckoutApi` drives a checkout from the buyer's cart through to a dispatched payment prompt.
pub struct CheckoutApi<B, P> {
    db: B,
    provider: P,
    options: CheckoutOptions,
    producers: EventProducers,
}

impl<B, P> Debug for CheckoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.options.currency)
    }
}

impl<B, P> CheckoutApi<B, P> {
    pub fn new(db: B, provider: P, options: CheckoutOptions, producers: EventProducers) -> Self {
        Self { db, provider, options, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn options(&self) -> &CheckoutOptions {
        &self.options
    }
}

impl<B, P> CheckoutApi<B, P>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    /// Runs a checkout.
    ///
    /// 1. The request is validated and the buyer's phone number normalized. Nothing is written if this fails.
    /// 2. The customer, order and order lines are saved in one atomic unit. The order is `pending`.
    /// 3. The payment provider is asked to push a payment prompt to the buyer's phone. If it fails, the order is kept
    ///    as an abandoned `pending` order, which is cancelled later by the expiry worker.
    /// 4. A `pending` transaction is recorded in the ledger. The payment prompt has already gone out at this point,
    ///    so unless [`CheckoutOptions::strict_ledger`] is set a failure here is logged and the checkout still
    ///    succeeds.
    ///
    /// The buyer completes the payment on their phone, and the outcome arrives later via the payment callback.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, CheckoutError> {
        let checkout = self.options.validate(request, new_order_number())?;
        let buyer_name = checkout.buyer_name.clone();
        let buyer_email = checkout.customer.email.clone();
        let PendingOrder { customer, order, lines } =
            self.db.create_pending_order(checkout.customer, checkout.order).await.map_err(|e| {
                error!("🛒️ Could not save checkout. {e}");
                persistence_error(e, CheckoutStep::Order)
            })?;
        debug!("🛒️ Order {} saved for customer #{}. Requesting payment.", order.order_number, customer.id);

        let buyer_phone = customer.phone.clone().unwrap_or_default();
        let payment_request = PaymentRequest {
            correlation_id: order.order_number.clone(),
            buyer_phone: buyer_phone.clone(),
            amount: order.total_amount,
            currency: order.currency.clone(),
            buyer_name: Some(buyer_name.clone()),
            buyer_email: buyer_email.clone(),
        };
        let dispatch = self.provider.request_payment(payment_request).await.map_err(|e| {
            warn!("🛒️ Payment request for order {} failed. The order remains pending. {e}", order.order_number);
            if let Some(payload) = e.payload() {
                debug!("🛒️ Provider response for order {}: {payload}", order.order_number);
            }
            CheckoutError::Payment { order_number: order.order_number.clone(), source: e }
        })?;

        let new_transaction = NewPaymentTransaction {
            order_id: Some(order.id),
            customer_id: Some(customer.id),
            sonicpesa_order_id: dispatch.provider_order_id.clone(),
            amount: order.total_amount,
            currency: order.currency.clone(),
            buyer_phone,
            buyer_name: Some(buyer_name),
            buyer_email,
        };
        let transaction = match self.db.insert_pending_transaction(new_transaction).await {
            Ok(tx) => Some(tx),
            Err(e) if self.options.strict_ledger => {
                error!("🛒️ Could not record the transaction for order {}. {e}", order.order_number);
                return Err(persistence_error(e, CheckoutStep::Transaction));
            },
            Err(e) => {
                error!(
                    "🛒️ Could not record the transaction for order {} (SonicPesa order {:?}). The payment prompt has \
                     been sent, so the checkout stands. {e}",
                    order.order_number, dispatch.provider_order_id
                );
                None
            },
        };
        info!(
            "🛒️ Checkout complete. Order {} for {} {} awaits payment from {}",
            order.order_number,
            order.total_amount,
            order.currency,
            customer.phone.as_deref().unwrap_or_default()
        );
        let event = OrderPlacedEvent { customer: customer.clone(), order: order.clone(), transaction: transaction.clone() };
        self.producers.publish_order_placed(event).await;
        Ok(CheckoutReceipt { customer, order, lines, transaction, provider_order_id: dispatch.provider_order_id })
    }
}

fn persistence_error(e: StoreError, default_step: CheckoutStep) -> CheckoutError {
    match e.during(default_step) {
        StoreError::CheckoutStepFailed { step, reason } => CheckoutError::Persistence { step, reason },
        other => CheckoutError::Persistence { step: default_step, reason: other.to_string() },
    }
}
