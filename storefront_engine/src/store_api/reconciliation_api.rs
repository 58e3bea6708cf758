use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{PaymentResult, ProfitMargin, EXPIRED_RESULT},
    events::{EventProducers, PaymentSettledEvent},
    store_api::errors::ReconciliationError,
    traits::{ReconciliationOutcome, StorefrontDatabase},
};

/// `ReconciliationApi` applies payment provider callbacks to the transaction ledger, the orders and the customers.
///
/// Callbacks may be delivered more than once, out of order, or for charges the ledger has never seen. Each charge
/// is settled at most once, whatever the delivery pattern.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
    margin: ProfitMargin,
    default_currency: String,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi (margin: {})", self.margin)
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self {
            db,
            producers,
            margin: ProfitMargin::default(),
            default_currency: storefront_common::DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_margin(mut self, margin: ProfitMargin) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_default_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.default_currency = currency.into();
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn margin(&self) -> ProfitMargin {
        self.margin
    }
}

impl<B> ReconciliationApi<B>
where B: StorefrontDatabase
{
    /// Applies a payment callback.
    ///
    /// A `SUCCESS` result completes the matching pending transaction, books profit, marks the order paid and moves it
    /// on to processing, and credits the customer. Any other result fails the transaction and the order's payment.
    /// Re-delivered callbacks change nothing and are reported as [`ReconciliationOutcome::Duplicate`].
    pub async fn reconcile(&self, mut result: PaymentResult) -> Result<ReconciliationOutcome, ReconciliationError> {
        result.provider_order_id = result.provider_order_id.trim().to_string();
        if result.provider_order_id.is_empty() {
            return Err(ReconciliationError::MissingProviderOrderId);
        }
        let provider_id = result.provider_order_id.clone();
        trace!("🧾️ Reconciling callback for SonicPesa order {provider_id}: {}", result.result);
        let outcome = self.db.settle_transaction(&result, self.margin, &self.default_currency).await?;
        match &outcome {
            ReconciliationOutcome::Settled { transaction, order } => {
                info!(
                    "🧾️ SonicPesa order {provider_id} settled as {} ({}). Profit: {}. Order: {}",
                    transaction.status,
                    result.result,
                    transaction.profit,
                    order.as_ref().map(|o| o.order_number.as_str()).unwrap_or("none")
                );
                let event = PaymentSettledEvent { transaction: transaction.clone(), order: order.clone(), synthesized: false };
                self.producers.publish_payment_settled(event).await;
            },
            ReconciliationOutcome::Synthesized { transaction } => {
                warn!(
                    "🧾️ Callback for unknown SonicPesa order {provider_id}. Recorded transaction #{} as {} without an \
                     order.",
                    transaction.id, transaction.status
                );
                let event = PaymentSettledEvent { transaction: transaction.clone(), order: None, synthesized: true };
                self.producers.publish_payment_settled(event).await;
            },
            ReconciliationOutcome::Duplicate { transaction } => {
                if transaction.result.as_deref() == Some(EXPIRED_RESULT) && result.is_success() {
                    error!(
                        "🧾️ SonicPesa reports a successful payment for order {provider_id}, but its transaction #{} \
                         had already expired. The buyer has paid for a cancelled order and needs attention.",
                        transaction.id
                    );
                } else if transaction.status != result.terminal_status() {
                    warn!(
                        "🧾️ Conflicting callback for SonicPesa order {provider_id}: now {}, but transaction #{} \
                         already settled as {}. Keeping the original outcome.",
                        result.result, transaction.id, transaction.status
                    );
                } else {
                    debug!("🧾️ Duplicate callback for SonicPesa order {provider_id} ignored");
                }
            },
        }
        Ok(outcome)
    }
}
