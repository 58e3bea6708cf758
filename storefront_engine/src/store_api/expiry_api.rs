use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    events::{EventProducers, OrderExpiredEvent},
    traits::{ExpiredOrder, StoreError, StorefrontDatabase},
};

/// Cancels orders whose payment never settled.
///
/// Buyers abandon USSD prompts, and payment requests sometimes fail after the order has been saved. Such orders would
/// otherwise stay `pending` forever.
pub struct ExpiryApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ExpiryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExpiryApi")
    }
}

impl<B> ExpiryApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ExpiryApi<B>
where B: StorefrontDatabase
{
    /// Cancels orders that have been awaiting payment for at least `timeout`, failing their pending transactions.
    pub async fn expire_abandoned_orders(&self, timeout: Duration) -> Result<Vec<ExpiredOrder>, StoreError> {
        let expired = self.db.expire_pending_orders(timeout).await?;
        for e in &expired {
            info!(
                "🕰️ Order {} ({} {}) was never paid and has been cancelled",
                e.order.order_number, e.order.total_amount, e.order.currency
            );
            let event = OrderExpiredEvent { order: e.order.clone(), transactions: e.transactions.clone() };
            self.producers.publish_order_expired(event).await;
        }
        Ok(expired)
    }
}
