//! Writes an audit trail of storefront events to the log.
use log::*;
use storefront_engine::events::{
    EventHandlers,
    EventHooks,
    OrderExpiredEvent,
    OrderPlacedEvent,
    PaymentSettledEvent,
};

pub const AUDIT_EVENT_BUFFER_SIZE: usize = 25;

pub fn create_audit_log_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_placed(|ev| {
        Box::pin(async move {
            let OrderPlacedEvent { customer, order, transaction } = ev;
            let charge = transaction
                .and_then(|tx| tx.sonicpesa_order_id)
                .unwrap_or_else(|| "an unrecorded charge".to_string());
            info!(
                "📬️ Order {} placed by customer #{} for {} {}. Awaiting payment on {charge}.",
                order.order_number, customer.id, order.total_amount, order.currency
            );
        })
    });
    hooks.on_payment_settled(|ev| {
        Box::pin(async move {
            let PaymentSettledEvent { transaction, order, synthesized } = ev;
            let charge = transaction.sonicpesa_order_id.as_deref().unwrap_or("<no id>");
            let order_number = order.as_ref().map(|o| o.order_number.as_str()).unwrap_or("<no order>");
            if synthesized {
                warn!(
                    "📬️ Charge {charge} was {} without a matching ledger entry. Recorded {} {} with {} profit.",
                    transaction.status, transaction.amount, transaction.currency, transaction.profit
                );
            } else {
                info!(
                    "📬️ Charge {charge} for order {order_number} was {}. Profit booked: {} {}",
                    transaction.status, transaction.profit, transaction.currency
                );
            }
        })
    });
    hooks.on_order_expired(|ev| {
        Box::pin(async move {
            let OrderExpiredEvent { order, transactions } = ev;
            info!(
                "📬️ Order {} was never paid and has been cancelled. {} pending charge(s) closed.",
                order.order_number,
                transactions.len()
            );
        })
    });
    EventHandlers::new(AUDIT_EVENT_BUFFER_SIZE, hooks)
}
