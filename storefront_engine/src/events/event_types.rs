use crate::db_types::{Customer, Order, PaymentTransaction};

/// A checkout has saved its order and dispatched the payment prompt.
#[derive(Debug, Clone)]
pub struct OrderPlacedEvent {
    pub customer: Customer,
    pub order: Order,
    pub transaction: Option<PaymentTransaction>,
}

/// A payment callback moved a transaction to its terminal state.
#[derive(Debug, Clone)]
pub struct PaymentSettledEvent {
    pub transaction: PaymentTransaction,
    /// The linked order after the update, if the transaction has one.
    pub order: Option<Order>,
    /// True if the callback did not match any ledger entry and the transaction was recorded from the callback alone.
    pub synthesized: bool,
}

#[derive(Debug, Clone)]
pub struct OrderExpiredEvent {
    pub order: Order,
    pub transactions: Vec<PaymentTransaction>,
}
