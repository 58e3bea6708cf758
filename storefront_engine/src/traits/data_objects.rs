use serde::Serialize;

use crate::db_types::{Customer, Order, OrderLine, PaymentTransaction};

/// Everything written by the first, atomic half of a checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PendingOrder {
    pub customer: Customer,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// What a payment callback did to the ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// A pending transaction moved to its terminal state. `order` is the linked order after it was updated, if the
    /// transaction is linked to one.
    Settled { transaction: PaymentTransaction, order: Option<Order> },
    /// The transaction had already settled. Nothing was changed.
    Duplicate { transaction: PaymentTransaction },
    /// No transaction matched the provider order id, so one was recorded directly in its terminal state.
    Synthesized { transaction: PaymentTransaction },
}

impl ReconciliationOutcome {
    pub fn transaction(&self) -> &PaymentTransaction {
        match self {
            Self::Settled { transaction, .. } | Self::Duplicate { transaction } | Self::Synthesized { transaction } => {
                transaction
            },
        }
    }

    /// True if this callback changed any state.
    pub fn is_state_change(&self) -> bool {
        !matches!(self, Self::Duplicate { .. })
    }
}

/// An abandoned order that has been cancelled, along with the pending transactions that were failed with it.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiredOrder {
    pub order: Order,
    pub transactions: Vec<PaymentTransaction>,
}
