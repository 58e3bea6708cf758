use chrono::Duration;
use thiserror::Error;

use crate::{
    checkout_objects::CheckoutStep,
    db_types::{NewCustomer, NewOrder, NewPaymentTransaction, PaymentResult, PaymentTransaction, ProfitMargin},
    traits::{
        data_objects::{ExpiredOrder, PendingOrder, ReconciliationOutcome},
        LedgerQueries,
    },
};

/// This trait defines the state transitions a backend must support to drive the storefront checkout and payment
/// reconciliation flows.
///
/// Every method must be atomic: either all of its writes are committed, or none are.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone + LedgerQueries {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates the customer (if they do not exist yet), the order and its lines in a single atomic transaction.
    ///
    /// The customer is matched by phone number first and then by email. The order is created with status `pending`
    /// and payment status `pending`, and its subtotal and total are calculated from the lines.
    ///
    /// Failures are reported as [`StoreError::CheckoutStepFailed`], naming the step that failed.
    async fn create_pending_order(&self, customer: NewCustomer, order: NewOrder) -> Result<PendingOrder, StoreError>;

    /// Records a `pending` ledger entry for a charge the payment provider has accepted.
    ///
    /// Fails with [`StoreError::TransactionAlreadyExists`] if the provider order id has been recorded before.
    async fn insert_pending_transaction(
        &self,
        transaction: NewPaymentTransaction,
    ) -> Result<PaymentTransaction, StoreError>;

    /// Applies a payment callback to the ledger in a single atomic transaction.
    ///
    /// * A `pending` transaction matching the provider order id moves to `completed` or `failed`. Profit is booked
    ///   on completion using `margin`. The linked order's payment status follows, if it is still `pending`, and a
    ///   completed payment credits the customer's lifetime metrics.
    /// * A transaction that has already settled is left alone. This makes callback re-delivery harmless.
    /// * If there is no matching transaction, one is recorded directly in its terminal state, with no order linkage.
    ///   `default_currency` is used when the callback does not name one.
    async fn settle_transaction(
        &self,
        result: &PaymentResult,
        margin: ProfitMargin,
        default_currency: &str,
    ) -> Result<ReconciliationOutcome, StoreError>;

    /// Cancels orders that have been awaiting payment for longer than `older_than`, and fails their pending
    /// transactions with the `EXPIRED` result code.
    async fn expire_pending_orders(&self, older_than: Duration) -> Result<Vec<ExpiredOrder>, StoreError>;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Could not {step}. {reason}")]
    CheckoutStepFailed { step: CheckoutStep, reason: String },
    #[error("Order {0} already exists")]
    OrderAlreadyExists(String),
    #[error("A transaction for SonicPesa order {0} has already been recorded")]
    TransactionAlreadyExists(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        StoreError::DatabaseError(format!("Migration failed. {e}"))
    }
}

impl StoreError {
    /// Tags a failure with the checkout step it happened in, unless it is already tagged.
    pub fn during(self, step: CheckoutStep) -> Self {
        match self {
            e @ StoreError::CheckoutStepFailed { .. } => e,
            e => StoreError::CheckoutStepFailed { step, reason: e.to_string() },
        }
    }
}
