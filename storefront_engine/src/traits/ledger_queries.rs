use crate::{
    db_types::{Customer, Order, OrderLine, PaymentTransaction},
    traits::StoreError,
};

/// Read-only access to the records written by the checkout and reconciliation flows.
#[allow(async_fn_in_trait)]
pub trait LedgerQueries {
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError>;

    /// The lines of the given order, in insertion order.
    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, StoreError>;

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, StoreError>;

    /// Looks a customer up by normalized phone number.
    async fn fetch_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, StoreError>;

    async fn fetch_transaction_by_provider_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<PaymentTransaction>, StoreError>;

    /// All transactions linked to the order, oldest first.
    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<PaymentTransaction>, StoreError>;
}
