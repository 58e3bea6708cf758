//! `SqliteDatabase` is a concrete implementation of a storefront engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{customers, db_url, new_pool, orders, transactions};
use crate::{
    checkout_objects::CheckoutStep,
    db_types::{
        Customer,
        NewCustomer,
        NewOrder,
        NewPaymentTransaction,
        Order,
        OrderLine,
        PaymentResult,
        PaymentTransaction,
        ProfitMargin,
        TransactionStatus,
        EXPIRED_RESULT,
    },
    traits::{ExpiredOrder, LedgerQueries, PendingOrder, ReconciliationOutcome, StoreError, StorefrontDatabase},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_pending_order(&self, customer: NewCustomer, order: NewOrder) -> Result<PendingOrder, StoreError> {
        // Detached, so that a dropped request never hands a connection back to the pool mid-transaction
        let saved = tokio::spawn(place_pending_order(self.pool.clone(), customer, order)).await.map_err(|e| {
            StoreError::DatabaseError(format!("Checkout task did not complete. {e}")).during(CheckoutStep::Customer)
        })??;
        debug!(
            "🗃️ Order {} ({} {}, {} lines) saved with id {} for customer #{}",
            saved.order.order_number,
            saved.order.total_amount,
            saved.order.currency,
            saved.lines.len(),
            saved.order.id,
            saved.customer.id
        );
        Ok(saved)
    }

    async fn insert_pending_transaction(
        &self,
        transaction: NewPaymentTransaction,
    ) -> Result<PaymentTransaction, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::insert_pending(transaction, &mut conn).await?;
        debug!(
            "🗃️ Pending transaction #{} recorded for order {:?} (SonicPesa order {:?})",
            tx.id, tx.order_id, tx.sonicpesa_order_id
        );
        Ok(tx)
    }

    async fn settle_transaction(
        &self,
        result: &PaymentResult,
        margin: ProfitMargin,
        default_currency: &str,
    ) -> Result<ReconciliationOutcome, StoreError> {
        let provider_id = result.provider_order_id.as_str();
        let mut tx = self.pool.begin().await?;
        // Writing first takes the write lock, so that concurrent callbacks for the same charge queue up here
        let outcome = match transactions::settle_pending(result, margin, &mut tx).await? {
            Some(settled) => {
                debug!("🗃️ Transaction #{} for SonicPesa order {provider_id} is now {}", settled.id, settled.status);
                let order = match settled.order_id {
                    Some(order_id) => apply_to_order(order_id, &settled, &mut tx).await?,
                    None => None,
                };
                ReconciliationOutcome::Settled { transaction: settled, order }
            },
            None => match transactions::fetch_by_provider_id(provider_id, &mut tx).await? {
                Some(existing) => {
                    trace!("🗃️ Transaction #{} for SonicPesa order {provider_id} had already settled", existing.id);
                    ReconciliationOutcome::Duplicate { transaction: existing }
                },
                None => match transactions::insert_settled(result, margin, default_currency, &mut tx).await? {
                    Some(synthesized) => {
                        debug!(
                            "🗃️ No ledger entry for SonicPesa order {provider_id}. Recorded transaction #{} as {}",
                            synthesized.id, synthesized.status
                        );
                        ReconciliationOutcome::Synthesized { transaction: synthesized }
                    },
                    None => {
                        let existing = transactions::fetch_by_provider_id(provider_id, &mut tx).await?.ok_or_else(|| {
                            StoreError::DatabaseError(format!(
                                "Transaction for SonicPesa order {provider_id} was neither inserted nor found"
                            ))
                        })?;
                        ReconciliationOutcome::Duplicate { transaction: existing }
                    },
                },
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn expire_pending_orders(&self, older_than: Duration) -> Result<Vec<ExpiredOrder>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let cancelled = orders::cancel_abandoned_orders(older_than, &mut tx).await?;
        let mut result = Vec::with_capacity(cancelled.len());
        for order in cancelled {
            let transactions = transactions::expire_for_order(order.id, &mut tx).await?;
            trace!(
                "🗃️ Order {} cancelled. {} pending transactions marked as {EXPIRED_RESULT}",
                order.order_number,
                transactions.len()
            );
            result.push(ExpiredOrder { order, transactions });
        }
        tx.commit().await?;
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Saves the customer, the order and its lines in a single `BEGIN IMMEDIATE` transaction.
///
/// The customer upsert reads before it writes. A deferred transaction in that position cannot wait on the busy timeout
/// when another checkout holds the write lock, so it would fail with `SQLITE_BUSY` instead of queuing.
async fn place_pending_order(
    pool: SqlitePool,
    customer: NewCustomer,
    order: NewOrder,
) -> Result<PendingOrder, StoreError> {
    let mut conn = pool.acquire().await.map_err(|e| StoreError::from(e).during(CheckoutStep::Customer))?;
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::from(e).during(CheckoutStep::Customer))?;
    let result = match insert_pending_order(customer, order, &mut conn).await {
        Ok(saved) => sqlx::query("COMMIT")
            .execute(&mut *conn)
            .await
            .map(|_| saved)
            .map_err(|e| StoreError::from(e).during(CheckoutStep::OrderLines)),
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
            warn!("🗃️ Could not roll back the failed checkout. Discarding the connection. {e}");
            drop(conn.detach());
        }
    }
    result
}

async fn insert_pending_order(
    customer: NewCustomer,
    order: NewOrder,
    conn: &mut sqlx::SqliteConnection,
) -> Result<PendingOrder, StoreError> {
    let customer = customers::upsert_customer(customer, &mut *conn).await.map_err(|e| e.during(CheckoutStep::Customer))?;
    trace!("🗃️ Checkout {} will be placed for customer #{}", order.order_number, customer.id);
    let saved = orders::insert_order(customer.id, &order, &mut *conn).await.map_err(|e| e.during(CheckoutStep::Order))?;
    let lines = orders::insert_order_lines(saved.id, &order.lines, &mut *conn)
        .await
        .map_err(|e| StoreError::from(e).during(CheckoutStep::OrderLines))?;
    Ok(PendingOrder { customer, order: saved, lines })
}

/// Carries a settled transaction through to its order and, on completion, to the customer's lifetime metrics.
async fn apply_to_order(
    order_id: i64,
    settled: &PaymentTransaction,
    conn: &mut sqlx::SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    match orders::apply_payment_outcome(order_id, settled.status, &mut *conn).await? {
        Some(order) => {
            if settled.status == TransactionStatus::Completed {
                if let Some(customer_id) = order.customer_id {
                    customers::record_completed_order(customer_id, order.total_amount, &mut *conn).await?;
                }
            }
            Ok(Some(order))
        },
        None => {
            let order = orders::fetch_order(order_id, &mut *conn).await?;
            match &order {
                Some(o) if settled.status == TransactionStatus::Completed => error!(
                    "🗃️ Transaction #{} completed, but order {} was no longer awaiting payment (it is {}/{}). Someone \
                     should check whether the buyer must be refunded.",
                    settled.id, o.order_number, o.status, o.payment_status
                ),
                Some(o) => warn!(
                    "🗃️ Transaction #{} failed, but order {} was no longer awaiting payment. The order is unchanged.",
                    settled.id, o.order_number
                ),
                None => warn!("🗃️ Transaction #{} refers to order #{order_id}, which does not exist", settled.id),
            }
            Ok(order)
        },
    }
}

impl LedgerQueries for SqliteDatabase {
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(id, &mut conn).await?)
    }

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_number(order_number, &mut conn).await?)
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_lines(order_id, &mut conn).await?)
    }

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(customers::fetch_customer(id, &mut conn).await?)
    }

    async fn fetch_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(customers::fetch_customer_by_phone(phone, &mut conn).await?)
    }

    async fn fetch_transaction_by_provider_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<PaymentTransaction>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_by_provider_id(provider_order_id, &mut conn).await?)
    }

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<PaymentTransaction>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_for_order(order_id, &mut conn).await?)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
