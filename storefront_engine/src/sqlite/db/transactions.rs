use log::*;
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{
        Amount,
        NewPaymentTransaction,
        PaymentResult,
        PaymentTransaction,
        ProfitMargin,
        TransactionStatus,
        EXPIRED_RESULT,
    },
    traits::StoreError,
};

/// Records a `pending` ledger entry for a charge the provider has accepted.
pub async fn insert_pending(
    transaction: NewPaymentTransaction,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransaction, StoreError> {
    let provider_id = transaction.sonicpesa_order_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                order_id,
                customer_id,
                sonicpesa_order_id,
                amount,
                currency,
                buyer_phone,
                buyer_name,
                buyer_email,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING *;
        "#,
    )
    .bind(transaction.order_id)
    .bind(transaction.customer_id)
    .bind(transaction.sonicpesa_order_id)
    .bind(transaction.amount)
    .bind(transaction.currency)
    .bind(transaction.buyer_phone)
    .bind(transaction.buyer_name)
    .bind(transaction.buyer_email)
    .fetch_one(conn)
    .await;
    match result {
        Ok(tx) => Ok(tx),
        Err(e) if is_unique_violation(&e) => {
            Err(StoreError::TransactionAlreadyExists(provider_id.unwrap_or_default()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_by_provider_id(
    provider_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    let tx = sqlx::query_as("SELECT * FROM transactions WHERE sonicpesa_order_id = $1")
        .bind(provider_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

pub async fn fetch_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<PaymentTransaction>, sqlx::Error> {
    let txs = sqlx::query_as("SELECT * FROM transactions WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}

/// Moves the `pending` transaction with the given provider order id to its terminal state.
///
/// The update is conditional on the transaction still being `pending`, so of any number of concurrent or repeated
/// callbacks for the same charge, exactly one gets a row back. Profit is booked on completion, on the callback's
/// amount if it quotes one and on the ledger amount otherwise.
///
/// Returns `None` if there is no pending transaction for the provider order id.
pub async fn settle_pending(
    result: &PaymentResult,
    margin: ProfitMargin,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    let status = result.terminal_status();
    let profit_bps = match status {
        TransactionStatus::Completed => i64::from(margin.basis_points()),
        _ => 0,
    };
    let tx = sqlx::query_as(
        r#"
            UPDATE transactions SET
                status = $1,
                result = $2,
                reference = COALESCE($3, reference),
                provider_timestamp = COALESCE($4, provider_timestamp),
                profit = MAX(0, COALESCE($5, amount) * $6 / 10000),
                updated_at = CURRENT_TIMESTAMP
            WHERE sonicpesa_order_id = $7 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(&result.result)
    .bind(&result.reference)
    .bind(&result.timestamp)
    .bind(result.amount)
    .bind(profit_bps)
    .bind(&result.provider_order_id)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

/// Records a callback for a charge that has no ledger entry, directly in its terminal state and without an order.
///
/// Returns `None` if a transaction with the same provider order id was recorded concurrently.
pub async fn insert_settled(
    result: &PaymentResult,
    margin: ProfitMargin,
    default_currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    let status = result.terminal_status();
    let amount = result.amount.unwrap_or_else(|| {
        warn!("🗃️ Callback for SonicPesa order {} has no amount. Recording 0.", result.provider_order_id);
        Amount::default()
    });
    let profit = match status {
        TransactionStatus::Completed => margin.profit_on(amount),
        _ => Amount::default(),
    };
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                sonicpesa_order_id,
                reference,
                amount,
                currency,
                buyer_phone,
                status,
                result,
                profit,
                provider_timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(&result.provider_order_id)
    .bind(&result.reference)
    .bind(amount)
    .bind(result.currency.as_deref().unwrap_or(default_currency))
    .bind(result.buyer_phone.as_deref().unwrap_or_default())
    .bind(status)
    .bind(&result.result)
    .bind(profit)
    .bind(&result.timestamp)
    .fetch_one(conn)
    .await;
    match inserted {
        Ok(tx) => Ok(Some(tx)),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Fails the pending transactions of an abandoned order with the `EXPIRED` result code.
pub async fn expire_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<PaymentTransaction>, sqlx::Error> {
    let txs = sqlx::query_as(
        r#"
            UPDATE transactions SET
                status = 'failed',
                result = $1,
                profit = 0,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(EXPIRED_RESULT)
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(txs)
}
