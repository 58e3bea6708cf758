use chrono::Duration;
use log::*;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{NewOrder, NewOrderLine, Order, OrderLine, TransactionStatus},
    traits::StoreError,
};

/// Inserts a new order for the customer, with status `pending` and payment status `pending`.
///
/// This is not atomic. Embed the call in a transaction alongside [`insert_order_lines`], and pass `&mut tx` as the
/// connection argument.
pub async fn insert_order(customer_id: i64, order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let (Some(subtotal), Some(total)) = (order.checked_subtotal(), order.checked_total()) else {
        return Err(StoreError::DatabaseError(format!("The totals for order {} overflow", order.order_number)));
    };
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                subtotal,
                tax_amount,
                shipping_amount,
                discount_amount,
                total_amount,
                currency,
                shipping_address,
                billing_address,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(&order.order_number)
    .bind(customer_id)
    .bind(subtotal)
    .bind(order.tax_amount)
    .bind(order.shipping_amount)
    .bind(order.discount_amount)
    .bind(total)
    .bind(&order.currency)
    .bind(order.shipping_address.clone().map(Json))
    .bind(order.billing_address.clone().map(Json))
    .bind(&order.notes)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(e) if is_unique_violation(&e) => Err(StoreError::OrderAlreadyExists(order.order_number.clone())),
        Err(e) => Err(e.into()),
    }
}

/// Inserts the lines for an order. The total price of each line is calculated here.
pub async fn insert_order_lines(
    order_id: i64,
    lines: &[NewOrderLine],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO order_items (order_id, product_id, quantity, unit_price, total_price) ");
    builder.push_values(lines, |mut row, line| {
        row.push_bind(order_id)
            .push_bind(line.product_id.clone())
            .push_bind(line.quantity)
            .push_bind(line.unit_price)
            .push_bind(line.total_price());
    });
    builder.push(" RETURNING *");
    let mut result = builder.build_query_as::<OrderLine>().fetch_all(conn).await?;
    result.sort_by_key(|l| l.id);
    trace!("🗃️ {} lines saved for order #{order_id}", result.len());
    Ok(result)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_number(order_number: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// Moves an order's payment status to follow its settled transaction.
///
/// Only orders whose payment status is still `pending` are touched, so this is safe to call more than once. A
/// completed payment also moves a `pending` order on to `processing`; a failed one leaves the order status alone.
///
/// Returns the updated order, or `None` if the order was not awaiting payment.
pub async fn apply_payment_outcome(
    order_id: i64,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let paid = status == TransactionStatus::Completed;
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = $1,
                status = CASE WHEN $2 AND status = 'pending' THEN 'processing' ELSE status END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(status.as_payment_status())
    .bind(paid)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Cancels every order that has been awaiting payment for at least `older_than`.
pub async fn cancel_abandoned_orders(older_than: Duration, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = 'cancelled',
                payment_status = 'failed',
                updated_at = CURRENT_TIMESTAMP
            WHERE status = 'pending'
                AND payment_status = 'pending'
                AND unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at) >= $1
            RETURNING *;
        "#,
    )
    .bind(older_than.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
