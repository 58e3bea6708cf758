use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Amount, Customer, CustomerTier, NewCustomer},
    traits::StoreError,
};

pub async fn fetch_customer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

pub async fn fetch_customer_by_phone(phone: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer =
        sqlx::query_as("SELECT * FROM customers WHERE phone = $1").bind(phone).fetch_optional(conn).await?;
    Ok(customer)
}

/// Returns the oldest customer with the given email address.
pub async fn fetch_customer_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE email = $1 ORDER BY id LIMIT 1")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(customer)
}

/// Returns the existing customer for the buyer, or creates one.
///
/// Customers are matched on phone number first. Failing that, a customer with the same (real) email address is
/// adopted, and their phone number is filled in if they did not have one yet. Otherwise a new customer is inserted,
/// with a guest email address if the buyer did not supply one.
pub async fn upsert_customer(customer: NewCustomer, conn: &mut SqliteConnection) -> Result<Customer, StoreError> {
    if let Some(existing) = fetch_customer_by_phone(&customer.phone, &mut *conn).await? {
        trace!("🗃️ Customer #{} matched on phone number", existing.id);
        return Ok(existing);
    }
    if let Some(email) = customer.email.as_deref() {
        if let Some(existing) = fetch_customer_by_email(email, &mut *conn).await? {
            let adopted = if existing.phone.is_some() {
                existing
            } else {
                debug!("🗃️ Customer #{} matched on email. Recording their phone number.", existing.id);
                sqlx::query_as("UPDATE customers SET phone = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
                    .bind(&customer.phone)
                    .bind(existing.id)
                    .fetch_one(&mut *conn)
                    .await?
            };
            return Ok(adopted);
        }
    }
    insert_customer(customer, conn).await
}

async fn insert_customer(customer: NewCustomer, conn: &mut SqliteConnection) -> Result<Customer, StoreError> {
    let email = customer.email_or_guest_address();
    let customer: Customer = sqlx::query_as(
        r#"
            INSERT INTO customers (email, phone, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(email)
    .bind(customer.phone)
    .bind(customer.first_name)
    .bind(customer.last_name)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ New customer #{} created", customer.id);
    Ok(customer)
}

/// Credits a customer with a completed order: bumps their order count and lifetime spend, stamps the last order date
/// and re-evaluates their tier.
pub async fn record_completed_order(
    customer_id: i64,
    order_total: Amount,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    let customer: Option<Customer> = sqlx::query_as(
        r#"
            UPDATE customers SET
                total_orders = total_orders + 1,
                total_spent = total_spent + $1,
                last_order_date = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(order_total)
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(customer) = customer else {
        warn!("🗃️ Customer #{customer_id} no longer exists, so their completed order could not be credited");
        return Ok(None);
    };
    let tier = CustomerTier::for_lifetime_spend(customer.total_spent);
    if tier == customer.customer_tier {
        return Ok(Some(customer));
    }
    info!("🗃️ Customer #{customer_id} moves from {} to {tier} tier", customer.customer_tier);
    let customer = sqlx::query_as("UPDATE customers SET customer_tier = $1 WHERE id = $2 RETURNING *")
        .bind(tier)
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;
    Ok(customer)
}
