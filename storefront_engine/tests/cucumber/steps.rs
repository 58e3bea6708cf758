use chrono::Duration;
use cucumber::{given, then, when};
use storefront_engine::{
    db_types::{Amount, CustomerTier, PaymentResult, ProfitMargin, TransactionStatus},
    LedgerQueries,
};

use crate::cucumber::{Storefront, StorefrontWorld};

#[given(expr = "a storefront with a profit margin of {word}")]
async fn storefront(world: &mut StorefrontWorld, margin: String) {
    let margin = margin.parse::<ProfitMargin>().expect("Not a valid profit margin");
    world.system = Some(Storefront::new(margin).await);
}

#[when(expr = "{string} checks out from {word} for {int} TZS and SonicPesa opens order {word}")]
async fn checkout(world: &mut StorefrontWorld, name: String, phone: String, amount: i64, provider_order_id: String) {
    world.system().checkout(&name, &phone, &provider_order_id, amount).await;
}

#[when(expr = "SonicPesa reports {word} for order {word}")]
async fn callback(world: &mut StorefrontWorld, result: String, provider_order_id: String) {
    report(world, PaymentResult::new(provider_order_id, result)).await;
}

#[when(expr = "SonicPesa reports {word} for order {word} {int} times")]
async fn repeated_callback(world: &mut StorefrontWorld, result: String, provider_order_id: String, times: u32) {
    for _ in 0..times {
        report(world, PaymentResult::new(provider_order_id.as_str(), result.as_str())).await;
    }
}

#[when(expr = "SonicPesa reports {word} for order {word} with amount {int} TZS")]
async fn callback_with_amount(world: &mut StorefrontWorld, result: String, provider_order_id: String, amount: i64) {
    report(world, PaymentResult::new(provider_order_id, result).with_amount(Amount::from(amount))).await;
}

async fn report(world: &mut StorefrontWorld, result: PaymentResult) {
    world.system().reconciliation.reconcile(result).await.expect("Error reconciling callback");
}

#[when(expr = "abandoned orders are reaped")]
async fn reap(world: &mut StorefrontWorld) {
    world.system().expiry.expire_abandoned_orders(Duration::zero()).await.expect("Error expiring orders");
}

#[then(expr = "the transaction for order {word} is {word} with a profit of {int} TZS")]
async fn check_transaction(world: &mut StorefrontWorld, provider_order_id: String, status: String, profit: i64) {
    let tx = world
        .system()
        .db
        .fetch_transaction_by_provider_id(&provider_order_id)
        .await
        .expect("Error fetching transaction")
        .expect("Transaction does not exist");
    let expected = match status.as_str() {
        "pending" => TransactionStatus::Pending,
        "completed" => TransactionStatus::Completed,
        "failed" => TransactionStatus::Failed,
        _ => panic!("Unknown transaction status {status}"),
    };
    assert_eq!(tx.status, expected, "Transaction status is incorrect");
    assert_eq!(tx.profit, Amount::from(profit), "Profit is incorrect");
}

#[then(expr = "the transaction for order {word} has no order")]
async fn check_orphan(world: &mut StorefrontWorld, provider_order_id: String) {
    let tx = world.system().db.fetch_transaction_by_provider_id(&provider_order_id).await.unwrap().unwrap();
    assert_eq!(tx.order_id, None);
}

#[then(expr = "the order for SonicPesa order {word} is {word} and {word}")]
async fn check_order(world: &mut StorefrontWorld, provider_order_id: String, status: String, payment_status: String) {
    let db = &world.system().db;
    let tx = db.fetch_transaction_by_provider_id(&provider_order_id).await.unwrap().expect("Transaction does not exist");
    let order_id = tx.order_id.expect("Transaction has no order");
    let order = db.fetch_order(order_id).await.unwrap().expect("Order does not exist");
    assert_eq!(order.status.to_string(), status, "Order status is incorrect");
    assert_eq!(order.payment_status.to_string(), payment_status, "Payment status is incorrect");
}

#[then(expr = "the customer with phone {word} has {int} completed order(s) worth {int} TZS")]
async fn check_customer_totals(world: &mut StorefrontWorld, phone: String, orders: i64, spent: i64) {
    let phone = Storefront::normalized_phone(&phone);
    let customer = world.system().db.fetch_customer_by_phone(&phone).await.unwrap().expect("Customer does not exist");
    assert_eq!(customer.total_orders, orders, "Total orders is incorrect");
    assert_eq!(customer.total_spent, Amount::from(spent), "Total spent is incorrect");
}

#[then(expr = "the customer with phone {word} is in the {word} tier")]
async fn check_customer_tier(world: &mut StorefrontWorld, phone: String, tier: String) {
    let phone = Storefront::normalized_phone(&phone);
    let customer = world.system().db.fetch_customer_by_phone(&phone).await.unwrap().expect("Customer does not exist");
    let expected = match tier.as_str() {
        "Bronze" => CustomerTier::Bronze,
        "Silver" => CustomerTier::Silver,
        "Gold" => CustomerTier::Gold,
        _ => panic!("Unknown tier {tier}"),
    };
    assert_eq!(customer.customer_tier, expected);
}

#[then(expr = "there is {int} customer(s)")]
async fn check_customer_count(world: &mut StorefrontWorld, count: i64) {
    let (n,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM customers").fetch_one(world.system().db.pool()).await.unwrap();
    assert_eq!(n, count);
}
