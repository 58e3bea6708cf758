use chrono::Duration;
use log::*;
use storefront_engine::{events::EventProducers, traits::ExpiredOrder, ExpiryApi, SqliteDatabase};
use tokio::task::JoinHandle;

const EXPIRY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Once a minute, pending orders older than `timeout` are cancelled and their pending transactions failed.
pub fn start_expiry_worker(db: SqliteDatabase, producers: EventProducers, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(EXPIRY_INTERVAL);
        let api = ExpiryApi::new(db, producers);
        info!("🕰️ Abandoned order expiry worker started. Orders are cancelled after {} mins", timeout.num_minutes());
        loop {
            timer.tick().await;
            trace!("🕰️ Running abandoned order expiry job");
            match api.expire_abandoned_orders(timeout).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No abandoned orders"),
                Ok(expired) => {
                    info!("🕰️ {} abandoned orders cancelled", expired.len());
                    debug!("🕰️ Cancelled orders: {}", order_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running abandoned order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[ExpiredOrder]) -> String {
    orders
        .iter()
        .map(|e| {
            let cust = e.order.customer_id.map(|id| id.to_string()).unwrap_or_else(|| "none".into());
            format!("[{}] {} cust_id: {cust} txs: {}", e.order.id, e.order.order_number, e.transactions.len())
        })
        .collect::<Vec<String>>()
        .join(", ")
}
