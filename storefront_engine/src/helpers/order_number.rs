use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

/// Generates a human-readable order number, e.g. `ORD-1718000000000-7Q2K`.
///
/// The millisecond timestamp keeps order numbers roughly sortable; the random suffix keeps two checkouts in the same
/// millisecond apart.
pub fn new_order_number() -> String {
    let suffix = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect::<String>();
    format!("ORD-{}-{suffix}", Utc::now().timestamp_millis())
}
