use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Reads an identifier that may be encoded as either a JSON string or a JSON number.
///
/// Blank strings, nulls and any other JSON type yield `None`.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts the provider's order id from a create-order response.
///
/// The response shape is not stable across SonicPesa API versions, so the id is looked up in `data.order_id`,
/// `order_id`, `data.id` and `id`, in that order.
pub fn extract_order_id(payload: &Value) -> Option<String> {
    let data = &payload["data"];
    [&data["order_id"], &payload["order_id"], &data["id"], &payload["id"]].into_iter().find_map(id_from_value)
}

/// True when a 2xx body nonetheless reports failure, e.g. `{"status": "error", "message": "Invalid phone"}`.
pub fn is_error_body(payload: &Value) -> bool {
    let status_is_error = payload["status"].as_str().map(|s| s.eq_ignore_ascii_case("error")).unwrap_or(false);
    let success_is_false = payload["success"].as_bool() == Some(false);
    status_is_error || success_is_false
}

pub fn error_message(payload: &Value) -> String {
    payload["message"]
        .as_str()
        .or_else(|| payload["error"].as_str())
        .unwrap_or("SonicPesa reported an error without a message")
        .to_string()
}

pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| de::Error::custom(format!("expected a non-empty string or number, got {value}")))
}

pub fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}
