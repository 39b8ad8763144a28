use serde_json::Value;

/// Trailing numeric segment of a HAL href, e.g. `/api/v3/users/42` -> 42.
pub fn id_from_href(href: &str) -> Option<i64> {
    href.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// Plain text of a formattable field. OpenProject usually sends
/// `{"format": "markdown", "raw": "..."}` but older payloads carry a bare string.
pub fn formattable_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("raw").and_then(formattable_text),
        _ => None,
    }
}
