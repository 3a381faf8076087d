// ABOUTME: Record representation shared by report rows and Open311 requests
// ABOUTME: A record is a JSON object keyed by field name

use serde_json::Value;

/// One row destined for a Socrata dataset.
pub type Record = serde_json::Map<String, Value>;

/// Truthiness of a JSON value as the source systems treat it: null, `false`,
/// zero and empty strings/collections are all "absent".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Renders a scalar the way it should appear inside a WKT literal.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Builds a Socrata point literal, `POINT (<lon> <lat>)`.
pub fn wkt_point(longitude: &str, latitude: &str) -> String {
    format!("POINT ({} {})", longitude, latitude)
}
