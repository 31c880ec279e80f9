use serde_json::{Map, Value};

/// Caps every array and object to its first `max_entries` entries, at every
/// depth. Scalars are returned unchanged; dropped entries leave no marker.
pub fn simplify_value(value: &Value, max_entries: usize) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(max_entries)
                .map(|item| simplify_value(item, max_entries))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, item) in map.iter().take(max_entries) {
                out.insert(key.clone(), simplify_value(item, max_entries));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
