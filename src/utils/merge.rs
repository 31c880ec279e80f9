use serde_json::{Map, Value};

/// One-level merge: every key of `overlay` replaces the key in `base`.
/// Nested objects are replaced wholesale, not merged.
pub fn merge_shallow(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_are_replaced() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": 1})
            .as_object()
            .cloned()
            .unwrap();
        let overlay = json!({"a": {"x": 9}}).as_object().cloned().unwrap();
        merge_shallow(&mut base, overlay);
        assert_eq!(Value::Object(base), json!({"a": {"x": 9}, "b": 1}));
    }
}
