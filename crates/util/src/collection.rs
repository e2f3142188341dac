use serde_json::Value;

/// Extracts list items from a response that may be a bare array or a wrapper object.
///
/// Extraction order:
/// 1. A top-level array is used directly.
/// 2. The first of `wrapper_keys` holding an array is used.
/// 3. Any other object is treated as a single item.
/// 4. Scalars and null yield no items.
pub fn extract_collection_items(payload: &Value, wrapper_keys: &[&str]) -> Vec<Value> {
    match payload {
        Value::Array(items) => items.clone(),
        Value::Object(map) => wrapper_keys
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_else(|| vec![payload.clone()]),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEYS: &[&str] = &["results", "items", "@graph"];

    #[test]
    fn uses_top_level_array() {
        let items = extract_collection_items(&json!([{ "id": 1 }, { "id": 2 }]), KEYS);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn uses_first_matching_wrapper_key() {
        let payload = json!({ "items": [{ "id": "b" }], "@graph": [{ "id": "c" }, { "id": "d" }] });
        let items = extract_collection_items(&payload, KEYS);
        assert_eq!(items, vec![json!({ "id": "b" })]);
    }

    #[test]
    fn wraps_single_object() {
        let payload = json!({ "@id": "ag1" });
        assert_eq!(extract_collection_items(&payload, KEYS), vec![payload.clone()]);
    }

    #[test]
    fn ignores_scalars() {
        assert!(extract_collection_items(&Value::Null, KEYS).is_empty());
        assert!(extract_collection_items(&json!("text"), KEYS).is_empty());
    }
}
