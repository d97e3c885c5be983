use serde_json::Value;

/// Deterministic, key-sorted rendering of `value`, used only for hashing —
/// never for storage (§4.A). Object keys are sorted lexicographically at
/// every depth; arrays keep source order; numbers and strings pass through
/// serde_json's own stable formatting, which already gives a single exact
/// form for both (no arbitrary-precision feature enabled).
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&sort_keys(value)).expect("canonical value always serializes")
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::with_capacity(map.len());
            for k in keys {
                sorted.insert(k.clone(), sort_keys(&map[k]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
