//! Dotted-path lookup into caller-supplied data.

use serde_json::Value;

/// Split a path into segments; `items[0].name` is read as `items.0.name`.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['.', '[', ']']).filter(|s| !s.is_empty())
}

/// Look up `path` in `data`.
///
/// Object segments match keys; array segments must parse as an index.
/// Returns `None` as soon as a segment is absent.
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a looked-up value as substitution text.
///
/// Strings are emitted verbatim and scalars by their display form; objects
/// and arrays become compact JSON. `null` counts as a miss.
pub fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Resolve `path` against optional data, substituting `fallback` on a miss.
pub fn get_or_fallback(data: Option<&Value>, path: &str, fallback: &str) -> String {
    data.and_then(|data| lookup(data, path))
        .and_then(render)
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_lookup() {
        let data = json!({"user": {"firstName": "Carl", "age": 42}});
        assert_eq!(get_or_fallback(Some(&data), "user.firstName", ""), "Carl");
        assert_eq!(get_or_fallback(Some(&data), "user.age", ""), "42");
    }

    #[test]
    fn test_missing_segment_uses_fallback() {
        let data = json!({});
        assert_eq!(get_or_fallback(Some(&data), "user.firstName", ""), "");
        assert_eq!(get_or_fallback(Some(&data), "user.firstName", "N/A"), "N/A");
        assert_eq!(get_or_fallback(None, "user", "?"), "?");
    }

    #[test]
    fn test_array_indices() {
        let data = json!({"items": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(get_or_fallback(Some(&data), "items[1].name", ""), "b");
        assert_eq!(get_or_fallback(Some(&data), "items.0.name", ""), "a");
        assert_eq!(get_or_fallback(Some(&data), "items.x.name", "-"), "-");
        assert_eq!(get_or_fallback(Some(&data), "items[5]", "-"), "-");
    }

    #[test]
    fn test_render_shapes() {
        let data = json!({"n": null, "flag": true, "tags": ["x", "y"]});
        assert_eq!(get_or_fallback(Some(&data), "n", "fb"), "fb");
        assert_eq!(get_or_fallback(Some(&data), "flag", ""), "true");
        assert_eq!(get_or_fallback(Some(&data), "tags", ""), r#"["x","y"]"#);
    }

    #[test]
    fn test_scalar_has_no_children() {
        let data = json!({"name": "Carl"});
        assert!(lookup(&data, "name.first").is_none());
    }
}
