use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row is an opaque keyed record. Fields are reached through data paths,
/// so nested objects and arrays are addressable.
pub type Row = Value;

/// Ordered list of keys leading to a (possibly nested) field.
pub type DataPath = Vec<String>;

/// A data path as written in a column definition: `"address.city"` or
/// `["address", "city"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    /// Dot-separated keys
    Dotted(String),
    /// Explicit key list (keys may contain dots)
    Segments(Vec<String>),
}

impl PathSpec {
    /// Resolve into an owned key list.
    pub fn to_path(&self) -> DataPath {
        match self {
            PathSpec::Dotted(s) => parse_path(s),
            PathSpec::Segments(keys) => keys.clone(),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(s: &str) -> Self {
        PathSpec::Dotted(s.to_string())
    }
}

/// Split a dotted path into keys.
pub fn parse_path(path: &str) -> DataPath {
    path.split('.').map(str::to_string).collect()
}

/// Walk `path` into `row`. Array elements are addressed by numeric keys.
///
/// Returns `None` as soon as a key is missing or a scalar is reached
/// before the path is exhausted.
pub fn value_at_path<'a>(row: &'a Row, path: &[String]) -> Option<&'a Value> {
    let mut current = row;
    for key in path {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Plain-text rendition of a value, `None` for null.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_lookup() {
        let row = json!({"user": {"name": "Ada", "tags": ["x", "y"]}});
        assert_eq!(
            value_at_path(&row, &parse_path("user.name")),
            Some(&json!("Ada"))
        );
        assert_eq!(
            value_at_path(&row, &parse_path("user.tags.1")),
            Some(&json!("y"))
        );
        assert_eq!(value_at_path(&row, &parse_path("user.age")), None);
        assert_eq!(value_at_path(&row, &parse_path("user.name.first")), None);
    }

    #[test]
    fn test_path_spec_forms() {
        let dotted: PathSpec = serde_json::from_str("\"a.b\"").unwrap();
        let segments: PathSpec = serde_json::from_str("[\"a.b\"]").unwrap();
        assert_eq!(dotted.to_path(), vec!["a", "b"]);
        assert_eq!(segments.to_path(), vec!["a.b"]);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!(null)), None);
        assert_eq!(value_to_text(&json!("x")), Some("x".to_string()));
        assert_eq!(value_to_text(&json!(12)), Some("12".to_string()));
        assert_eq!(value_to_text(&json!(true)), Some("true".to_string()));
    }
}
