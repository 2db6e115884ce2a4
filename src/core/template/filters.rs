//! The fixed custom filter set (§4.2)

use serde_json::Value;

pub const KNOWN_FILTERS: &[&str] = &["join", "numbered", "default", "capitalize", "upcase", "downcase", "size"];

pub(crate) fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_empty_like(value: &Value) -> bool {
    matches!(value, Value::Null) || matches!(value, Value::String(s) if s.is_empty())
}

/// Apply a single known filter. Returns `None` for an unknown filter name,
/// letting the caller decide whether that's an error (strict mode) or a
/// pass-through (render mode).
pub fn apply(name: &str, arg: Option<&str>, value: Value) -> Option<Value> {
    match name {
        "join" => {
            let sep = arg.unwrap_or(", ");
            match &value {
                Value::Array(items) => {
                    let joined = items.iter().map(value_to_display).collect::<Vec<_>>().join(sep);
                    Some(Value::String(joined))
                }
                _ => Some(value),
            }
        }
        "numbered" => {
            let prefix = arg.unwrap_or("  ");
            match &value {
                Value::Array(items) => {
                    let lines: Vec<String> = items
                        .iter()
                        .enumerate()
                        .map(|(i, v)| format!("{prefix}{}. {}", i + 1, value_to_display(v)))
                        .collect();
                    Some(Value::String(lines.join("\n")))
                }
                _ => Some(value),
            }
        }
        "default" => {
            if is_empty_like(&value) {
                Some(Value::String(arg.unwrap_or_default().to_string()))
            } else {
                Some(value)
            }
        }
        "capitalize" => match &value {
            Value::String(s) => {
                let mut chars = s.chars();
                let capitalized = match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                };
                Some(Value::String(capitalized))
            }
            _ => Some(value),
        },
        "upcase" => match &value {
            Value::String(s) => Some(Value::String(s.to_uppercase())),
            _ => Some(value),
        },
        "downcase" => match &value {
            Value::String(s) => Some(Value::String(s.to_lowercase())),
            _ => Some(value),
        },
        "size" => {
            let size = match &value {
                Value::Array(items) => items.len(),
                Value::String(s) => s.chars().count(),
                Value::Object(map) => map.len(),
                Value::Null => 0,
                _ => 0,
            };
            Some(Value::Number(size.into()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_concatenates_with_separator() {
        let result = apply("join", Some(", "), json!(["a", "b", "c"])).unwrap();
        assert_eq!(result, json!("a, b, c"));
    }

    #[test]
    fn numbered_produces_one_indexed_lines() {
        let result = apply("numbered", Some("  "), json!(["a", "b"])).unwrap();
        assert_eq!(result, json!("  1. a\n  2. b"));
    }

    #[test]
    fn default_preserves_zero_and_false() {
        assert_eq!(apply("default", Some("x"), json!(0)).unwrap(), json!(0));
        assert_eq!(apply("default", Some("x"), json!(false)).unwrap(), json!(false));
        assert_eq!(apply("default", Some("x"), json!("")).unwrap(), json!("x"));
        assert_eq!(apply("default", Some("x"), Value::Null).unwrap(), json!("x"));
    }

    #[test]
    fn size_counts_by_kind() {
        assert_eq!(apply("size", None, json!([1, 2, 3])).unwrap(), json!(3));
        assert_eq!(apply("size", None, json!("abc")).unwrap(), json!(3));
        assert_eq!(apply("size", None, Value::Null).unwrap(), json!(0));
    }

    #[test]
    fn unknown_filter_returns_none() {
        assert!(apply("shout", None, json!("hi")).is_none());
    }
}
