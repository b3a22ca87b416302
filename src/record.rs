use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// A log event as handed over by the host logging framework.
///
/// The tracing layer builds these from `tracing::Event`s, but the type is
/// framework-neutral so other producers can feed an
/// [`ElasticHandler`](crate::handler::ElasticHandler) directly.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Logger name (the tracing target).
    pub name: String,
    /// Level name, e.g. `ERROR`.
    pub level: String,
    /// Rendered message.
    pub message: String,
    /// Structured payload attached with the "message + extra" convention.
    pub extra: Option<Extra>,
    /// Captured exception / error text.
    pub exception: Option<String>,
    /// Creation time of the event.
    pub created: DateTime<Utc>,
}

impl LogEvent {
    pub fn new(name: impl Into<String>, level: impl Into<String>, message: impl Into<String>) -> Self {
        LogEvent {
            name: name.into(),
            level: level.into(),
            message: message.into(),
            extra: None,
            exception: None,
            created: Utc::now(),
        }
    }

    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn with_exception(mut self, text: impl Into<String>) -> Self {
        self.exception = Some(text.into());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Set the creation time from fractional seconds since the epoch,
    /// rounded to the nearest microsecond.
    pub fn with_created_secs(mut self, secs: f64) -> Self {
        let micros = (secs * 1_000_000.0).round() as i64;
        self.created = DateTime::from_timestamp_micros(micros).unwrap_or_default();
        self
    }
}

/// Structured payload carried next to a message.
///
/// Each variant maps to exactly one `type` tag in the shipped document, so
/// the encoder is a plain `match` rather than a type-name comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Extra {
    /// Key/value payload, rendered as a YAML block (`type = "yaml"`).
    Mapping(Map<String, Value>),
    /// Literal JSON value kept as-is, tagged with its type name.
    Scalar { type_name: &'static str, value: Value },
    /// Captured error text (`type = "exception"`).
    Exception(String),
    /// Anything else: its type name and string form.
    Opaque { type_name: String, repr: String },
}

impl Extra {
    pub fn str(value: impl Into<String>) -> Self {
        Extra::Scalar { type_name: "str", value: Value::String(value.into()) }
    }

    pub fn i64(value: i64) -> Self {
        Extra::Scalar { type_name: "i64", value: Value::from(value) }
    }

    pub fn u64(value: u64) -> Self {
        Extra::Scalar { type_name: "u64", value: Value::from(value) }
    }

    /// 128-bit integers exceed the JSON number range, so they travel as
    /// decimal strings.
    pub fn i128(value: i128) -> Self {
        Extra::Scalar { type_name: "i128", value: Value::String(value.to_string()) }
    }

    pub fn u128(value: u128) -> Self {
        Extra::Scalar { type_name: "u128", value: Value::String(value.to_string()) }
    }

    /// Non-finite floats have no JSON form and degrade to their string form.
    pub fn f64(value: f64) -> Self {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        Extra::Scalar { type_name: "f64", value }
    }

    pub fn bool(value: bool) -> Self {
        Extra::Scalar { type_name: "bool", value: Value::Bool(value) }
    }

    /// Capture an arbitrary value by its `Debug` form and Rust type name.
    pub fn opaque<T: Debug + ?Sized>(value: &T) -> Self {
        Extra::Opaque {
            type_name: std::any::type_name::<T>().to_string(),
            repr: format!("{:?}", value),
        }
    }

    /// Classify a JSON value: objects become mappings, everything else is
    /// shipped as the literal value.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Extra::Mapping(map),
            Value::String(s) => Extra::str(s),
            Value::Bool(b) => Extra::bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Extra::i64(i)
                } else if let Some(u) = n.as_u64() {
                    Extra::u64(u)
                } else {
                    Extra::f64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::Array(_) => Extra::Scalar { type_name: "array", value },
            Value::Null => Extra::Scalar { type_name: "null", value },
        }
    }
}

/// Flat document shipped to the index: always `level`, `name`, `message`
/// and `@timestamp`, plus `extra`/`type` together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub level: String,
    pub name: String,
    pub message: String,
    pub timestamp: String,
    pub extra: Option<Extra>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_secs_rounds_to_micros() {
        let event = LogEvent::new("app", "INFO", "hi").with_created_secs(1_700_000_000.123456);
        assert_eq!(event.created.timestamp(), 1_700_000_000);
        assert_eq!(event.created.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn from_json_classifies_values() {
        assert!(matches!(Extra::from_json(json!({"a": 1})), Extra::Mapping(_)));
        assert_eq!(Extra::from_json(json!("x")), Extra::str("x"));
        assert_eq!(Extra::from_json(json!(-3)), Extra::i64(-3));
        assert_eq!(Extra::from_json(json!(u64::MAX)), Extra::u64(u64::MAX));
        assert_eq!(Extra::from_json(json!(true)), Extra::bool(true));
        assert_eq!(
            Extra::from_json(json!([1, 2])),
            Extra::Scalar { type_name: "array", value: json!([1, 2]) }
        );
        assert_eq!(Extra::from_json(Value::Null), Extra::Scalar { type_name: "null", value: Value::Null });
    }

    #[test]
    fn non_finite_float_degrades_to_string() {
        assert_eq!(
            Extra::f64(f64::NAN),
            Extra::Scalar { type_name: "f64", value: Value::String("NaN".into()) }
        );
    }

    #[test]
    fn opaque_uses_rust_type_name() {
        match Extra::opaque(&vec![1u8, 2]) {
            Extra::Opaque { type_name, repr } => {
                assert!(type_name.ends_with("Vec<u8>"), "{}", type_name);
                assert_eq!(repr, "[1, 2]");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
