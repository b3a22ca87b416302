use crate::record::{Document, Extra, LogEvent};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Turn a [`LogEvent`] into the flat [`Document`] shipped to the index.
///
/// Precedence: an attached extra payload wins, then captured exception
/// text, then the bare message. Never fails.
pub fn normalize(event: &LogEvent) -> Document {
    let extra = match (&event.extra, &event.exception) {
        (Some(extra), _) => Some(extra.clone()),
        (None, Some(text)) => Some(Extra::Exception(text.clone())),
        (None, None) => None,
    };

    Document {
        level: event.level.clone(),
        name: event.name.clone(),
        message: event.message.clone(),
        timestamp: naive_utc_iso(&event.created),
        extra,
    }
}

/// Render a timestamp as naive UTC ISO-8601 (`2023-11-14T22:13:20.123456`).
///
/// The fractional part is printed with six digits, and left out entirely
/// when the microseconds are zero.
pub fn naive_utc_iso(ts: &DateTime<Utc>) -> String {
    let naive = ts.naive_utc();
    if ts.timestamp_subsec_micros() == 0 {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        format!("{}.{:06}", naive.format("%Y-%m-%dT%H:%M:%S"), ts.timestamp_subsec_micros())
    }
}

/// Whether `target` is one of `ignored` or a module below it.
pub fn is_ignored_target(target: &str, ignored: &[String]) -> bool {
    ignored.iter().any(|t| {
        target == t
            || (target.len() > t.len() && target.starts_with(t.as_str()) && target[t.len()..].starts_with("::"))
    })
}

/// Render a mapping payload as a YAML block.
///
/// Falls back to pretty JSON if YAML encoding fails.
pub fn yaml_block(map: &Map<String, Value>) -> String {
    serde_yaml::to_string(map)
        .or_else(|_| serde_json::to_string_pretty(map))
        .unwrap_or_else(|_| Value::Object(map.clone()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(message: &str) -> LogEvent {
        LogEvent::new("app::orders", "ERROR", message).with_created_secs(1_700_000_000.123456)
    }

    #[test]
    fn plain_message_has_no_extra() {
        let doc = normalize(&event("hello"));
        assert_eq!(doc.level, "ERROR");
        assert_eq!(doc.name, "app::orders");
        assert_eq!(doc.message, "hello");
        assert_eq!(doc.timestamp, "2023-11-14T22:13:20.123456");
        assert!(doc.extra.is_none());
    }

    #[test]
    fn exception_text_becomes_extra() {
        let doc = normalize(&event("boom").with_exception("Traceback: division by zero"));
        assert_eq!(doc.message, "boom");
        assert_eq!(doc.extra, Some(Extra::Exception("Traceback: division by zero".into())));
    }

    #[test]
    fn extra_payload_takes_precedence_over_exception() {
        let map = json!({"a": 1}).as_object().cloned().unwrap();
        let doc = normalize(
            &event("order failed")
                .with_extra(Extra::Mapping(map.clone()))
                .with_exception("ignored"),
        );
        assert_eq!(doc.message, "order failed");
        assert_eq!(doc.extra, Some(Extra::Mapping(map)));
    }

    #[test]
    fn scalar_extra_is_kept() {
        let doc = normalize(&event("retries").with_extra(Extra::i64(3)));
        assert_eq!(doc.extra, Some(Extra::i64(3)));
    }

    #[test]
    fn whole_seconds_omit_fraction() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(naive_utc_iso(&ts), "2023-11-14T22:13:20");
    }

    #[test]
    fn sub_micro_precision_is_truncated() {
        let ts = DateTime::from_timestamp(1_700_000_000, 5_000_999).unwrap();
        assert_eq!(naive_utc_iso(&ts), "2023-11-14T22:13:20.005000");
    }

    #[test]
    fn ignored_targets_match_module_prefix() {
        let ignored = vec!["hyper".to_string(), "reqwest".to_string()];
        assert!(is_ignored_target("hyper", &ignored));
        assert!(is_ignored_target("hyper::proto::h1", &ignored));
        assert!(is_ignored_target("reqwest::connect", &ignored));
        assert!(!is_ignored_target("hyper_util", &ignored));
        assert!(!is_ignored_target("app", &ignored));
    }

    #[test]
    fn yaml_block_is_multiline() {
        let map = json!({"a": 1, "b": "two"}).as_object().cloned().unwrap();
        assert_eq!(yaml_block(&map), "a: 1\nb: two\n");
    }
}
