use crate::handler::ElasticHandler;
use crate::record::{Extra, LogEvent};
use chrono::Utc;
use std::error::Error;
use std::fmt::Write as _;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Field carrying the structured payload of a "message + extra" event.
pub const EXTRA_FIELD: &str = "extra";

/// Field carrying exception text. Any value recorded as a
/// `&dyn Error` is treated the same way, whatever its field name.
pub const EXCEPTION_FIELD: &str = "exception";

/// `tracing_subscriber` layer that turns events into [`LogEvent`]s and
/// hands them to an [`ElasticHandler`].
///
/// The target becomes the document `name`; the `message` plus any other
/// fields, rendered as `key=value`, become the document `message`. An
/// `extra` field is shipped as the structured payload, and then the
/// message is the `message` field alone:
///
/// ```ignore
/// let payload = serde_json::json!({"order": 7});
/// tracing::error!(extra = %payload, "payment failed");
/// ```
///
/// Handing the event over only takes the handler's mutex; network I/O
/// happens on the handler's flush timer.
pub struct ElasticLayer {
    handler: ElasticHandler,
    max_level: Level,
}

impl ElasticLayer {
    pub fn new(handler: ElasticHandler) -> Self {
        ElasticLayer {
            handler,
            max_level: Level::TRACE,
        }
    }

    /// Ignore events more verbose than `level`.
    pub fn with_max_level(mut self, level: Level) -> Self {
        self.max_level = level;
        self
    }

    pub fn handler(&self) -> &ElasticHandler {
        &self.handler
    }
}

impl<S> Layer<S> for ElasticLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > self.max_level {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let record = LogEvent {
            name: meta.target().to_string(),
            level: meta.level().to_string(),
            message: visitor.rendered_message(),
            extra: visitor.extra,
            exception: visitor.exception,
            created: Utc::now(),
        };
        self.handler.submit(&record);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
    extra: Option<Extra>,
    exception: Option<String>,
}

impl EventVisitor {
    fn rendered_message(&self) -> String {
        let mut out = self.message.clone().unwrap_or_default();
        if self.extra.is_some() {
            return out;
        }
        for (name, value) in &self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{}={}", name, value);
        }
        out
    }

    fn record_scalar(&mut self, field: &Field, extra: Extra, rendered: String) {
        if field.name() == EXTRA_FIELD {
            self.extra = Some(extra);
        } else {
            self.fields.push((field.name(), rendered));
        }
    }
}

/// Strings holding a JSON object are shipped as mappings.
fn extra_from_str(value: &str) -> Extra {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Object(map)) => Extra::Mapping(map),
        _ => Extra::str(value),
    }
}

/// Debug output that parses as JSON keeps its JSON type; anything else is
/// opaque text.
fn extra_from_debug(repr: String) -> Extra {
    match serde_json::from_str::<serde_json::Value>(&repr) {
        Ok(value) => Extra::from_json(value),
        Err(_) => Extra::Opaque {
            type_name: "debug".to_string(),
            repr,
        },
    }
}

fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(text, "\nCaused by: {}", cause);
        source = cause.source();
    }
    text
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            EXTRA_FIELD => self.extra = Some(extra_from_str(value)),
            EXCEPTION_FIELD => self.exception = Some(value.to_string()),
            name => self.fields.push((name, format!("{:?}", value))),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_scalar(field, Extra::i64(value), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_scalar(field, Extra::u64(value), value.to_string());
    }

    fn record_i128(&mut self, field: &Field, value: i128) {
        self.record_scalar(field, Extra::i128(value), value.to_string());
    }

    fn record_u128(&mut self, field: &Field, value: u128) {
        self.record_scalar(field, Extra::u128(value), value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_scalar(field, Extra::f64(value), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_scalar(field, Extra::bool(value), value.to_string());
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn Error + 'static)) {
        self.exception = Some(error_chain(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let repr = format!("{:?}", value);
        match field.name() {
            "message" => self.message = Some(repr),
            EXTRA_FIELD => self.extra = Some(extra_from_debug(repr)),
            EXCEPTION_FIELD => self.exception = Some(repr),
            name => self.fields.push((name, repr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElasticConfig;
    use crate::handler::tests::RecordingTransport;
    use serde_json::Value;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn capture(max_level: Level, emit: impl FnOnce()) -> (ElasticHandler, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let handler = ElasticHandler::new(&ElasticConfig::new("http://localhost:9200"), transport.clone()).unwrap();
        let layer = ElasticLayer::new(handler.clone()).with_max_level(max_level);
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, emit);
        (handler, transport)
    }

    async fn shipped(handler: &ElasticHandler, transport: &RecordingTransport) -> Vec<Value> {
        handler.flush().await;
        transport
            .bodies()
            .iter()
            .flat_map(|body| body.lines().skip(1).step_by(2).map(|l| serde_json::from_str(l).unwrap()).collect::<Vec<Value>>())
            .collect()
    }

    #[tokio::test]
    async fn renders_message_with_fields() {
        let (handler, transport) = capture(Level::TRACE, || {
            tracing::warn!(target: "app::orders", order = 7, customer = "ann", "order delayed");
        });

        let docs = shipped(&handler, &transport).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["level"], "WARN");
        assert_eq!(docs[0]["name"], "app::orders");
        assert_eq!(docs[0]["message"], "order delayed order=7 customer=\"ann\"");
        assert!(docs[0].get("extra").is_none());
        assert!(docs[0].get("type").is_none());
    }

    #[tokio::test]
    async fn mapping_extra_is_shipped_as_yaml() {
        let (handler, transport) = capture(Level::TRACE, || {
            let payload = serde_json::json!({"a": 1});
            tracing::error!(target: "app", extra = %payload, "payment failed");
        });

        let docs = shipped(&handler, &transport).await;
        assert_eq!(docs[0]["message"], "payment failed");
        assert_eq!(docs[0]["type"], "yaml");
        assert_eq!(docs[0]["extra"], "a: 1\n");
    }

    #[tokio::test]
    async fn extra_payload_keeps_message_literal() {
        let (handler, transport) = capture(Level::TRACE, || {
            tracing::info!(target: "app", order = 7, extra = true, "shipped");
        });

        let docs = shipped(&handler, &transport).await;
        assert_eq!(docs[0]["message"], "shipped");
        assert_eq!(docs[0]["type"], "bool");
        assert_eq!(docs[0]["extra"], true);
    }

    #[tokio::test]
    async fn array_extra_is_shipped_as_json_array() {
        let (handler, transport) = capture(Level::TRACE, || {
            let payload = serde_json::json!([1, 2]);
            tracing::info!(target: "app", extra = %payload, "list");
        });

        let docs = shipped(&handler, &transport).await;
        assert_eq!(docs[0]["message"], "list");
        assert_eq!(docs[0]["type"], "array");
        assert_eq!(docs[0]["extra"], serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn scalar_extra_keeps_type_name() {
        let (handler, transport) = capture(Level::TRACE, || {
            tracing::info!(target: "app", extra = 3, "retries");
        });

        let docs = shipped(&handler, &transport).await;
        assert_eq!(docs[0]["message"], "retries");
        assert_eq!(docs[0]["type"], "i64");
        assert_eq!(docs[0]["extra"], 3);
    }

    #[tokio::test]
    async fn error_values_become_exception_text() {
        let (handler, transport) = capture(Level::TRACE, || {
            let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
            tracing::error!(target: "app", error = &err as &(dyn Error + 'static), "boom");
        });

        let docs = shipped(&handler, &transport).await;
        assert_eq!(docs[0]["message"], "boom");
        assert_eq!(docs[0]["type"], "exception");
        assert_eq!(docs[0]["extra"], "disk on fire");
    }

    #[tokio::test]
    async fn respects_max_level_and_ignored_targets() {
        let (handler, transport) = capture(Level::INFO, || {
            tracing::debug!(target: "app", "too chatty");
            tracing::info!(target: "hyper::proto", "self noise");
            tracing::info!(target: "app", "kept");
        });

        assert_eq!(handler.stats().filtered, 1);
        let docs = shipped(&handler, &transport).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["message"], "kept");
    }

    #[test]
    fn error_chain_includes_sources() {
        #[derive(Debug)]
        struct Outer(std::io::Error);

        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("request failed")
            }
        }

        impl Error for Outer {
            fn source(&self) -> Option<&(dyn Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "reset by peer"));
        assert_eq!(error_chain(&err), "request failed\nCaused by: reset by peer");
    }

    #[test]
    fn debug_extra_falls_back_to_opaque() {
        assert_eq!(
            extra_from_debug("Point { x: 1 }".to_string()),
            Extra::Opaque { type_name: "debug".into(), repr: "Point { x: 1 }".into() }
        );
        assert_eq!(extra_from_debug("\"text\"".to_string()), Extra::str("text"));
    }
}
