use crate::config::ElasticConfig;
use crate::error::BuildError;
use crate::handler::ElasticHandler;
use crate::layer::ElasticLayer;
use crate::transport::BulkTransport;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Install a global `tracing` subscriber shipping every event through
/// `transport`, configured by `config`.
///
/// **Returns**
/// - The [`ElasticHandler`] behind the layer. Keep it and call
///   [`ElasticHandler::close`] at shutdown so the last batch is shipped.
/// - `Err(..)` when no tokio runtime is running or a global subscriber
///   is already installed.
///
/// With `config.enable_stdout`, a `tracing_subscriber::fmt` layer is
/// installed next to the sink so events are also printed.
pub fn init_tracing_with(
    config: &ElasticConfig,
    transport: Arc<dyn BulkTransport>,
) -> Result<ElasticHandler, BuildError> {
    let handler = ElasticHandler::new(config, transport)?;
    let layer = ElasticLayer::new(handler.clone()).with_max_level(config.max_level);

    // The two subscriber shapes have different types, hence two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    tracing::debug!(url = %config.url, pipeline = ?config.pipeline, "elastic log sink installed");
    Ok(handler)
}

/// Install a global subscriber posting to the `_bulk` endpoint at
/// `config.url`.
///
/// This is the recommended entrypoint for typical services:
///
/// ```ignore
/// let sink = init_tracing(&ElasticConfig::new("http://localhost:9200/logs"))?;
/// tracing::info!("started");
/// sink.close().await;
/// ```
#[cfg(feature = "elastic")]
pub fn init_tracing(config: &ElasticConfig) -> Result<ElasticHandler, BuildError> {
    let transport = crate::elastic::ElasticTransport::new(config)?;
    init_tracing_with(config, Arc::new(transport))
}
