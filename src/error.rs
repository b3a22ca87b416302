/// Error returned by a [`BulkTransport`](crate::transport::BulkTransport)
/// when a bulk request could not be delivered.
///
/// The handler counts these and then drops them; they never reach the
/// application.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[cfg(feature = "elastic")]
    #[error("bulk request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("bulk request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("bulk request failed: {0}")]
    Other(String),
}

/// Error type returned when building the sink or installing the layer.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("backend url is empty")]
    MissingUrl,

    #[error("backend url must start with http:// or https://: {0}")]
    InvalidUrl(String),

    #[error("no tokio runtime available to run the flush timer")]
    NoRuntime,

    #[cfg(feature = "elastic")]
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to install global subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Error type returned when reading configuration from the environment.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}
