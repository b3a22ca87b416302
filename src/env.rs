//! Environment variable names used by [`ElasticConfig::from_env`].
//!
//! These are purely helpers; the sink itself only ever sees an
//! [`ElasticConfig`] passed at construction.
//!
//! [`ElasticConfig`]: crate::config::ElasticConfig
//! [`ElasticConfig::from_env`]: crate::config::ElasticConfig::from_env

/// Backend base URL, e.g. `http://127.0.0.1:9200/logs`.
pub const ELASTIC_LOG_SINK_URL_ENV: &str = "ELASTIC_LOG_SINK_URL";

/// Optional ingest pipeline id.
pub const ELASTIC_LOG_SINK_PIPELINE_ENV: &str = "ELASTIC_LOG_SINK_PIPELINE";

/// Optional batch capacity.
pub const ELASTIC_LOG_SINK_CAPACITY_ENV: &str = "ELASTIC_LOG_SINK_CAPACITY";

/// Optional flush delay in milliseconds.
pub const ELASTIC_LOG_SINK_FLUSH_DELAY_MS_ENV: &str = "ELASTIC_LOG_SINK_FLUSH_DELAY_MS";

/// Optional bulk request timeout in milliseconds.
pub const ELASTIC_LOG_SINK_TIMEOUT_MS_ENV: &str = "ELASTIC_LOG_SINK_TIMEOUT_MS";

/// Read an environment variable, treating unset and non-unicode alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

