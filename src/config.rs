use crate::env::{
    env_opt, ELASTIC_LOG_SINK_CAPACITY_ENV, ELASTIC_LOG_SINK_FLUSH_DELAY_MS_ENV, ELASTIC_LOG_SINK_PIPELINE_ENV,
    ELASTIC_LOG_SINK_TIMEOUT_MS_ENV, ELASTIC_LOG_SINK_URL_ENV,
};
use crate::error::ConfigError;
use std::str::FromStr;
use tokio::time::Duration;
use tracing::Level;

/// Documents kept in memory before new events are dropped.
pub const DEFAULT_CAPACITY: usize = 100;

/// Quiet window between the first buffered event and the flush.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on a single bulk request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Targets whose events are never shipped: the HTTP stack used by the
/// sink itself, and the sink's own diagnostics.
pub const DEFAULT_IGNORED_TARGETS: &[&str] = &[
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
    "want",
    "mio",
    env!("CARGO_CRATE_NAME"),
];

/// Sink configuration.
///
/// **Fields**
/// - `url`: base URL of the backend, e.g. `http://localhost:9200/logs`.
/// - `pipeline`: ingest pipeline attached to every bulk request.
/// - `capacity`: maximum number of buffered documents.
/// - `flush_delay`: delay between the first buffered event and the flush.
/// - `request_timeout`: timeout of one bulk request.
/// - `ignored_targets`: targets (and their submodules) that are never shipped.
/// - `max_level`: most verbose level captured by the layer.
/// - `enable_stdout`: if `true`, `init_tracing` also installs a
///   `tracing_subscriber::fmt` layer.
#[derive(Clone, Debug)]
pub struct ElasticConfig {
    pub url: String,
    pub pipeline: Option<String>,
    pub capacity: usize,
    pub flush_delay: Duration,
    pub request_timeout: Duration,
    pub ignored_targets: Vec<String>,
    pub max_level: Level,
    pub enable_stdout: bool,
}

impl ElasticConfig {
    pub fn new(url: impl Into<String>) -> Self {
        ElasticConfig {
            url: url.into(),
            pipeline: None,
            capacity: DEFAULT_CAPACITY,
            flush_delay: DEFAULT_FLUSH_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ignored_targets: DEFAULT_IGNORED_TARGETS.iter().map(|t| t.to_string()).collect(),
            max_level: Level::TRACE,
            enable_stdout: false,
        }
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = Some(pipeline.into());
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_ignored_target(mut self, target: impl Into<String>) -> Self {
        self.ignored_targets.push(target.into());
        self
    }

    pub fn with_max_level(mut self, level: Level) -> Self {
        self.max_level = level;
        self
    }

    pub fn with_stdout(mut self, enable: bool) -> Self {
        self.enable_stdout = enable;
        self
    }

    /// Build a configuration from `ELASTIC_LOG_SINK_*` environment variables.
    ///
    /// The URL is required; every other variable falls back to its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_opt)
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(ELASTIC_LOG_SINK_URL_ENV)
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::Missing(ELASTIC_LOG_SINK_URL_ENV))?;

        let mut config = ElasticConfig::new(url);
        config.pipeline = lookup(ELASTIC_LOG_SINK_PIPELINE_ENV).filter(|p| !p.is_empty());

        if let Some(capacity) = parse_var::<usize>(&lookup, ELASTIC_LOG_SINK_CAPACITY_ENV)? {
            config.capacity = capacity;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ELASTIC_LOG_SINK_FLUSH_DELAY_MS_ENV)? {
            config.flush_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ELASTIC_LOG_SINK_TIMEOUT_MS_ENV)? {
            config.request_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
