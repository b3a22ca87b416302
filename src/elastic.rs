use crate::config::ElasticConfig;
use crate::error::{BuildError, TransportError};
use crate::transport::BulkTransport;
use async_trait::async_trait;
use reqwest::Client;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Elasticsearch / OpenSearch transport posting to the `_bulk` API.
///
/// The underlying [`Client`] keeps connections alive between flushes.
#[derive(Clone)]
pub struct ElasticTransport {
    client: Client,
    endpoint: String,
}

impl ElasticTransport {
    /// Build a transport for `config.url`, attaching `config.pipeline` to
    /// every request and bounding each request by `config.request_timeout`.
    pub fn new(config: &ElasticConfig) -> Result<Self, BuildError> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(BuildError::MissingUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(BuildError::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(BuildError::Client)?;

        Ok(ElasticTransport {
            client,
            endpoint: endpoint(url, config.pipeline.as_deref()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn endpoint(base_url: &str, pipeline: Option<&str>) -> String {
    let mut url = format!("{}/_doc/_bulk", base_url.trim_end_matches('/'));
    if let Some(pipeline) = pipeline.filter(|p| !p.is_empty()) {
        url.push_str(&format!("?pipeline={}", urlencoding::encode(pipeline)));
    }
    url
}

#[async_trait]
impl BulkTransport for ElasticTransport {
    async fn post_bulk(&self, body: String) -> Result<(), TransportError> {
        // The response status is not inspected.
        self.client
            .post(&self.endpoint)
            .header("Content-Type", NDJSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        Ok(())
    }
}
