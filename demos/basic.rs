use elastic_log_sink::{config::ElasticConfig, init::init_tracing};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Example: ELASTIC_LOG_SINK_URL=http://localhost:9200/logs
    let config = ElasticConfig::from_env()
        .unwrap_or_else(|_| ElasticConfig::new("http://localhost:9200/logs"))
        .with_stdout(true);

    let sink = init_tracing(&config).expect("failed to install elastic log sink");

    info!("basic example started");
    let payload = serde_json::json!({"order": 7, "region": "eu"});
    warn!(extra = %payload, "order delayed");

    let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
    error!(error = &err as &(dyn std::error::Error + 'static), "simulated failure");

    // Ship whatever the timer has not flushed yet.
    sink.close().await;
    println!("shipped {:?}", sink.stats());
}
