use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use elastic_log_sink::config::ElasticConfig;
use elastic_log_sink::init::init_tracing_with;
use elastic_log_sink::noop::NoopTransport;

#[tokio::main]
async fn main() {
    let config = ElasticConfig::new("http://localhost:9200");
    let sink = init_tracing_with(&config, Arc::new(NoopTransport)).expect("install sink");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!("sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give the flush timer a chance to fire once
    sleep(Duration::from_secs(2)).await;
    sink.close().await;
    println!("{:?}", sink.stats());
}
