use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use loggly_sink::noop_sink::NoopSink;
use loggly_sink::{fargs, Loggly, LogglyConfig};

#[tokio::main]
async fn main() {
    let config = LogglyConfig::default()
        .with_queue_capacity(50_000)
        .with_batch_size(1_000)
        .with_flush_interval(Duration::from_millis(200));

    let loggly = Loggly::with_sink(config, Arc::new(NoopSink));
    loggly.initialize("load-test").expect("non-empty token");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let _ = loggly.log_with_level(3, "custom load test error %llu", &fargs![i]);
    }

    let elapsed = start.elapsed();
    println!("custom config: logged {} messages in {:?} (~{:.0} msg/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    let stats = loggly.shutdown().await;
    println!("sent {} records, dropped {}", stats.records_sent, stats.total_dropped());
}
