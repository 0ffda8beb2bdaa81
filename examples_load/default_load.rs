use std::sync::Arc;
use std::time::Instant;

use loggly_sink::noop_sink::NoopSink;
use loggly_sink::{fargs, Loggly, LogglyConfig};

#[tokio::main]
async fn main() {
    let loggly = Loggly::with_sink(LogglyConfig::default(), Arc::new(NoopSink));
    loggly.initialize("load-test").expect("non-empty token");
    loggly.fields().insert("service", "default_load");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let _ = loggly.log("default load test iteration %llu", &fargs![i]);
    }

    let elapsed = start.elapsed();
    println!("default config: logged {} messages in {:?} (~{:.0} msg/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    let stats = loggly.shutdown().await;
    println!("{:?}", stats);
}
