use loggly_sink::init::{init_tracing_with_config, LayerConfig};
use loggly_sink::{Loggly, LogglyConfig};
use tracing::{error, info, warn};

/// Sends regular `tracing` events to Loggly next to console output.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = std::env::var("LOGGLY_TOKEN").unwrap_or_else(|_| "demo-token".to_string());

    let loggly = Loggly::new(LogglyConfig::default().with_tag("tracing-bridge"))?;
    loggly.initialize(token)?;
    loggly.fields().insert("service", "tracing_bridge");

    init_tracing_with_config(
        loggly.clone(),
        LayerConfig {
            min_level: tracing::Level::INFO,
            enable_stdout: true,
        },
    )?;

    info!(user = "alice", "signed in");
    warn!(latency_ms = 1250u64, "slow request");
    error!(db = "primary", "connection lost");

    loggly.shutdown().await;
    Ok(())
}
