use loggly_sink::env::LOGGLY_TOKEN_ENV;
use loggly_sink::{fargs, Level, Loggly};

/// Reads LOGGLY_* variables, logs a few messages and flushes on exit.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loggly = Loggly::from_env()?;
    if !loggly.is_initialized() {
        eprintln!("set {} to run this example", LOGGLY_TOKEN_ENV);
        return Ok(());
    }

    loggly.fields().insert("app", "facade-example");
    loggly.fields().insert("build", 42);
    loggly.tags().add("example");

    loggly.log("started with %d workers", &fargs![4])?;
    loggly.log_at(Level::Warning, "cache hit ratio %.2f below %s", &fargs![0.61, "target"])?;
    loggly.log_with_level(3, "giving up after %d attempts", &fargs![5])?;

    let stats = loggly.shutdown().await;
    println!("{:?}", stats);
    Ok(())
}
