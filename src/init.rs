use crate::client::Loggly;
use crate::layer::LogglyLayer;
use std::sync::OnceLock;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

static GLOBAL: OnceLock<Loggly> = OnceLock::new();

/// Park `client` in the process-wide slot so code without access to the
/// handle can reach it through [`global`].
///
/// **Returns**
/// - `Err(client)` if a client was already installed; the slot keeps the
///   first one.
pub fn install_global(client: Loggly) -> Result<(), Loggly> {
    GLOBAL.set(client)
}

/// The client installed with [`install_global`], if any.
pub fn global() -> Option<&'static Loggly> {
    GLOBAL.get()
}

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `min_level`: least severe `tracing` level forwarded to Loggly.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to [`LogglyLayer`] so events also reach the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: tracing::Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: tracing::Level::INFO,
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events to `client`.
///
/// **Parameters**
/// - `client`: initialized (or soon to be initialized) [`Loggly`] handle.
/// - `config`: [`LayerConfig`] controlling level filtering and console
///   output.
///
/// **Errors**
/// - [`SetGlobalDefaultError`] if a global subscriber is already set.
pub fn init_tracing_with_config(client: Loggly, config: LayerConfig) -> Result<(), SetGlobalDefaultError> {
    let layer = LogglyLayer::new(client, config.min_level);

    // Both arms build a different subscriber type, hence the duplication.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(client: Loggly) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(client, LayerConfig::default())
}
