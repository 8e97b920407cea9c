use tracing_subscriber::EnvFilter;
use usi_bridge_core::{LogConfig, LogFormat};

/// Install the global subscriber. Logs go to stderr; stdout carries
/// command output. `RUST_LOG` wins over the configured level.
pub fn init(config: Option<&LogConfig>) {
    let defaults = LogConfig::default();
    let config = config.unwrap_or(&defaults);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        eprintln!("warning: logging already initialised: {e}");
    }
}
