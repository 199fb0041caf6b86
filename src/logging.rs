use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::VitalisError;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<(), VitalisError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| VitalisError::Logging(e.to_string()))
}
