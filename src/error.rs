use thiserror::Error;

use crate::bridge::BridgeError;
use crate::config::ConfigError;

/// Failures that end a binary. Everything below this level is recovered
/// where it happens.
#[derive(Debug, Error)]
pub enum VitalisError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("server error: {0}")]
    Server(#[from] warp::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_failures_convert() {
        let err: VitalisError = ConfigError::Invalid("recording.duration_secs must be greater than zero".into()).into();
        assert!(matches!(err, VitalisError::Config(_)));
        assert_eq!(
            err.to_string(),
            "invalid configuration: recording.duration_secs must be greater than zero"
        );

        let err: VitalisError = BridgeError::Disconnected.into();
        assert!(matches!(err, VitalisError::Bridge(BridgeError::Disconnected)));
    }
}
