//! Sensor bridge: forwards telemetry lines from the bedside sensor to the
//! vitalis server, reconnecting whenever the server goes away.

use tokio::signal;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;

use vitalis::bridge::{self, BridgeError, SourceLines};
use vitalis::config::{config_path, load_config, ReaderConfig};
use vitalis::{logging, VitalisError};

async fn run(config: &ReaderConfig, mut lines: SourceLines) -> Result<(), VitalisError> {
    loop {
        tracing::info!(server = %config.server_url, "connecting");

        let socket = match connect_async(config.server_url.as_str()).await {
            Ok((socket, _)) => socket,
            Err(err) => {
                tracing::error!(server = %config.server_url, error = %err, "failed to connect, is the server running?");
                sleep(config.reconnect_delay()).await;
                continue;
            }
        };
        tracing::info!(server = %config.server_url, "connected");

        match bridge::forward(&mut lines, socket).await {
            Ok(sent) => {
                tracing::info!(sent, "telemetry source ended");
                return Ok(());
            }
            Err(err @ BridgeError::Source(_)) => return Err(err.into()),
            Err(err) => {
                tracing::warn!(error = %err, "connection lost, reconnecting");
                sleep(config.reconnect_delay()).await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), VitalisError> {
    let path = config_path();
    let config = load_config(&path)?;
    logging::init(&config.logging)?;

    let source = config.reader.source();
    let lines = source.open().await?;
    tracing::info!(config = %path.display(), %source, "sensor bridge started");

    tokio::select! {
        result = run(&config.reader, lines) => result,
        signal = signal::ctrl_c() => {
            signal?;
            tracing::info!("ctrl+c received, stopping bridge");
            Ok(())
        }
    }
}
