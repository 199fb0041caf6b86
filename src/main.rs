use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;

use vitalis::config::{config_path, load_config};
use vitalis::{logging, InMemoryPatientRepository, PatientService, RealtimeCoordinator, VitalisError};

#[tokio::main]
async fn main() -> Result<(), VitalisError> {
    let path = config_path();
    let config = load_config(&path)?;
    logging::init(&config.logging)?;

    tracing::info!(config = %path.display(), "starting vitalis");

    let coordinator =
        RealtimeCoordinator::with_queue_capacity(config.recording.duration(), config.api.client_queue_capacity);
    let repository = Arc::new(InMemoryPatientRepository::new());
    let service = PatientService::new(repository, coordinator.clone());

    let routes = vitalis::api::routes(service, coordinator);
    let addr = config.api.socket_addr()?;

    // Create a channel for shutdown signal
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let (bound, server) = warp::serve(routes).try_bind_with_graceful_shutdown(addr, async move {
        shutdown_rx.await.ok();
        tracing::info!("shutting down server");
    })?;
    tracing::info!(%bound, "listening");

    let server_handle = tokio::spawn(server);

    signal::ctrl_c().await?;
    tracing::info!("ctrl+c received, starting graceful shutdown");
    shutdown_tx.send(()).ok();

    if let Err(e) = server_handle.await {
        tracing::error!(error = %e, "server task failed");
    }

    tracing::info!("server shutdown complete");
    Ok(())
}
