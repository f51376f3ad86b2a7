use clap::Parser;
use tracing::{error, info};
use yt_draft_studio::{Args, Settings, build_router, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let args = Args::parse();

    let settings = match Settings::from_args(args) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Using REST API at: {}", settings.rest_api_address);
    info!("Using chat completions API at: {}", settings.openai_api_address);
    info!("Canonical URL (OAuth redirect URI): {}", settings.public_url);

    let app = match build_router(&settings) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {}", e);
            return Err(e.into());
        }
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .map_err(|e| format!("Failed to bind '{}': {}", settings.bind, e))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Received SIGINT, shutting down...");
                    }
                    return;
                }
            };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT, shutting down...");
        }
    }
}
