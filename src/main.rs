use anyhow::Result;
use renewable_site_scout::{ScoutConfig, SiteScout};
use rmcp::ServiceExt;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "renewable_site_scout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting renewable site scout MCP server");

    let config = ScoutConfig::load()?;
    let shutdown = CancellationToken::new();
    let scout = SiteScout::new(&config, shutdown.clone())?;

    let server = scout.serve(rmcp::transport::stdio()).await?;
    let server_token = server.cancellation_token();
    let waiting = server.waiting();
    tokio::pin!(waiting);

    tokio::select! {
        quit = &mut waiting => {
            let reason = quit?;
            tracing::info!(?reason, "Client disconnected");
            shutdown.cancel();
        }
        () = shutdown_signal() => {
            // In-flight tool calls stop before the service loop drains.
            shutdown.cancel();
            server_token.cancel();
            waiting.await?;
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
