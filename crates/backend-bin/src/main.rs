// ============================
// polifinder-backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the politician-finder API server.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use polifinder_backend_lib::{config::Settings, create_router, telemetry, AppState};

#[derive(Debug, Parser)]
#[command(name = "polifinder-server", version, about = "Politician finder API server")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "POLIFINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the configuration
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Log level, overrides the configuration
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }
    settings.validate().context("invalid configuration")?;

    telemetry::init_tracing(&settings.log_level, settings.log_format);

    let bind_addr = settings.bind_addr;
    let cleanup_every = Duration::from_secs(settings.rate_limit.cleanup_interval_secs);

    let state = Arc::new(
        AppState::from_settings(settings)
            .await
            .context("connecting backend")?,
    );

    let sweeper = {
        let state = state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                state.sweep_rate_limits();
            }
        })
    };

    let app = create_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %bind_addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
