// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use cupping_server::{api::router, config::AppConfig, state::AppState, telemetry};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    telemetry::init(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind = (config.host.clone(), config.port);

    let state = AppState::new(config)?;
    if !state.authenticator.verifies_signatures() {
        warn!("No Clerk key set configured; every session will be treated as anonymous");
    }
    if !state.privileged.is_configured() {
        warn!("Supabase privileged access is not configured; privileged actions will fail");
    }

    let listener = TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Starting cupping server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
