use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use restaurant_api::api::{self, AppState};
use restaurant_api::cli::{Cli, Commands};
use restaurant_api::config::AppConfig;
use restaurant_api::database::DatabaseManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("restaurant_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    info!("Starting restaurant API in {:?} mode", config.environment);

    match cli.command() {
        Commands::Migrate => migrate(config).await,
        Commands::Serve { bind } => serve(config, bind).await,
    }
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let database = DatabaseManager::connect(&config.database).await?;
    database.migrate().await?;
    database.close().await;
    info!("Migrations applied");
    Ok(())
}

async fn serve(mut config: AppConfig, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.api.bind_address = bind;
    }

    let database = DatabaseManager::connect(&config.database).await?;
    database.migrate().await?;

    let state = AppState::new(database.pool().clone(), config)
        .context("failed to initialise token service")?;
    state.users().ensure_default_admin(&state.config.bootstrap).await?;

    spawn_token_sweeper(&state);

    let bind_address = state.config.api.bind_address.clone();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!("Restaurant API listening on http://{}", bind_address);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    info!("Server stopped");
    Ok(())
}

fn spawn_token_sweeper(state: &AppState) {
    let cache = state.token_cache.clone();
    let period = Duration::from_secs(state.config.security.token_cache_sweep_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.sweep_expired();
            if removed > 0 {
                info!("Swept {} expired tokens from cache", removed);
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
