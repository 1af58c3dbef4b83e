//! Phone Store POS - backend server

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use pos_server::{create_app, db, services::AuthService, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pos_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load().context("failed to load configuration")?;

    tracing::info!("Starting Phone Store POS server");
    tracing::info!("Environment: {}", config.environment);

    tracing::info!("Opening database {}", config.database.url);
    let pool = db::connect(&config.database)
        .await
        .context("failed to open database")?;

    tracing::info!("Running database migrations...");
    db::migrate(&pool).await?;
    tracing::info!("Migrations completed");

    if let Some(password) = config.bootstrap.admin_password.as_deref() {
        AuthService::new(pool.clone(), &config)
            .ensure_default_admin(password)
            .await?;
    }

    let state = AppState {
        db: pool.clone(),
        config: Arc::new(config.clone()),
    };
    let app = create_app(state);

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .context("server.host is not an IP address")?;
    let addr = SocketAddr::new(host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush WAL and release the file before exit
    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
