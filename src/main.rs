use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use formdrop::config::Config;
use formdrop::db::PgSubmissionStore;
use formdrop::state::SharedState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {e}"))?;

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting formdrop");

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!("Uploads stored in {}", config.upload_dir.display());

    // A failed initial connection is fatal
    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.db_connect_timeout)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database connection error: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("Database connected");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied");

    let store = PgSubmissionStore::new(pool);
    let addr = SocketAddr::new(config.host, config.port);
    let (app, state) = formdrop::build_app(Arc::new(store.clone()), config);

    let cleanup = tokio::spawn(prune_rate_limits(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cleanup.abort();
    store.close().await;
    tracing::info!("Database connection closed");

    Ok(())
}

async fn prune_rate_limits(state: SharedState) {
    let mut interval = tokio::time::interval(state.limiter.window().max(Duration::from_secs(1)));
    // The first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        state.limiter.cleanup();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
