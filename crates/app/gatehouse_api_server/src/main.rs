//! Gatehouse API server binary.
//!
//! Connects to PostgreSQL, applies migrations and serves the token
//! authentication API until interrupted.

use std::sync::Arc;

use clap::Parser;
use gatehouse_api::AppState;
use gatehouse_api::config::ApiConfig;
use gatehouse_core::auth::password::BcryptHasher;
use gatehouse_core::auth::service::AuthService;
use gatehouse_core::store::{PgTokenStore, PgUserStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "gatehouse_api_server", about = "Gatehouse token authentication server")]
struct Args {
    /// Address to listen on. Overrides `BIND_ADDR`.
    #[arg(long)]
    bind_addr: Option<String>,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/gatehouse"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,gatehouse_api=debug,gatehouse_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    if config.auth.jwt_secret.is_empty() {
        warn!("JWT_SECRET_KEY is not set; token issuance will fail");
    }

    info!(
        max_connections = args.max_connections,
        rotate_refresh_tokens = config.auth.rotate_refresh_tokens,
        "starting gatehouse_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    gatehouse_api::migrate(&pool).await?;

    let auth = AuthService::new(
        &config.auth,
        Arc::new(PgTokenStore::new(pool.clone())),
        Arc::new(PgUserStore::new(pool)),
        Arc::new(BcryptHasher::new()),
    );
    let app = gatehouse_api::router(AppState { auth });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
