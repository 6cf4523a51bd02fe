//! # Project Portal
//!
//! Backend for the school project-management dashboard: students register
//! projects, teachers and directors score them and book exam appointments,
//! and administrators manage terms, assignments and notifications.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - Documents live in Postgres (SQLx) or, without a database URL, in memory
//! - Push notifications go out through Firebase Cloud Messaging via reqwest

use tracing::info;

use project_portal::config::AppConfig;
use project_portal::create_app;
use project_portal::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "project_portal=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting project portal");

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let state = AppState::from_config(config).await?;

    let app = create_app(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
