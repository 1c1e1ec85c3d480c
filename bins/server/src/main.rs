//! Obra API Server
//!
//! Main entry point for the Obra backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use obra_api::{AppState, create_router};
use obra_db::connect_with_pool;
use obra_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "obra=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .context("Access token expiry out of range")?,
    };

    info!(
        utc_offset_hours = config.business.utc_offset_hours,
        today = %config.business.today(),
        "Business calendar configured"
    );

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(jwt_config)),
        business: config.business.clone(),
    };

    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
