use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use case_service::auth::JwtService;
use case_service::config::AppConfig;
use case_service::notifications::InMemoryNotificationStore;
use case_service::repository::Database;
use case_service::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let jwt = JwtService::from_env().context("loading JWT configuration")?;

    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;
    db.create_tables().await.context("ensuring database schema")?;

    let state = AppState::new(db, jwt, Arc::new(InMemoryNotificationStore::new()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("case service listening on http://{}", config.bind_addr);

    axum::serve(listener, app(state)).await.context("server exited")?;
    Ok(())
}
