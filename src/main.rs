use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filevault::common::config::AppConfig;
use filevault::common::db::create_database_pool;
use filevault::common::di::{AppServiceFactory, AppState};
use filevault::interfaces::create_app;

/// filevault - personal cloud file storage
///
/// Folder trees and file records live in PostgreSQL, file content in a
/// blob store on disk. Requests are authenticated with bearer tokens
/// issued by an external auth platform.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let pool = Arc::new(
        create_database_pool(&config)
            .await
            .context("Failed to initialize database pool")?,
    );
    tracing::info!("PostgreSQL database pool initialized successfully");

    let factory = AppServiceFactory::new(config.clone());
    let repositories = factory
        .create_repository_services(pool.clone())
        .await
        .context("Failed to initialize repositories")?;
    let applications = factory.create_application_services(&repositories);
    let auth_service = factory.create_auth_service();

    let state = AppState::new(config.clone(), applications, auth_service).with_database(pool);
    let app = create_app(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Starting filevault server on http://{}", addr);

    axum::serve(listener, app).await?;

    tracing::info!("Server shutdown completed");
    Ok(())
}
