use std::sync::Arc;

use anyhow::Context;
use catalog_common::BrowseContextTracker;
use catalog_common::storage::FilesystemFileStore;
use chrono::TimeDelta;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog_server::config::AppConfig;
use catalog_server::state::AppState;
use catalog_server::{build_router, database, schema};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database");
    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    schema::ensure_indexes(&db).await?;

    let files = FilesystemFileStore::new(&config.storage)
        .await
        .context("Failed to prepare upload directory")?;
    info!(dir = %config.storage.upload_dir.display(), "Upload storage ready");

    let tracker = BrowseContextTracker::new(TimeDelta::seconds(
        config.catalog.browse_context_ttl_secs,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        files: Arc::new(files),
        tracker,
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
