use std::sync::Arc;

use anyhow::{Context, Result};
use api::{AppState, create_router, middleware::JwtVerifier};
use common::{
    config::AppConfig,
    database::{health_check, init_pool, run_migrations},
};
use media::{database::PgVideoStore, storage::S3Storage, tools::FfmpegTools};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting API service");

    let config = AppConfig::load().context("failed to load configuration")?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let jwt = JwtVerifier::from_config(&config.auth)?;
    let storage = S3Storage::new(&config.storage).await;
    let tools = FfmpegTools::from_config(&config.media);
    let records = PgVideoStore::new(pool);

    info!(
        bucket = %config.storage.bucket,
        staging_dir = %config.media.staging_dir().display(),
        max_upload_bytes = config.server.max_upload_bytes,
        "API service initialized successfully"
    );

    let app_state = AppState::new(
        &config,
        Arc::new(tools),
        Arc::new(storage),
        Arc::new(records),
        jwt,
    );

    // Start the web server
    let app = create_router(app_state);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
