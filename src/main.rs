use benefit_service::{
    api::{self, AppState},
    config::{
        self,
        database::{create_pool, create_tables, ensure_sqlite_parent_dir},
    },
    core::benefit,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;

    // 4. Connect and make sure the schema exists
    ensure_sqlite_parent_dir(&app_config.database.url)?;
    let db = create_pool(
        &app_config.database.url,
        app_config.database.max_connections,
    )
    .await
    .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Seed initial benefits on an empty database
    let seeded = benefit::seed_if_empty(&db, &app_config.benefits)
        .await
        .inspect_err(|e| error!("Failed to seed initial benefits: {e}"))?;
    if seeded > 0 {
        info!("Seeded {seeded} initial benefits.");
    }

    // 6. Serve the API until Ctrl-C
    let app = api::router(AppState::new(db));
    let address = app_config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Benefit service listening on http://{address}");
    info!("API docs: http://{address}/docs");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Server {
            message: e.to_string(),
        })?;

    info!("Benefit service stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        return;
    }
    info!("Shutdown signal received.");
}
