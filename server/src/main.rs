//! Humidor Server binary.

use humidor_server::{build_router, config::Config, websocket::spawn_status_fanout, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "humidor_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Humidor Server on {}:{}", config.host, config.port);
    tracing::info!(
        spreadsheet = %config.spreadsheet_id,
        inventory = %config.inventory_sheet.title,
        history = %config.history_sheet.title,
        "Using spreadsheet"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::from_config(config)?;

    // A failed first load leaves the inventory empty until the next refresh.
    if let Err(e) = state.service.refresh().await {
        tracing::warn!("Initial refresh failed: {}", e);
    }

    spawn_status_fanout(
        state.service.status().subscribe(),
        state.conn_manager.clone(),
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
