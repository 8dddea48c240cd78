//! checkin-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use checkin_gateway::api;
use checkin_gateway::app_state::AppState;
use checkin_gateway::config::GatewayConfig;
use checkin_gateway::domain::CheckinFeed;
use checkin_gateway::persistence::{PostgresStore, RecordStore};
use checkin_gateway::service::{
    EventService, ExportService, RegistrationService, ReportService, ValidationService,
};
use checkin_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting checkin-gateway");

    // Connect to the record store and apply migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let store: Arc<dyn RecordStore> = Arc::new(PostgresStore::new(pool));
    let retry = config.retry_policy();
    let feed = CheckinFeed::new(config.feed_capacity);

    // Build service layer
    let app_state = AppState {
        events: Arc::new(EventService::new(Arc::clone(&store), feed.clone())),
        registrations: Arc::new(RegistrationService::new(Arc::clone(&store), feed.clone())),
        validation: Arc::new(ValidationService::new(
            Arc::clone(&store),
            feed.clone(),
            retry,
        )),
        export: Arc::new(ExportService::new(Arc::clone(&store), retry)),
        reports: Arc::new(ReportService::new(Arc::clone(&store), retry)),
        feed,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
