//! Mirage Aggregator Server
//!
//! Central collection point for guard-protected instances.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MIRAGE AGGREGATOR                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  Ingest   │  │  Broadcast  │  │  Analysis Dispatch   │  │
//! │  │  API      │  │  Fan-out    │  │  (Background Tasks)  │  │
//! │  │  (Axum)   │  │  (WebSocket)│  │                      │  │
//! │  └─────┬─────┘  └──────┬──────┘  └──────────┬───────────┘  │
//! │        └───────────────┼────────────────────┘              │
//! │                        ▼                                   │
//! │                ┌───────────────┐                           │
//! │                │  Subscribers  │                           │
//! │                └───────────────┘                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod analysis;
mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod publish;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirage_aggregator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Mirage Aggregator starting...");
    tracing::info!("Analysis service: {}", config.analysis_url);

    if config.is_production() && config.ingest_token.starts_with("dev-") {
        tracing::warn!("running in production with the development ingest token");
    }

    // Build application state
    let state = AppState::new(config.clone());

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Aggregator listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub publisher: Arc<dyn publish::Publisher>,
    pub analysis: analysis::AnalysisClient,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let publisher: Arc<dyn publish::Publisher> = Arc::new(publish::BroadcastPublisher::new(
            publish::DEFAULT_CAPACITY,
        ));
        let analysis = analysis::AnalysisClient::new(
            &config.analysis_url,
            Duration::from_millis(config.analysis_timeout_ms),
        );

        Self {
            config,
            publisher,
            analysis,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/ws", get(handlers::ws::subscribe));

    // Ingest routes (shared bearer token auth) - protected instances only
    let ingest_routes = Router::new()
        .route("/v1/events", post(handlers::events::ingest))
        .route("/v1/trivy", post(handlers::trivy::ingest))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_ingest_auth,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(ingest_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
