//! Web delivery: axum router and server entry point.

pub mod routes;
pub mod state;
pub mod views;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use state::AppState;

/// Upload size cap, generous for phone photos.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/disease-detection-file", post(routes::detect_file))
        .route("/disease-detection", post(routes::detect_base64))
        .route("/health", get(routes::health))
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::index))
        .route("/analyze", post(routes::analyze_fragment))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let port = config.port;
    let state = AppState::new(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("leafscan listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
