pub mod handlers;
pub mod types;

pub use handlers::AppState;

use crate::{
    Result,
    config::{Config, ServerConfig},
    pipeline::RequestPipeline,
    segmentation::ProcessingOptions,
    session::{ServiceStateMachine, SessionManager},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/api/status", get(handlers::status))
        .route("/api/remove-bg", post(handlers::remove_background))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(&server.cors_allow_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn run(config: Config) -> Result<()> {
    info!("Starting Remove BG API");

    let mut lifecycle = ServiceStateMachine::new();

    // Model loading is blocking and happens once, before the listener opens
    let model_config = config.model.clone();
    let session = tokio::task::spawn_blocking(move || SessionManager::initialize(&model_config))
        .await
        .map_err(|e| crate::Error::internal(format!("Session initialization task failed: {e}")))?;
    info!(
        "Segmentation availability: {}",
        if session.is_available() {
            "Available"
        } else {
            "Not available"
        }
    );
    let service_state = lifecycle.transition(session.startup_event())?;

    let pipeline = RequestPipeline::new(
        session,
        ProcessingOptions::from(&config.processing),
        config.debug.clone(),
    );
    if config.debug.enabled {
        info!("Debug output directory: {}", config.debug.output_dir.display());
    }

    let app_state = AppState::new(pipeline, service_state)
        .with_error_details(config.server.expose_error_details);
    let app = router(app_state, &config.server);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
