use super::handlers;
use super::state::AppState;
use crate::ingress;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/recordings/start", post(handlers::start_recording))
        .route(
            "/recordings/stop/:participant_id",
            post(handlers::stop_recording),
        )
        // Recording queries
        .route(
            "/recordings/:participant_id/status",
            get(handlers::get_recording_status),
        )
        .route("/recordings/status", get(handlers::get_all_recordings))
        // Duplex audio streams from the egress service
        .route("/audio-stream", get(ingress::audio_stream_handler))
        // Passive monitoring observers
        .route("/monitor", get(ingress::monitor_handler))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
