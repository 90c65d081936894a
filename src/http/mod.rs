//! HTTP and WebSocket surface for the recording service
//!
//! REST routes delegate to the recording supervisor's public operations:
//! - POST /recordings/start - Start recording a participant's track
//! - POST /recordings/stop/:participant_id - Stop a recording
//! - GET /recordings/:participant_id/status - Query one recording
//! - GET /recordings/status - Query all recordings
//! - GET /health - Health check
//!
//! WebSocket routes:
//! - GET /audio-stream - Inbound egress audio streams
//! - GET /monitor - Passive monitoring observers

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, StreamSettings};
