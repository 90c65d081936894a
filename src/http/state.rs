use std::sync::Arc;

use crate::supervisor::RecordingSupervisor;

/// Fixed per-session stream format, applied to every inbound chunk.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub room: String,
    pub sample_rate: u32,
    pub channel_count: u16,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            room: "default-room".to_string(),
            sample_rate: 48_000,
            channel_count: 1,
        }
    }
}

/// Shared application state for HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<RecordingSupervisor>,
    pub settings: Arc<StreamSettings>,
}

impl AppState {
    pub fn new(supervisor: Arc<RecordingSupervisor>, settings: StreamSettings) -> Self {
        Self {
            supervisor,
            settings: Arc::new(settings),
        }
    }
}
