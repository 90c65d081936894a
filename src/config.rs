use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
    pub egress: EgressConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    /// Room whose participant tracks are recorded.
    pub room: String,
    /// Storage bucket for flushed segments.
    pub bucket: String,
    /// Buffered seconds before a segment is flushed.
    pub flush_threshold_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Ingress URL handed to the egress service for streaming audio back.
    pub stream_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub root_path: String,
}

#[derive(Debug, Deserialize)]
pub struct EgressConfig {
    /// Base URL of the egress control API.
    pub api_url: String,
    pub poll_interval_secs: u64,
    pub shutdown_timeout_secs: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
