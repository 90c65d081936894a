use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::audio::AudioChunk;

/// JSON event emitted to monitoring observers for every published chunk.
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioChunkEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub participant_identity: String,
    /// Base64-encoded raw PCM payload.
    pub audio_data: String,
    pub format: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub sequence: u64,
    /// RFC3339 receipt timestamp.
    pub timestamp: String,
}

impl AudioChunkEvent {
    pub fn from_chunk(chunk: &AudioChunk) -> Self {
        Self {
            event_type: "audio_chunk".to_string(),
            participant_identity: chunk.participant_id.clone(),
            audio_data: base64::engine::general_purpose::STANDARD.encode(&chunk.payload),
            format: chunk.encoding.as_str().to_uppercase(),
            sample_rate: chunk.sample_rate,
            channels: chunk.channel_count,
            sequence: chunk.sequence_number,
            timestamp: chunk.captured_at.to_rfc3339(),
        }
    }
}
