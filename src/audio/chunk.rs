use chrono::{DateTime, Utc};

use crate::error::RecordingError;

/// Byte width of one sample for 16-bit PCM.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Sample encoding of a chunk payload.
///
/// The egress stream delivers signed 16-bit little-endian PCM; the tag is
/// carried per chunk so a mid-stream format change is detectable rather than
/// silently mis-decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    PcmS16Le,
}

impl SampleEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleEncoding::PcmS16Le => "pcm_s16le",
        }
    }
}

/// One unit of raw audio received over the ingress connection.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Identity of the speaker this chunk belongs to.
    pub participant_id: String,
    /// Monotonically increasing per participant, starting at 0.
    pub sequence_number: u64,
    /// Raw interleaved i16 little-endian samples.
    pub payload: Vec<u8>,
    /// Timestamp of receipt.
    pub captured_at: DateTime<Utc>,
    /// Sample rate in Hz (48000 by default).
    pub sample_rate: u32,
    /// Number of interleaved channels (mono by default).
    pub channel_count: u16,
    /// Sample encoding of the payload.
    pub encoding: SampleEncoding,
}

impl AudioChunk {
    /// Build a validated chunk. Fails if the payload length is not a whole
    /// multiple of the sample width; no other component should construct
    /// chunks without going through this validation.
    pub fn new(
        participant_id: impl Into<String>,
        sequence_number: u64,
        payload: Vec<u8>,
        sample_rate: u32,
        channel_count: u16,
    ) -> Result<Self, RecordingError> {
        if payload.len() % BYTES_PER_SAMPLE != 0 {
            return Err(RecordingError::InvalidChunk(format!(
                "payload of {} bytes is not a multiple of the {}-byte sample width",
                payload.len(),
                BYTES_PER_SAMPLE
            )));
        }

        Ok(Self {
            participant_id: participant_id.into(),
            sequence_number,
            payload,
            captured_at: Utc::now(),
            sample_rate,
            channel_count,
            encoding: SampleEncoding::PcmS16Le,
        })
    }

    /// Total number of samples in the payload (all channels).
    pub fn sample_count(&self) -> usize {
        self.payload.len() / BYTES_PER_SAMPLE
    }

    /// Audio duration represented by this chunk, computed from sample
    /// counts rather than wall-clock arrival time.
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count() as f64 / (self.sample_rate as f64 * self.channel_count as f64)
    }

    /// True when `other` carries the same sample format as `self`.
    pub fn format_matches(&self, other: &AudioChunk) -> bool {
        self.sample_rate == other.sample_rate
            && self.channel_count == other.channel_count
            && self.encoding == other.encoding
    }
}
