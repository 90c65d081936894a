use thiserror::Error;

/// Errors surfaced by the recording pipeline.
///
/// Only the supervisor's public operations propagate these to callers;
/// everything inside the ingress/buffer/fan-out path is logged and contained
/// so one participant's failure never affects another's stream.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// Audio payload is not a whole multiple of the sample width.
    #[error("invalid audio chunk: {0}")]
    InvalidChunk(String),

    /// Encoder was given chunks with differing sample formats.
    #[error("format mismatch in chunk sequence: {0}")]
    FormatMismatch(String),

    /// Encoder was asked to encode zero chunks.
    #[error("cannot encode an empty segment")]
    EmptySegment,

    /// The WAV writer failed while producing a segment.
    #[error("segment encoding failed: {0}")]
    Encoding(String),

    /// Object storage upload or bucket operation failed. The caller must
    /// retain the unflushed chunks and retry on the next threshold crossing.
    #[error("storage operation failed: {0}")]
    Storage(String),

    /// The ingress connection handshake lacked room, track or participant.
    #[error("missing stream parameters: {0}")]
    MissingStreamParameters(String),

    /// A non-terminal recording already exists for this participant.
    #[error("recording already active for participant {0}")]
    AlreadyRecording(String),

    /// The external egress job could not be started.
    #[error("failed to start recording: {0}")]
    RecordingStart(String),

    /// The egress control API call failed.
    #[error("egress request failed: {0}")]
    Egress(String),
}
