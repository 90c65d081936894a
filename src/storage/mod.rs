//! Object storage sink for encoded audio segments.
//!
//! Uploads are all-or-nothing: a segment either lands whole under its key or
//! not at all, and a failed `put` leaves the caller's buffered audio intact
//! for the next flush attempt.

pub mod fs;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RecordingError;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// Content type used for flushed WAV segments.
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// Content-addressed object storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Check whether a bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, RecordingError>;

    /// Create a bucket. Idempotent: creating an existing bucket is not an
    /// error.
    async fn make_bucket(&self, bucket: &str) -> Result<(), RecordingError>;

    /// Upload an object. The object must not be observable half-written;
    /// implementations rely on atomic put semantics of their backend.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RecordingError>;
}

/// Deterministic storage key for one flushed segment:
/// `participants/<room>/<participant>/chunk_<first_seq>_<last_seq>_<timestamp>.wav`
pub fn segment_key(
    room: &str,
    participant: &str,
    first_seq: u64,
    last_seq: u64,
    flushed_at: DateTime<Utc>,
) -> String {
    format!(
        "participants/{}/{}/chunk_{}_{}_{}.wav",
        room,
        participant,
        first_seq,
        last_seq,
        flushed_at.format("%Y%m%d_%H%M%S")
    )
}
