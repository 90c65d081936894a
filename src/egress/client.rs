use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RecordingError;

/// Externally reported state of one egress job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EgressJobState {
    Starting,
    Active,
    Complete,
    Failed,
}

/// One entry of the egress service's job list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EgressJobStatus {
    pub job_id: String,
    pub state: EgressJobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Control interface to the external egress service.
///
/// The job list returned by `list_job_statuses` is authoritative: the
/// supervisor resolves any divergence between local state and the external
/// list in the external system's favor.
#[async_trait]
pub trait EgressClient: Send + Sync {
    /// Ask the egress service to start capturing `track_id` in `room` and
    /// stream the audio to `stream_url`. Returns the accepted job's id.
    async fn submit_recording_job(
        &self,
        room: &str,
        track_id: &str,
        stream_url: &str,
    ) -> Result<String, RecordingError>;

    /// Request that a running job stop. Completion is asynchronous and is
    /// observed via `list_job_statuses` or a `track_ended` control message.
    async fn stop_job(&self, job_id: &str) -> Result<(), RecordingError>;

    /// Current status of all jobs known to the egress service.
    async fn list_job_statuses(&self) -> Result<Vec<EgressJobStatus>, RecordingError>;
}
