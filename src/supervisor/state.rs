use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lifecycle status of one participant recording.
///
/// All transitions are one-directional; `Completed` and `Failed` are
/// terminal. A later `start` for the same participant creates a fresh state
/// rather than reusing a terminal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    Pending,
    Recording,
    Stopping,
    Completed,
    Failed,
}

impl RecordingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordingStatus::Completed | RecordingStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition(&self, next: RecordingStatus) -> bool {
        use RecordingStatus::*;
        matches!(
            (self, next),
            (Pending, Recording)
                | (Pending, Failed)
                | (Recording, Stopping)
                | (Recording, Completed)
                | (Recording, Failed)
                | (Stopping, Completed)
                | (Stopping, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingStatus::Pending => "pending",
            RecordingStatus::Recording => "recording",
            RecordingStatus::Stopping => "stopping",
            RecordingStatus::Completed => "completed",
            RecordingStatus::Failed => "failed",
        }
    }
}

/// State of one participant recording, owned and mutated only by the
/// supervisor. Retained after reaching a terminal status so post-mortem
/// status queries stay valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingState {
    pub participant_id: String,
    pub track_id: String,
    /// Handle to the external egress job, assigned once accepted.
    pub job_id: Option<String>,
    pub status: RecordingStatus,
    pub started_at: DateTime<Utc>,
    /// Unset until a terminal status is reached.
    pub completed_at: Option<DateTime<Utc>>,
    /// Storage prefix under which this recording's segments land.
    pub output_key: String,
    pub chunks_received: u64,
    pub accumulated_duration_seconds: f64,
    /// True once the job has appeared in the egress job list; absence from
    /// the list is only treated as failure after it has been observed.
    #[serde(skip)]
    pub(crate) job_observed: bool,
}

impl RecordingState {
    pub fn new(participant_id: String, track_id: String, output_key: String) -> Self {
        Self {
            participant_id,
            track_id,
            job_id: None,
            status: RecordingStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            output_key,
            chunks_received: 0,
            accumulated_duration_seconds: 0.0,
            job_observed: false,
        }
    }

    /// Apply a transition if the state machine allows it. Illegal requests
    /// are logged and refused; terminal states never change.
    pub fn advance(&mut self, next: RecordingStatus) -> bool {
        if !self.status.can_transition(next) {
            warn!(
                participant = %self.participant_id,
                from = self.status.as_str(),
                to = next.as_str(),
                "refusing illegal recording state transition"
            );
            return false;
        }

        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        true
    }
}
