#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use trackrec::{
    AudioChunk, BroadcastHub, EgressClient, EgressJobState, EgressJobStatus, MemoryStorage,
    ObjectStorage, RecordingError, RecordingSupervisor, SupervisorConfig,
};

pub const TEST_ROOM: &str = "test-room";
pub const TEST_BUCKET: &str = "recordings";

/// Scriptable egress client double.
#[derive(Default)]
pub struct MockEgressClient {
    inner: Mutex<MockEgressInner>,
}

#[derive(Default)]
struct MockEgressInner {
    next_job: u64,
    jobs: Vec<EgressJobStatus>,
    fail_submit: bool,
    stopped: Vec<String>,
}

impl MockEgressClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_next_submit(&self) {
        self.inner.lock().await.fail_submit = true;
    }

    pub async fn set_job_state(&self, job_id: &str, state: EgressJobState) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.iter_mut().find(|j| j.job_id == job_id) {
            job.state = state;
        }
    }

    /// Simulate the job vanishing from the egress service's list.
    pub async fn remove_job(&self, job_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.jobs.retain(|j| j.job_id != job_id);
    }

    pub async fn stopped_jobs(&self) -> Vec<String> {
        self.inner.lock().await.stopped.clone()
    }
}

#[async_trait]
impl EgressClient for MockEgressClient {
    async fn submit_recording_job(
        &self,
        _room: &str,
        _track_id: &str,
        _stream_url: &str,
    ) -> Result<String, RecordingError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_submit {
            inner.fail_submit = false;
            return Err(RecordingError::Egress("injected submit failure".to_string()));
        }
        let job_id = format!("job-{}", inner.next_job);
        inner.next_job += 1;
        inner.jobs.push(EgressJobStatus {
            job_id: job_id.clone(),
            state: EgressJobState::Active,
            error: None,
        });
        Ok(job_id)
    }

    async fn stop_job(&self, job_id: &str) -> Result<(), RecordingError> {
        self.inner.lock().await.stopped.push(job_id.to_string());
        Ok(())
    }

    async fn list_job_statuses(&self) -> Result<Vec<EgressJobStatus>, RecordingError> {
        Ok(self.inner.lock().await.jobs.clone())
    }
}

/// Supervisor wired to in-memory storage and a mock egress client.
pub async fn test_supervisor(
    flush_threshold_secs: f64,
) -> (Arc<RecordingSupervisor>, MemoryStorage, Arc<MockEgressClient>) {
    let storage = MemoryStorage::new();
    storage.make_bucket(TEST_BUCKET).await.expect("make bucket");
    let egress = Arc::new(MockEgressClient::new());

    let supervisor = Arc::new(RecordingSupervisor::new(
        SupervisorConfig {
            room: TEST_ROOM.to_string(),
            bucket: TEST_BUCKET.to_string(),
            flush_threshold_secs,
            ..SupervisorConfig::default()
        },
        Arc::clone(&egress) as Arc<dyn EgressClient>,
        Arc::new(storage.clone()),
        BroadcastHub::new(),
    ));

    (supervisor, storage, egress)
}

/// A valid 48kHz mono PCM chunk of the given duration, filled with silence.
pub fn make_chunk(participant: &str, sequence: u64, duration_secs: f64) -> AudioChunk {
    let sample_rate = 48_000u32;
    let samples = (duration_secs * sample_rate as f64).round() as usize;
    AudioChunk::new(participant, sequence, vec![0u8; samples * 2], sample_rate, 1)
        .expect("valid chunk")
}
