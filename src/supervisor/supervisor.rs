use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::audio::{encode_wav, AudioChunk, ChunkBuffer};
use crate::broadcast::BroadcastHub;
use crate::egress::{EgressClient, EgressJobState};
use crate::error::RecordingError;
use crate::storage::{segment_key, ObjectStorage, WAV_CONTENT_TYPE};

use super::state::{RecordingState, RecordingStatus};

/// Configuration for the recording supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Room whose participant tracks are being recorded.
    pub room: String,
    /// Storage bucket receiving flushed segments.
    pub bucket: String,
    /// Buffered seconds per participant before a segment is flushed.
    pub flush_threshold_secs: f64,
    /// Base URL of our ingress endpoint, handed to the egress service.
    pub stream_url: String,
    /// Interval between egress job list reconciliations.
    pub poll_interval: Duration,
    /// Upper bound on per-participant finalization during shutdown.
    pub finalize_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            room: "default-room".to_string(),
            bucket: "recordings".to_string(),
            flush_threshold_secs: 5.0,
            stream_url: "ws://localhost:8080/audio-stream".to_string(),
            poll_interval: Duration::from_secs(5),
            finalize_timeout: Duration::from_secs(10),
        }
    }
}

/// Owns per-participant recording lifecycle and the flush pipeline.
///
/// The state map is mutated by inbound start/stop calls, ingress
/// finalization and the periodic poller; every mutation is a single
/// read-modify-write under the map's write lock, which is never held across
/// an await on egress or storage I/O.
pub struct RecordingSupervisor {
    config: SupervisorConfig,
    egress: Arc<dyn EgressClient>,
    storage: Arc<dyn ObjectStorage>,
    hub: BroadcastHub,
    states: RwLock<HashMap<String, RecordingState>>,
    /// One buffer per participant, single writer (that participant's ingress
    /// task); the supervisor only drains during flush and finalization.
    buffers: RwLock<HashMap<String, Arc<Mutex<ChunkBuffer>>>>,
    shutting_down: AtomicBool,
}

impl RecordingSupervisor {
    pub fn new(
        config: SupervisorConfig,
        egress: Arc<dyn EgressClient>,
        storage: Arc<dyn ObjectStorage>,
        hub: BroadcastHub,
    ) -> Self {
        info!(room = %config.room, "recording supervisor initialized");
        Self {
            config,
            egress,
            storage,
            hub,
            states: RwLock::new(HashMap::new()),
            buffers: RwLock::new(HashMap::new()),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn room(&self) -> &str {
        &self.config.room
    }

    /// Start recording a participant's track via the external egress service.
    ///
    /// Returns the accepted egress job id. Fails with `AlreadyRecording`
    /// when a non-terminal recording exists for this participant; a terminal
    /// state is replaced by a fresh one with a newly derived output key.
    pub async fn start(
        &self,
        participant_id: &str,
        track_id: &str,
    ) -> Result<String, RecordingError> {
        {
            let mut states = self.states.write().await;
            if let Some(existing) = states.get(participant_id) {
                if !existing.status.is_terminal() {
                    warn!(
                        participant = %participant_id,
                        status = existing.status.as_str(),
                        "start refused: recording already active"
                    );
                    return Err(RecordingError::AlreadyRecording(participant_id.to_string()));
                }
            }

            let started_at = Utc::now();
            let output_key = format!(
                "participants/{}/{}/{}",
                self.config.room,
                participant_id,
                started_at.format("%Y%m%d_%H%M%S")
            );
            states.insert(
                participant_id.to_string(),
                RecordingState::new(
                    participant_id.to_string(),
                    track_id.to_string(),
                    output_key,
                ),
            );
        }

        // Every ingress connection numbers its chunks from 0, so a fresh
        // recording must start from a fresh buffer: a leftover one would
        // reject the whole new stream as regressed sequences.
        self.buffers.write().await.insert(
            participant_id.to_string(),
            Arc::new(Mutex::new(ChunkBuffer::new())),
        );

        let stream_url = format!(
            "{}?track_id={}&room={}&participant={}",
            self.config.stream_url, track_id, self.config.room, participant_id
        );

        info!(
            participant = %participant_id,
            track = %track_id,
            stream_url = %stream_url,
            "starting egress recording job"
        );

        match self
            .egress
            .submit_recording_job(&self.config.room, track_id, &stream_url)
            .await
        {
            Ok(job_id) => {
                let mut states = self.states.write().await;
                if let Some(state) = states.get_mut(participant_id) {
                    state.job_id = Some(job_id.clone());
                    state.advance(RecordingStatus::Recording);
                }
                info!(participant = %participant_id, job = %job_id, "recording started");
                Ok(job_id)
            }
            Err(e) => {
                let mut states = self.states.write().await;
                if let Some(state) = states.get_mut(participant_id) {
                    state.advance(RecordingStatus::Failed);
                }
                error!(participant = %participant_id, "egress job submission failed: {}", e);
                Err(RecordingError::RecordingStart(e.to_string()))
            }
        }
    }

    /// Request that a participant's recording stop.
    ///
    /// Returns `false` as a no-op when no recording is active. Returns
    /// `true` immediately after the stop request; completion is confirmed
    /// asynchronously by the poller or a `track_ended` control message.
    pub async fn stop(&self, participant_id: &str) -> bool {
        let job_id = {
            let mut states = self.states.write().await;
            match states.get_mut(participant_id) {
                Some(state) if state.status == RecordingStatus::Recording => {
                    state.advance(RecordingStatus::Stopping);
                    state.job_id.clone()
                }
                Some(state) => {
                    warn!(
                        participant = %participant_id,
                        status = state.status.as_str(),
                        "stop requested but recording not active"
                    );
                    return false;
                }
                None => {
                    warn!(participant = %participant_id, "stop requested but no recording found");
                    return false;
                }
            }
        };

        if let Some(job_id) = job_id {
            if let Err(e) = self.egress.stop_job(&job_id).await {
                // The poller resolves the job's true fate on its next tick.
                warn!(participant = %participant_id, job = %job_id, "egress stop request failed: {}", e);
            }
        }

        info!(participant = %participant_id, "recording stop requested");
        true
    }

    pub async fn status(&self, participant_id: &str) -> Option<RecordingState> {
        self.states.read().await.get(participant_id).cloned()
    }

    /// All known recordings, historical and active.
    pub async fn status_all(&self) -> HashMap<String, RecordingState> {
        self.states.read().await.clone()
    }

    /// Feed one validated chunk through the pipeline: buffer it, update
    /// counters, mirror it to observers, and flush a segment once the
    /// buffered duration crosses the threshold.
    ///
    /// Per-chunk failures are logged and contained here; nothing propagates
    /// back to the ingress connection.
    pub async fn ingest_chunk(&self, chunk: AudioChunk) {
        let participant_id = chunk.participant_id.clone();
        let duration = chunk.duration_seconds();
        let buffer = self.buffer(&participant_id).await;

        let (accepted, buffered_secs) = {
            let mut buffer = buffer.lock().await;
            let accepted = buffer.append(chunk.clone());
            (accepted, buffer.duration())
        };

        if !accepted {
            return;
        }

        {
            let mut states = self.states.write().await;
            if let Some(state) = states.get_mut(&participant_id) {
                if !state.status.is_terminal() {
                    state.chunks_received += 1;
                    state.accumulated_duration_seconds += duration;
                    if state.chunks_received % 100 == 0 {
                        info!(
                            participant = %participant_id,
                            chunks = state.chunks_received,
                            duration_secs = format!("{:.2}", state.accumulated_duration_seconds),
                            "recording progress"
                        );
                    }
                }
            }
        }

        self.hub.publish(&chunk).await;

        if buffered_secs >= self.config.flush_threshold_secs {
            if let Err(e) = self.flush(&participant_id).await {
                // Buffered audio was retained; the next threshold crossing retries.
                error!(participant = %participant_id, "segment flush failed: {}", e);
            }
        }
    }

    /// Drain the participant's buffer and upload one WAV segment.
    ///
    /// The drained snapshot is handed off before any blocking storage call;
    /// on upload failure it is restored to the front of the buffer so no
    /// audio is lost. Returns the uploaded object key, or `None` when there
    /// was nothing to flush.
    pub async fn flush(&self, participant_id: &str) -> Result<Option<String>, RecordingError> {
        let buffer = match self.buffers.read().await.get(participant_id).cloned() {
            Some(buffer) => buffer,
            None => return Ok(None),
        };

        let snapshot = { buffer.lock().await.drain() };
        if snapshot.is_empty() {
            return Ok(None);
        }

        let first_seq = snapshot[0].sequence_number;
        let last_seq = snapshot[snapshot.len() - 1].sequence_number;

        let bytes = match encode_wav(&snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                buffer.lock().await.restore(snapshot);
                return Err(e);
            }
        };

        let key = segment_key(
            &self.config.room,
            participant_id,
            first_seq,
            last_seq,
            Utc::now(),
        );

        match self
            .storage
            .put(&self.config.bucket, &key, bytes, WAV_CONTENT_TYPE)
            .await
        {
            Ok(()) => {
                info!(
                    participant = %participant_id,
                    key = %key,
                    chunks = snapshot.len(),
                    "segment flushed to storage"
                );
                Ok(Some(key))
            }
            Err(e) => {
                buffer.lock().await.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Finalize a participant's recording: flush any remaining buffered
    /// audio synchronously, then mark the state terminal. Shared by explicit
    /// stop confirmation, `track_ended` and abrupt disconnect. Idempotent
    /// once the state is terminal.
    pub async fn finalize(&self, participant_id: &str) {
        let flushed = self.flush(participant_id).await;

        let mut states = self.states.write().await;
        let state = match states.get_mut(participant_id) {
            Some(state) => state,
            None => return,
        };
        if state.status.is_terminal() {
            return;
        }

        match &flushed {
            Ok(_) => {
                let next = match state.status {
                    RecordingStatus::Pending => RecordingStatus::Failed,
                    _ => RecordingStatus::Completed,
                };
                state.advance(next);
                info!(
                    participant = %participant_id,
                    status = state.status.as_str(),
                    chunks = state.chunks_received,
                    duration_secs = format!("{:.2}", state.accumulated_duration_seconds),
                    "recording finalized"
                );
            }
            Err(e) => {
                error!(participant = %participant_id, "finalization flush failed: {}", e);
                state.advance(RecordingStatus::Failed);
            }
        }
    }

    /// One reconciliation pass against the egress job list.
    ///
    /// The external list is authoritative: a tracked job reported failed, or
    /// absent after having been previously observed, moves the local state
    /// to `failed`; a job reported complete triggers finalization.
    pub async fn poll_once(&self) -> Result<(), RecordingError> {
        let tracked: Vec<(String, String)> = {
            let states = self.states.read().await;
            states
                .values()
                .filter(|s| {
                    matches!(
                        s.status,
                        RecordingStatus::Recording | RecordingStatus::Stopping
                    )
                })
                .filter_map(|s| {
                    s.job_id
                        .as_ref()
                        .map(|job| (s.participant_id.clone(), job.clone()))
                })
                .collect()
        };

        if tracked.is_empty() {
            return Ok(());
        }

        let jobs = self.egress.list_job_statuses().await?;
        let by_id: HashMap<&str, &crate::egress::EgressJobStatus> =
            jobs.iter().map(|j| (j.job_id.as_str(), j)).collect();

        for (participant_id, job_id) in tracked {
            match by_id.get(job_id.as_str()) {
                Some(job) => {
                    {
                        let mut states = self.states.write().await;
                        if let Some(state) = states.get_mut(&participant_id) {
                            state.job_observed = true;
                        }
                    }
                    match job.state {
                        EgressJobState::Starting | EgressJobState::Active => {}
                        EgressJobState::Complete => {
                            info!(participant = %participant_id, job = %job_id, "egress job completed");
                            self.finalize(&participant_id).await;
                        }
                        EgressJobState::Failed => {
                            error!(
                                participant = %participant_id,
                                job = %job_id,
                                error = job.error.as_deref().unwrap_or("unknown"),
                                "egress job failed"
                            );
                            self.mark_failed(&participant_id).await;
                        }
                    }
                }
                None => {
                    let observed = {
                        let states = self.states.read().await;
                        states
                            .get(&participant_id)
                            .map(|s| s.job_observed)
                            .unwrap_or(false)
                    };
                    if observed {
                        warn!(
                            participant = %participant_id,
                            job = %job_id,
                            "job disappeared from egress list, marking failed"
                        );
                        self.mark_failed(&participant_id).await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Spawn the periodic reconciliation task. Runs until `shutdown`.
    pub fn spawn_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(supervisor.config.poll_interval);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                if supervisor.shutting_down.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = supervisor.poll_once().await {
                    // Retried naturally on the next tick.
                    warn!("egress status poll failed: {}", e);
                }
            }
            info!("egress status poller stopped");
        })
    }

    /// Stop every live egress job, then finalize every non-terminal
    /// recording with a bounded per-participant timeout, marking stragglers
    /// failed rather than leaving them `recording` forever. The poller
    /// stops on its next tick.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        let active: Vec<String> = {
            let states = self.states.read().await;
            states
                .values()
                .filter(|s| !s.status.is_terminal())
                .map(|s| s.participant_id.clone())
                .collect()
        };

        info!(recordings = active.len(), "shutting down recording supervisor");

        for participant_id in &active {
            // Recordings in `stopping` have already had their stop requested.
            let is_recording = {
                let states = self.states.read().await;
                states
                    .get(participant_id)
                    .map(|s| s.status == RecordingStatus::Recording)
                    .unwrap_or(false)
            };
            if is_recording {
                self.stop(participant_id).await;
            }
        }

        for participant_id in active {
            match tokio::time::timeout(
                self.config.finalize_timeout,
                self.finalize(&participant_id),
            )
            .await
            {
                Ok(()) => {}
                Err(_) => {
                    error!(
                        participant = %participant_id,
                        "finalization timed out during shutdown, marking failed"
                    );
                    self.mark_failed(&participant_id).await;
                }
            }
        }
    }

    async fn mark_failed(&self, participant_id: &str) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(participant_id) {
            if !state.status.is_terminal() {
                state.advance(RecordingStatus::Failed);
            }
        }
    }

    /// Get or create the shared buffer for a participant.
    async fn buffer(&self, participant_id: &str) -> Arc<Mutex<ChunkBuffer>> {
        {
            let buffers = self.buffers.read().await;
            if let Some(buffer) = buffers.get(participant_id) {
                return Arc::clone(buffer);
            }
        }
        let mut buffers = self.buffers.write().await;
        Arc::clone(
            buffers
                .entry(participant_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(ChunkBuffer::new()))),
        )
    }

    /// Number of chunks currently buffered for a participant. Test hook.
    pub async fn buffered_chunks(&self, participant_id: &str) -> usize {
        match self.buffers.read().await.get(participant_id) {
            Some(buffer) => buffer.lock().await.len(),
            None => 0,
        }
    }
}
