use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RecordingError;

use super::client::{EgressClient, EgressJobStatus};

#[derive(Debug, Serialize)]
struct SubmitJobRequest<'a> {
    room: &'a str,
    track_id: &'a str,
    stream_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitJobResponse {
    job_id: String,
}

#[derive(Debug, Serialize)]
struct StopJobRequest<'a> {
    job_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListJobsResponse {
    jobs: Vec<EgressJobStatus>,
}

/// JSON-over-HTTP implementation of [`EgressClient`] against the media
/// provider's egress control API.
pub struct HttpEgressClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEgressClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl EgressClient for HttpEgressClient {
    async fn submit_recording_job(
        &self,
        room: &str,
        track_id: &str,
        stream_url: &str,
    ) -> Result<String, RecordingError> {
        let response = self
            .client
            .post(self.url("/egress/start"))
            .json(&SubmitJobRequest {
                room,
                track_id,
                stream_url,
            })
            .send()
            .await
            .map_err(|e| RecordingError::Egress(format!("submit request failed: {e}")))?
            .error_for_status()
            .map_err(|e| RecordingError::Egress(format!("submit rejected: {e}")))?;

        let body: SubmitJobResponse = response
            .json()
            .await
            .map_err(|e| RecordingError::Egress(format!("invalid submit response: {e}")))?;

        info!(room = %room, track = %track_id, job = %body.job_id, "egress job submitted");
        Ok(body.job_id)
    }

    async fn stop_job(&self, job_id: &str) -> Result<(), RecordingError> {
        self.client
            .post(self.url("/egress/stop"))
            .json(&StopJobRequest { job_id })
            .send()
            .await
            .map_err(|e| RecordingError::Egress(format!("stop request failed: {e}")))?
            .error_for_status()
            .map_err(|e| RecordingError::Egress(format!("stop rejected: {e}")))?;

        info!(job = %job_id, "egress job stop requested");
        Ok(())
    }

    async fn list_job_statuses(&self) -> Result<Vec<EgressJobStatus>, RecordingError> {
        let response = self
            .client
            .get(self.url("/egress/jobs"))
            .send()
            .await
            .map_err(|e| RecordingError::Egress(format!("list request failed: {e}")))?
            .error_for_status()
            .map_err(|e| RecordingError::Egress(format!("list rejected: {e}")))?;

        let body: ListJobsResponse = response
            .json()
            .await
            .map_err(|e| RecordingError::Egress(format!("invalid list response: {e}")))?;

        Ok(body.jobs)
    }
}
