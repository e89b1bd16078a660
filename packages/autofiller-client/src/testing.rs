//! Testing utilities.
//!
//! Useful for testing code that waits on Autofiller jobs without making real
//! network calls.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{AutofillerError, Result};
use crate::poller::JobSource;
use crate::types::extraction::{ExtractionMetadata, ExtractionResult, ExtractionStatus};
use crate::types::job::{JobError, JobState, JobStatus};

/// A job source that replays a fixed script of responses.
///
/// Each `fetch_job` call takes the next scripted response. Once the script
/// runs out, the last response is repeated.
#[derive(Default, Clone)]
pub struct ScriptedJobSource {
    script: Arc<Mutex<VecDeque<Result<JobStatus>>>>,
    last: Arc<Mutex<Option<Result<JobStatus>>>>,

    /// Call tracking for assertions
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedJobSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a status snapshot.
    pub fn then(self, job: JobStatus) -> Self {
        self.script.lock().unwrap().push_back(Ok(job));
        self
    }

    /// Queue a failed poll.
    pub fn then_error(self, err: AutofillerError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    /// Number of `fetch_job` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Job IDs requested, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSource for ScriptedJobSource {
    async fn fetch_job(&self, job_id: &str) -> Result<JobStatus> {
        self.calls.lock().unwrap().push(job_id.to_string());

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last.clone().unwrap_or_else(|| {
                Err(AutofillerError::api(
                    "not_found",
                    format!("No scripted status for job {}", job_id),
                ))
            }),
        }
    }
}

/// A pending or processing snapshot.
pub fn running_job(job_id: &str, status: JobState, progress: Option<f64>) -> JobStatus {
    JobStatus {
        job_id: job_id.to_string(),
        status,
        progress,
        result: None,
        error: None,
        created_at: None,
        completed_at: None,
    }
}

/// A completed snapshot with a minimal embedded result.
pub fn completed_job(job_id: &str, extraction_id: &str) -> JobStatus {
    JobStatus {
        status: JobState::Completed,
        progress: Some(100.0),
        result: Some(sample_result(extraction_id)),
        ..running_job(job_id, JobState::Completed, None)
    }
}

/// A failed snapshot.
pub fn failed_job(job_id: &str, error: Option<JobError>) -> JobStatus {
    JobStatus {
        error,
        ..running_job(job_id, JobState::Failed, None)
    }
}

/// A small completed extraction result.
pub fn sample_result(extraction_id: &str) -> ExtractionResult {
    let mut data = Map::new();
    data.insert("document_type".to_string(), Value::from("invoice"));

    ExtractionResult {
        id: extraction_id.to_string(),
        status: ExtractionStatus::Completed,
        domain_pack: "invoice-standard".to_string(),
        data,
        confidence: None,
        bounding_boxes: None,
        metadata: ExtractionMetadata::default(),
        warnings: None,
    }
}
