//! Async extraction jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::extraction::ExtractionResult;
use super::{decode, parse_optional_timestamp};
use crate::error::Result;

/// Server-side state of an async job.
///
/// `Completed` and `Failed` are terminal: a job never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by async submission. Only used to look the job up later.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobHandle {
    pub job_id: String,

    #[serde(default = "pending")]
    pub status: JobState,

    /// Server estimate of how long the job will take
    #[serde(default)]
    pub estimated_time_seconds: Option<u64>,
}

fn pending() -> JobState {
    JobState::Pending
}

impl JobHandle {
    pub(crate) fn from_wire(value: Value) -> Result<Self> {
        decode(value, "job submission")
    }
}

/// Error details attached to a failed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One snapshot of a job's status.
///
/// Each poll yields a fresh snapshot; snapshots are never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub job_id: String,
    pub status: JobState,

    /// Progress percentage (0-100)
    pub progress: Option<f64>,

    /// Present when the job completed
    pub result: Option<ExtractionResult>,

    /// Present when the job failed
    pub error: Option<JobError>,

    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireJobStatus {
    job_id: String,
    status: JobState,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JobError>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    completed_at: Option<String>,
}

impl JobStatus {
    pub(crate) fn from_wire(value: Value) -> Result<Self> {
        let wire: WireJobStatus = decode(value, "job status")?;

        let result = match wire.result {
            Some(Value::Null) | None => None,
            Some(raw) => Some(ExtractionResult::from_wire(raw)?),
        };

        Ok(Self {
            job_id: wire.job_id,
            status: wire.status,
            progress: wire.progress,
            result,
            error: wire.error,
            created_at: parse_optional_timestamp(wire.created_at.as_deref(), "created_at")?,
            completed_at: parse_optional_timestamp(wire.completed_at.as_deref(), "completed_at")?,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
