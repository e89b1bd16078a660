//! Drives an async job to a terminal state.
//!
//! One wait call runs one poll loop: fetch the status, stop on `completed` or
//! `failed`, otherwise sleep and fetch again. Requests never overlap within a
//! loop. The overall deadline starts at the first poll and is independent of
//! the per-request timeout.

use async_trait::async_trait;
use std::future::Future;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::WaitOptions;
use crate::error::{AutofillerError, Result};
use crate::types::extraction::ExtractionResult;
use crate::types::job::{JobError, JobState, JobStatus};

/// Anything that can report a job's current status.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch_job(&self, job_id: &str) -> Result<JobStatus>;
}

/// Poll `job_id` until it completes, fails, the wait times out, or the caller cancels.
pub async fn wait_for_job<S>(
    source: &S,
    job_id: &str,
    options: &WaitOptions,
) -> Result<ExtractionResult>
where
    S: JobSource + ?Sized,
{
    let cancel = options.cancel.as_ref();
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        let job = until_cancelled(cancel, source.fetch_job(job_id)).await??;

        match job.status {
            JobState::Completed => {
                info!(job_id, polls, "Job completed");
                return job.result.ok_or_else(|| {
                    AutofillerError::protocol(format!(
                        "Job {} completed without a result",
                        job_id
                    ))
                });
            }
            JobState::Failed => {
                info!(job_id, polls, "Job failed");
                return Err(job_failure(job.error));
            }
            JobState::Pending | JobState::Processing => {
                debug!(
                    job_id,
                    status = %job.status,
                    progress = ?job.progress,
                    polls,
                    "Job still running"
                );
            }
        }

        let remaining = options.max_wait.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(job_timeout(job_id, polls));
        }

        until_cancelled(cancel, tokio::time::sleep(options.poll_interval.min(remaining))).await?;

        if started.elapsed() >= options.max_wait {
            return Err(job_timeout(job_id, polls));
        }
    }
}

fn job_failure(error: Option<JobError>) -> AutofillerError {
    let error = error.unwrap_or_default();
    AutofillerError::Extraction {
        code: error.code.unwrap_or_else(|| "job_failed".to_string()),
        message: error.message.unwrap_or_else(|| "Job failed".to_string()),
    }
}

fn job_timeout(job_id: &str, polls: u32) -> AutofillerError {
    info!(job_id, polls, "Gave up waiting for job");
    AutofillerError::api("job_timeout", "Job timed out waiting for completion")
}

async fn until_cancelled<F: Future>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Result<F::Output> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(AutofillerError::Cancelled {
                message: "Wait for job was cancelled".to_string(),
            }),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}
