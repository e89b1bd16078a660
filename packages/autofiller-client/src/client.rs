//! The Autofiller API client.

use async_trait::async_trait;
use tracing::info;

use crate::config::{ClientConfig, WaitOptions};
use crate::error::{AutofillerError, Result};
use crate::poller::{self, JobSource};
use crate::transport::{ApiRequest, HttpTransport};
use crate::types::domain_pack::DomainPack;
use crate::types::extraction::ExtractionResult;
use crate::types::health::HealthStatus;
use crate::types::job::{JobHandle, JobStatus};
use crate::upload::{ExtractOptions, FileInput, Upload, UploadKind};

/// Client for the hosted Autofiller extraction API.
///
/// Cheap to clone; clones share the connection pool and the immutable config.
/// No background tasks are spawned: every call does its work inline and can be
/// cancelled by dropping its future.
#[derive(Debug, Clone)]
pub struct AutofillerClient {
    transport: HttpTransport,
}

impl AutofillerClient {
    /// Create a client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(api_key)?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    /// Create from `AUTOFILLER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    /// Check API health. Does not send the API key.
    pub async fn health(&self) -> Result<HealthStatus> {
        let body = self
            .transport
            .send_idempotent(|| ApiRequest::get(["health"]).unauthenticated())
            .await?;
        HealthStatus::from_wire(body)
    }

    /// Extract data from a document and wait for the response.
    ///
    /// Best for small documents. Use [`extract_async`](Self::extract_async)
    /// for large ones.
    pub async fn extract(
        &self,
        file: FileInput,
        options: &ExtractOptions,
    ) -> Result<ExtractionResult> {
        let upload = Upload::prepare(file, options, UploadKind::Sync).await?;
        info!(
            filename = upload.filename(),
            domain_pack = ?options.domain_pack,
            "Submitting extraction"
        );

        let body = self
            .transport
            .send(ApiRequest::post_multipart(["extract"], upload.into_form()?))
            .await?;
        ExtractionResult::from_wire(body)
    }

    /// Start an async extraction job.
    pub async fn extract_async(
        &self,
        file: FileInput,
        options: &ExtractOptions,
    ) -> Result<JobHandle> {
        let upload = Upload::prepare(file, options, UploadKind::Async).await?;
        let filename = upload.filename().to_string();

        let body = self
            .transport
            .send(ApiRequest::post_multipart(
                ["extract", "async"],
                upload.into_form()?,
            ))
            .await?;
        let handle = JobHandle::from_wire(body)?;

        info!(
            job_id = %handle.job_id,
            filename = %filename,
            estimated_time_seconds = ?handle.estimated_time_seconds,
            "Extraction job submitted"
        );
        Ok(handle)
    }

    /// Fetch the current status of a job.
    pub async fn get_job(&self, job_id: &str) -> Result<JobStatus> {
        if job_id.trim().is_empty() {
            return Err(AutofillerError::validation("job_id is required"));
        }

        let body = self
            .transport
            .send_idempotent(|| ApiRequest::get(["jobs", job_id]))
            .await?;
        JobStatus::from_wire(body)
    }

    /// Poll a job until it finishes and return its result.
    ///
    /// Fails with code `job_timeout` if `options.max_wait` elapses first.
    /// Webhook delivery, if configured, is independent of this wait.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        options: &WaitOptions,
    ) -> Result<ExtractionResult> {
        poller::wait_for_job(self, job_id, options).await
    }

    /// Submit an async job and wait for its result.
    pub async fn extract_and_wait(
        &self,
        file: FileInput,
        options: &ExtractOptions,
        wait: &WaitOptions,
    ) -> Result<ExtractionResult> {
        let handle = self.extract_async(file, options).await?;
        self.wait_for_job(&handle.job_id, wait).await
    }

    /// List all available domain packs.
    pub async fn list_domain_packs(&self) -> Result<Vec<DomainPack>> {
        let body = self
            .transport
            .send_idempotent(|| ApiRequest::get(["domain-packs"]))
            .await?;
        DomainPack::list_from_wire(body)
    }

    /// Get one domain pack with its schema.
    pub async fn get_domain_pack(&self, name: &str) -> Result<DomainPack> {
        if name.trim().is_empty() {
            return Err(AutofillerError::validation("domain pack name is required"));
        }

        let body = self
            .transport
            .send_idempotent(|| ApiRequest::get(["domain-packs", name]))
            .await?;
        DomainPack::from_wire(body)
    }
}

#[async_trait]
impl JobSource for AutofillerClient {
    async fn fetch_job(&self, job_id: &str) -> Result<JobStatus> {
        self.get_job(job_id).await
    }
}
