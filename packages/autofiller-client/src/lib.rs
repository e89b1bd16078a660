//! Client for the hosted Autofiller document extraction API.
//!
//! Uploads documents, drives async extraction jobs to completion, and turns
//! API payloads and failures into typed Rust values.
//!
//! # Example
//!
//! ```rust,ignore
//! use autofiller_client::{AutofillerClient, ExtractOptions, FileInput, WaitOptions};
//!
//! let client = AutofillerClient::from_env()?;
//!
//! // Small document: synchronous extraction
//! let result = client
//!     .extract(
//!         FileInput::path("./invoice.pdf"),
//!         &ExtractOptions::new().with_domain_pack("invoice-standard"),
//!     )
//!     .await?;
//! println!("{:?}", result.data);
//!
//! // Large document: submit a job and poll until it finishes
//! let job = client
//!     .extract_async(FileInput::path("./w2-batch.pdf"), &ExtractOptions::default())
//!     .await?;
//! let result = client.wait_for_job(&job.job_id, &WaitOptions::default()).await?;
//! ```
//!
//! # Errors
//!
//! Every failure is an [`AutofillerError`]. Match on the variant (or
//! [`AutofillerError::kind`]) rather than the message:
//!
//! ```rust,ignore
//! match client.extract(file, &options).await {
//!     Err(AutofillerError::RateLimit { .. }) => back_off().await,
//!     Err(e) => eprintln!("{} ({})", e.message(), e.code()),
//!     Ok(result) => handle(result),
//! }
//! ```
//!
//! # Modules
//!
//! - [`client`] - The API client
//! - [`upload`] - File inputs and multipart request assembly
//! - [`transport`] - Authenticated HTTP requests and retries
//! - [`poller`] - Async job polling
//! - [`types`] - Normalized API data model
//! - [`testing`] - Scripted job source for tests

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
mod security;
pub mod testing;
pub mod transport;
pub mod types;
pub mod upload;

pub use batch::{BatchItem, BatchReport};
pub use client::AutofillerClient;
pub use config::{ClientConfig, WaitOptions};
pub use error::{classify, AutofillerError, ErrorKind, Result};
pub use poller::{wait_for_job, JobSource};
pub use types::{
    domain_pack::{DomainPack, RoutingHints},
    extraction::{BoundingBox, ExtractionMetadata, ExtractionResult, ExtractionStatus},
    health::HealthStatus,
    job::{JobError, JobHandle, JobState, JobStatus},
};
pub use upload::{ExtractOptions, FileInput};

// Re-exported so callers don't need direct tokio-util or secrecy dependencies.
pub use secrecy::{ExposeSecret, SecretString};
pub use tokio_util::sync::CancellationToken;
