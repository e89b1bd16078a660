//! Batch extraction with bounded concurrency.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::client::AutofillerClient;
use crate::error::Result;
use crate::types::extraction::ExtractionResult;
use crate::upload::{ExtractOptions, FileInput};

/// Outcome for one file in a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// Position of the file in the input
    pub index: usize,

    /// Human-readable label (path or filename)
    pub label: String,

    pub outcome: Result<ExtractionResult>,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Results of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn results(&self) -> impl Iterator<Item = &ExtractionResult> {
        self.items.iter().filter_map(|i| i.outcome.as_ref().ok())
    }
}

impl AutofillerClient {
    /// Extract many documents, at most `concurrency` at a time.
    ///
    /// One failing file does not stop the others; each outcome is reported
    /// separately.
    pub async fn extract_batch(
        &self,
        files: Vec<FileInput>,
        options: &ExtractOptions,
        concurrency: usize,
    ) -> BatchReport {
        let total = files.len();
        info!(total, concurrency, "Starting batch extraction");

        let mut items: Vec<BatchItem> = stream::iter(files.into_iter().enumerate())
            .map(|(index, file)| async move {
                let label = file.describe();
                let outcome = self.extract(file, options).await;
                if let Err(e) = &outcome {
                    warn!(file = %label, error = %e, "Batch item failed");
                }
                BatchItem {
                    index,
                    label,
                    outcome,
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        items.sort_by_key(|item| item.index);

        let report = BatchReport { items };
        info!(
            total,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch extraction finished"
        );
        report
    }
}
