//! Async extraction with polling, for large documents
//!
//! Run with:
//!     AUTOFILLER_API_KEY=... cargo run --example async_extraction -- ./large-document.pdf

use std::time::Duration;

use autofiller_client::{
    AutofillerClient, CancellationToken, ExtractOptions, FileInput, JobState, WaitOptions,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./large-document.pdf".to_string());
    let client = AutofillerClient::from_env()?;

    let job = client
        .extract_async(
            FileInput::path(&path),
            &ExtractOptions::new().with_domain_pack("tax-w2"),
        )
        .await?;
    println!("Job ID: {}", job.job_id);
    println!(
        "Estimated time: {}",
        job.estimated_time_seconds
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "unknown".to_string())
    );

    // Manual polling: one status check to show progress
    let status = client.get_job(&job.job_id).await?;
    println!(
        "Status: {} ({:.0}%)",
        status.status,
        status.progress.unwrap_or(0.0)
    );
    if status.status == JobState::Failed {
        println!("Failed: {:?}", status.error);
        return Ok(());
    }

    // Built-in polling, cancellable with Ctrl-C
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let wait = WaitOptions::new()
        .with_poll_interval(Duration::from_secs(2))
        .with_max_wait(Duration::from_secs(300))
        .with_cancellation(cancel);
    let result = client.wait_for_job(&job.job_id, &wait).await?;

    println!("\n=== Extraction Complete ===");
    println!("Status: {:?}", result.status);
    for (key, value) in &result.data {
        println!("  {}: {}", key, value);
    }

    Ok(())
}
