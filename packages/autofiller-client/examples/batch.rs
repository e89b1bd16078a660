//! Batch processing of every PDF in a directory
//!
//! Run with:
//!     AUTOFILLER_API_KEY=... cargo run --example batch -- ./invoices

use autofiller_client::{AutofillerClient, ExtractOptions, FileInput};
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

    let dir = std::env::args().nth(1).unwrap_or_else(|| "./invoices".to_string());
    let client = AutofillerClient::from_env()?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")) {
            files.push(FileInput::path(path));
        }
    }
    println!("Found {} documents to process\n", files.len());

    let report = client
        .extract_batch(
            files,
            &ExtractOptions::new().with_domain_pack("invoice-standard"),
            3,
        )
        .await;

    for item in &report.items {
        match &item.outcome {
            Ok(result) => println!("  ok   {} - {} fields extracted", item.label, result.data.len()),
            Err(e) => println!("  fail {} - {}", item.label, e),
        }
    }

    println!(
        "\nSucceeded: {}, failed: {}",
        report.succeeded(),
        report.failed()
    );

    let output: Vec<_> = report
        .results()
        .map(|r| serde_json::json!({"id": r.id, "data": r.data}))
        .collect();
    std::fs::write("batch_results.json", serde_json::to_string_pretty(&output)?)?;
    println!("Results written to batch_results.json");

    Ok(())
}
