//! Basic synchronous extraction example
//!
//! Run with:
//!     AUTOFILLER_API_KEY=... cargo run --example basic -- ./invoice.pdf

use autofiller_client::{AutofillerClient, ExtractOptions, FileInput};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,autofiller_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "./invoice.pdf".to_string());
    let client = AutofillerClient::from_env()?;

    println!("=== Health ===");
    let health = client.health().await?;
    println!("{} (version {})", health.status, health.version);

    println!("\n=== Extraction ===");
    let result = client
        .extract(
            FileInput::path(&path),
            &ExtractOptions::new()
                .with_domain_pack("invoice-standard")
                .with_confidence(true),
        )
        .await?;

    println!("Status: {:?} via {}", result.status, result.domain_pack);
    for (field, value) in &result.data {
        match result.confidence_for(field) {
            Some(confidence) => println!("  {}: {} ({:.0}%)", field, value, confidence * 100.0),
            None => println!("  {}: {}", field, value),
        }
    }
    for warning in result.warnings.iter().flatten() {
        println!("  warning: {}", warning);
    }

    Ok(())
}
