//! Diagnostic Reporter Example
//!
//! Tracks a few delivery-failure summaries and lets the flush timer ship
//! them, then flushes a second batch manually.
//!
//! To run this example:
//! ```
//! ANALYTICS_DIAGNOSTIC_SERVER_URL=http://localhost:8080/diagnostics \
//! ANALYTICS_DIAGNOSTIC_FLUSH_DELAY_MS=2000 \
//! RUST_LOG=debug cargo run --example diagnostic_demo
//! ```

use std::time::Duration;

use analytics_core::{DestinationPlugin, Diagnostic, Event};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let diagnostic = Diagnostic::builder().library("diagnostic-demo").build()?;

    println!("Diagnostic Reporter Example");
    println!("Collector: {}", diagnostic.server_url());
    println!("Flush delay: {:?}\n", diagnostic.flush_delay());

    diagnostic.track(12, 429, "exceeded daily quota", Some("drop events"));
    diagnostic.track(3, 500, "server error", None);
    println!("Queued {} events, flush scheduled: {}", diagnostic.queue_len(), diagnostic.is_flush_scheduled());

    tokio::time::sleep(diagnostic.flush_delay() + Duration::from_millis(250)).await;
    println!("After timer: {} events queued, stats: {:?}", diagnostic.queue_len(), diagnostic.stats());

    diagnostic.track(1, 413, "payload too large", Some("drop events"));
    diagnostic.flush().await;
    println!("After manual flush: stats: {:?}", diagnostic.stats());

    let result = diagnostic.execute(&Event::new("custom event")).await;
    println!("execute() -> code {}: {}", result.code, result.message);

    Ok(())
}
