//! # Analytics Core
//!
//! Shared analytics plumbing for the Phoenix ORCH project.
//!
//! This crate provides:
//!
//! - `Diagnostic`: a batching reporter for delivery-failure diagnostics
//! - `DestinationPlugin`: the generic plugin dispatch interface
//! - `Transport` / `HttpTransport`: pluggable delivery of request payloads
//! - Configuration management and a unified error type
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> analytics_core::Result<()> {
//! let diagnostic = analytics_core::Diagnostic::with_server_url("https://collector.example.com")?;
//! diagnostic.track(5, 429, "exceeded daily quota", Some("drop events"));
//! diagnostic.flush().await;
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub use constants::{DEFAULT_FLUSH_DELAY_MS, DIAGNOSTIC_ENDPOINT};

// Re-export core modules
pub mod core;
pub use crate::core::{DestinationPlugin, Event, PluginResult, PluginType};

pub mod diagnostic;
pub use diagnostic::{
    Diagnostic, DiagnosticBuilder, DiagnosticEvent, DiagnosticStats, EventProperties, RequestPayload,
};

pub mod transport;
pub use transport::{HttpTransport, Transport};

// Re-export error handling
pub mod error;
pub use error::{DiagnosticError, ErrorContext, Result};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, DiagnosticConfig};

#[cfg(test)]
mod tests;
