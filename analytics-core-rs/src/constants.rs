//! Shared constants for the analytics core

/// Default collection endpoint for diagnostic events
pub const DIAGNOSTIC_ENDPOINT: &str = "https://api-diagnostics.phoenix-orch.example.com/v1/diagnostics";

/// Delay between the first queued diagnostic event and the automatic flush
pub const DEFAULT_FLUSH_DELAY_MS: u64 = 60_000;

/// Library identifier stamped on diagnostic events
pub const DEFAULT_LIBRARY: &str = concat!("analytics-core-rs/", env!("CARGO_PKG_VERSION"));

/// HTTP transport timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Message returned by plugins that do not accept events through `execute`
pub const UNSUPPORTED_EXECUTE_MESSAGE: &str = "this method should not be called, use track() instead";

/// Event type reported alongside the unsupported `execute` result
pub const DIAGNOSTIC_EVENT_TYPE: &str = "diagnostic event";
