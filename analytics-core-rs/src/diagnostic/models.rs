//! Diagnostic wire models
//!
//! Field names are part of the collector contract and must not change.

use serde::{Deserialize, Serialize};

/// Summary of one group of failed deliveries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventProperties {
    /// HTTP status returned for the summarized events
    pub response_error_code: i32,

    /// Free-text reason
    pub trigger: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Number of underlying occurrences
    pub event_count: u64,
}

/// One unit of diagnostic telemetry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    /// Milliseconds since the Unix epoch, assigned at enqueue
    pub time: i64,

    pub event_properties: EventProperties,

    pub library: String,
}

/// Fixed headers sent with every diagnostic request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadHeaders {
    #[serde(rename = "Content-Type")]
    pub content_type: String,

    #[serde(rename = "Accept")]
    pub accept: String,
}

impl Default for PayloadHeaders {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            accept: "*/*".to_string(),
        }
    }
}

/// The only verb the collector accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    #[serde(rename = "POST")]
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Outbound request for one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub headers: PayloadHeaders,
    pub events: Vec<DiagnosticEvent>,
    pub method: HttpMethod,
}

impl RequestPayload {
    /// Wrap a batch verbatim, preserving order
    pub fn new(events: Vec<DiagnosticEvent>) -> Self {
        Self {
            headers: PayloadHeaders::default(),
            events,
            method: HttpMethod::Post,
        }
    }
}
