//! Error mapping for collector responses
//!
//! Converts non-2xx responses from the diagnostic collector into our
//! normalized DiagnosticError type.

use reqwest::StatusCode;
use serde_json::Value;

use super::{DiagnosticError, ErrorContext};

/// Map a non-success collector response to a DiagnosticError
pub fn map_http_error(status: StatusCode, body: &str, endpoint: &str) -> DiagnosticError {
    // Collectors usually answer with {"error": "..."} or {"message": "..."}
    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("error")
            .or_else(|| json.get("message"))
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| status.to_string()),
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) if body.len() > 100 => format!("{}: {:.100}...", status, body),
        Err(_) => format!("{}: {}", status, body),
    };

    let error = match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => DiagnosticError::validation(message),
        StatusCode::PAYLOAD_TOO_LARGE => {
            DiagnosticError::validation(format!("Payload too large: {}", message))
        }
        StatusCode::TOO_MANY_REQUESTS => DiagnosticError::rate_limit(message),
        s if s.is_server_error() => DiagnosticError::server(message),
        _ => DiagnosticError::service(message),
    };

    error.with_context(ErrorContext::for_endpoint(endpoint).status_code(status.as_u16()))
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        408 => "timeout",
        413 => "payload_too_large",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}
