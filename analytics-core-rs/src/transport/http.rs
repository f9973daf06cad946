//! reqwest-backed transport

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client};

use super::Transport;
use crate::constants::DEFAULT_TIMEOUT_SECONDS;
use crate::diagnostic::RequestPayload;
use crate::error::{mapping, DiagnosticError, Result};

/// UserAgent structure for identifying the reporter to the collector
#[derive(Debug, Clone)]
pub struct UserAgent {
    pub app_name: String,
    pub version: String,
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "Phoenix-ORCH".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("analytics-core".to_string()),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Sends diagnostic payloads over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    /// Build a transport with the default user agent and timeout
    pub fn new() -> Result<Self> {
        Self::with_options(None, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
    }

    pub fn with_options(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Self> {
        let ua = user_agent.unwrap_or_default().to_string();

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&ua)
                .map_err(|e| DiagnosticError::configuration(format!("Invalid user agent: {}", e)))?,
        );

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(timeout.unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .gzip(true)
            .build()
            .map_err(|e| DiagnosticError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Reuse an existing reqwest client
    pub fn from_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &str, payload: &RequestPayload) -> Result<()> {
        let body = serde_json::to_string(&payload.events)?;
        debug!(
            "Sending {} diagnostic events: {} {} ({} bytes)",
            payload.events.len(),
            payload.method.as_str(),
            url,
            body.len()
        );

        let start_time = Instant::now();
        let response = self
            .http_client
            .request(payload.method.into(), url)
            .header(header::CONTENT_TYPE, payload.headers.content_type.as_str())
            .header(header::ACCEPT, payload.headers.accept.as_str())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Diagnostic collector answered {} in {:?}", status, start_time.elapsed());
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("Failed to read error response: {}", e),
        };

        Err(mapping::map_http_error(status, &body, url))
    }
}
