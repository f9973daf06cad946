//! Error handling for the analytics core
//!
//! Errors only surface from construction, configuration and the transport's
//! own `send`. Tracking and flushing swallow them.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod mapping;

/// Result type for analytics core operations
pub type Result<T> = std::result::Result<T, DiagnosticError>;

/// Main error type for the analytics core
#[derive(Error, Debug)]
pub enum DiagnosticError {
    /// Network or connection errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Payload rejected by the collector
    #[error("Validation error: {0}")]
    Validation(String),

    /// Collector is throttling us
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Collector-side failure (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// Any other unexpected collector response
    #[error("Service error: {0}")]
    Service(String),

    /// Payload (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected or internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<DiagnosticError>,
        context: ErrorContext,
    },
}

impl DiagnosticError {
    pub fn network(message: impl Into<String>) -> Self {
        DiagnosticError::Network(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        DiagnosticError::Timeout(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DiagnosticError::Validation(message.into())
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        DiagnosticError::RateLimit(message.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        DiagnosticError::Server(message.into())
    }

    pub fn service(message: impl Into<String>) -> Self {
        DiagnosticError::Service(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        DiagnosticError::Serialization(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        DiagnosticError::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DiagnosticError::Internal(message.into())
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        DiagnosticError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut context = ErrorContext::new();
        context.add(key, value);
        self.with_context(context)
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DiagnosticError::WithContext { context, .. } => context.status_code,
            _ => None,
        }
    }

    /// Get the endpoint that produced the error if available
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            DiagnosticError::WithContext { context, .. } => context.endpoint.as_deref(),
            _ => None,
        }
    }

    /// Strip any context wrappers
    pub fn root(&self) -> &DiagnosticError {
        match self {
            DiagnosticError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }
}

/// Error context information
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Endpoint that was called
    pub endpoint: Option<String>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific endpoint
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Convert reqwest errors to DiagnosticError
impl From<reqwest::Error> for DiagnosticError {
    fn from(err: reqwest::Error) -> Self {
        let mut context = ErrorContext::new();
        if let Some(url) = err.url() {
            context.endpoint = Some(url.to_string());
        }

        let error = if err.is_timeout() {
            DiagnosticError::timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            DiagnosticError::network(format!("Connection error: {}", err))
        } else if err.is_request() {
            DiagnosticError::validation(format!("Invalid request: {}", err))
        } else if err.is_redirect() {
            DiagnosticError::network(format!("Too many redirects: {}", err))
        } else {
            DiagnosticError::internal(format!("HTTP client error: {}", err))
        };

        if let Some(status) = err.status() {
            error.with_context(context.status_code(status.as_u16()))
        } else {
            error.with_context(context)
        }
    }
}

/// Convert serde_json errors to DiagnosticError
impl From<serde_json::Error> for DiagnosticError {
    fn from(err: serde_json::Error) -> Self {
        DiagnosticError::serialization(format!("JSON error: {}", err))
    }
}
