//! Delivery of diagnostic batches
//!
//! The batcher only knows the `Transport` trait. Timeouts and any retry
//! policy belong to the implementation.

pub mod http;
pub use http::HttpTransport;

use async_trait::async_trait;

use crate::diagnostic::RequestPayload;
use crate::error::Result;

/// Sends one request payload to a destination URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str, payload: &RequestPayload) -> Result<()>;
}
