//! Configuration management for the analytics core
//!
//! This module provides utilities for loading and validating configuration
//! for the diagnostic reporter, with support for environment variables.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{DEFAULT_FLUSH_DELAY_MS, DEFAULT_LIBRARY, DEFAULT_TIMEOUT_SECONDS, DIAGNOSTIC_ENDPOINT};
use crate::error::{DiagnosticError, Result};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| DiagnosticError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(DiagnosticError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables (e.g., "DIAGNOSTIC")
    namespace: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    pub fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                DiagnosticError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => DiagnosticError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| DiagnosticError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// A composite config provider that tries multiple providers in order
#[derive(Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the end of the chain
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Box::new(provider));
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.providers
            .iter()
            .find_map(|provider| provider.get_string(key).ok())
            .ok_or_else(|| {
                DiagnosticError::configuration(format!("Configuration key not found in any provider: {}", key))
            })
    }
}

/// Global default configuration provider
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("ANALYTICS")));

/// Configuration for the diagnostic reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticConfig {
    /// Collector endpoint
    pub server_url: String,

    /// Library identifier stamped on every event
    pub library: String,

    /// Delay before a queued batch is flushed automatically
    pub flush_delay_ms: u64,

    /// Drop all tracked events
    pub is_disabled: bool,

    /// HTTP transport timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            server_url: DIAGNOSTIC_ENDPOINT.to_string(),
            library: DEFAULT_LIBRARY.to_string(),
            flush_delay_ms: DEFAULT_FLUSH_DELAY_MS,
            is_disabled: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl DiagnosticConfig {
    /// Load configuration from a config provider; missing keys fall back to defaults
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let server_url = provider.get_string_or("diagnostic_server_url", DIAGNOSTIC_ENDPOINT);
        let library = provider.get_string_or("diagnostic_library", DEFAULT_LIBRARY);
        let flush_delay_ms = provider.get_int_or("diagnostic_flush_delay_ms", DEFAULT_FLUSH_DELAY_MS as i64);
        let is_disabled = provider.get_bool_or("diagnostic_disabled", false);
        let timeout_seconds = provider.get_int_or("diagnostic_timeout_seconds", DEFAULT_TIMEOUT_SECONDS as i64);

        if flush_delay_ms < 0 {
            return Err(DiagnosticError::configuration(format!(
                "Flush delay must not be negative: {}",
                flush_delay_ms
            )));
        }

        if timeout_seconds <= 0 {
            return Err(DiagnosticError::configuration(format!(
                "Timeout must be positive: {}",
                timeout_seconds
            )));
        }

        let config = Self {
            server_url,
            library,
            flush_delay_ms: flush_delay_ms as u64,
            is_disabled,
            timeout_seconds: timeout_seconds as u64,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate this configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.server_url).map_err(|e| {
            DiagnosticError::configuration(format!("Invalid diagnostic server URL {}: {}", self.server_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DiagnosticError::configuration(format!(
                "Diagnostic server URL must use http or https: {}",
                self.server_url
            )));
        }

        if self.library.is_empty() {
            return Err(DiagnosticError::configuration("Diagnostic library identifier is required"));
        }

        Ok(())
    }

    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
