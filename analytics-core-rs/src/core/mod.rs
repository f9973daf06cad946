//! Core abstractions shared by analytics plugins
//!
//! Plugins are dispatched generically through `DestinationPlugin::execute`.
//! Plugins that accept data through their own typed API (like the diagnostic
//! reporter) keep the default `execute`, which refuses the event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DIAGNOSTIC_EVENT_TYPE, UNSUPPORTED_EXECUTE_MESSAGE};

/// Stage of the pipeline a plugin runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Before,
    Enrichment,
    Destination,
}

/// A generic analytics event as seen by the dispatch pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_properties: Option<Map<String, Value>>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            event_properties: None,
        }
    }

    /// Attach a property (builder pattern)
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event_properties
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Outcome of dispatching an event to a destination plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginResult {
    pub event: Event,
    pub code: i32,
    pub message: String,
}

impl PluginResult {
    /// The fixed result returned by plugins that do not accept `execute`
    pub fn unsupported() -> Self {
        Self {
            event: Event::new(DIAGNOSTIC_EVENT_TYPE),
            code: -1,
            message: UNSUPPORTED_EXECUTE_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Shared interface for destination plugins
#[async_trait]
pub trait DestinationPlugin: Send + Sync {
    /// The plugin name/identifier
    fn name(&self) -> &str;

    fn plugin_type(&self) -> PluginType {
        PluginType::Destination
    }

    /// Generic dispatch entry point. Never tracks anything by default.
    async fn execute(&self, _context: &Event) -> PluginResult {
        PluginResult::unsupported()
    }
}
