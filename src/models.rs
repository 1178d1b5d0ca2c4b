//! Shared models and types
//!
//! Types shared across multiple modules to avoid circular dependencies.

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub store_connected: bool,
}

/// Webhook processing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub timestamp: String,
    pub analytics_found: bool,
}

/// Ordered attribute name/value pairs ready for publication.
///
/// Built fresh per request, published once, then discarded. Insertion
/// order is preserved so downstream items update in a stable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedAttributes {
    items: Vec<(String, String)>,
}

impl NormalizedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute. Callers are responsible for pushing each
    /// documented field exactly once.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.items.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lookup by external name (test helper and duplicate guard).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
