//! Common types used throughout the DbFlare client
//!
//! Shared type definitions and type aliases used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// Generic key-value map with string keys and JSON values
pub type ValueMap = HashMap<String, JsonValue>;

/// Query parameter map where each key carries several values
/// (repeated query-string keys, used for IN-style filters)
pub type MultiValueMap = HashMap<String, Vec<String>>;

// ============================================================================
// Payload Key
// ============================================================================

/// The envelope field holding the actual result.
///
/// Older DbFlare deployments wrap payloads under `data`, newer ones under
/// `result`. A configured client uses exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKey {
    /// `{"data": ...}` envelopes
    #[default]
    Data,
    /// `{"result": ...}` envelopes
    Result,
}

impl PayloadKey {
    /// The envelope field name
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKey::Data => "data",
            PayloadKey::Result => "result",
        }
    }
}

impl std::fmt::Display for PayloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
