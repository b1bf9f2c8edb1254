//! Shared value types: remote identity, persisted records and save status.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// RemoteId
// ============================================================================

/// Server-assigned identifier of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RemoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// PersistedRecord
// ============================================================================

/// Canonical view of a record as acknowledged by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub id: RemoteId,
    /// Server-computed fields (e.g. `pricing_id`).
    pub fields: Map<String, Value>,
}

impl PersistedRecord {
    pub fn new(id: impl Into<RemoteId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Identifier of the pricing record the server generated, if any.
    pub fn pricing_id(&self) -> Option<&str> {
        self.fields.get("pricing_id").and_then(Value::as_str)
    }
}

// ============================================================================
// SaveStatus
// ============================================================================

/// User-visible auto-save status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveStatus {
    Idle,
    DirtyPending,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DirtyPending => "dirty-pending",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
