//! Canonical serialisation and the last-acknowledged save snapshot.
//!
//! Object keys are sorted at every depth so two drafts holding the same
//! values always serialise identically, whatever order fields were edited in.

use serde::Serialize;
use serde_json::{Map, Value};

const MAX_DIFF_DEPTH: usize = 64;

// ============================================================================
// Canonical form
// ============================================================================

/// A serialised draft: sorted value plus its compact JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonical {
    pub value: Value,
    pub text: String,
}

impl Canonical {
    pub fn of<T: Serialize>(draft: &T) -> Result<Self, serde_json::Error> {
        let value = sort_keys(serde_json::to_value(draft)?);
        let text = serde_json::to_string(&value)?;
        Ok(Self { value, text })
    }
}

/// Rebuild `value` with object keys inserted in ascending order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key, sort_keys(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

// ============================================================================
// SaveSnapshot
// ============================================================================

/// The draft as the server last acknowledged it.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSnapshot {
    canonical: Canonical,
}

impl SaveSnapshot {
    pub fn capture<T: Serialize>(draft: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            canonical: Canonical::of(draft)?,
        })
    }

    pub(crate) fn from_canonical(canonical: Canonical) -> Self {
        Self { canonical }
    }

    pub fn as_str(&self) -> &str {
        &self.canonical.text
    }

    pub fn value(&self) -> &Value {
        &self.canonical.value
    }

    pub fn matches(&self, current: &Canonical) -> bool {
        self.canonical.text == current.text
    }

    /// Dot-notation paths of leaves that differ from `current`. Arrays are
    /// compared as a whole.
    pub fn changed_paths(&self, current: &Canonical) -> Vec<String> {
        let mut changes = Vec::new();
        let mut path = Vec::new();
        diff_values(&self.canonical.value, &current.value, &mut path, &mut changes, 0);
        changes
    }
}

fn diff_values(
    old: &Value,
    new: &Value,
    path: &mut Vec<String>,
    changes: &mut Vec<String>,
    depth: usize,
) {
    match (old, new) {
        (Value::Object(old_obj), Value::Object(new_obj)) if depth < MAX_DIFF_DEPTH => {
            let mut keys: Vec<&String> = old_obj.keys().chain(new_obj.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let old_child = old_obj.get(key).unwrap_or(&Value::Null);
                let new_child = new_obj.get(key).unwrap_or(&Value::Null);
                path.push(key.clone());
                diff_values(old_child, new_child, path, changes, depth + 1);
                path.pop();
            }
        }
        _ => {
            if old != new {
                let p = path.join(".");
                if !p.is_empty() {
                    changes.push(p);
                }
            }
        }
    }
}
