use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field path → user-facing message, as returned by the remote store when it
/// rejects a record.
pub type FieldErrors = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// ValidationError / ValidationErrors
// ---------------------------------------------------------------------------

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#"Validation failed at "{}": {}"#, self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// One or more `ValidationError`s, in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Path of the first failing field, the one a form scrolls to.
    pub fn first_path(&self) -> Option<&str> {
        self.0.first().map(|e| e.path.as_str())
    }

    /// First message per path.
    pub fn to_field_errors(&self) -> FieldErrors {
        let mut map = FieldErrors::new();
        for e in &self.0 {
            map.entry(e.path.clone()).or_insert_with(|| e.message.clone());
        }
        map
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed:")?;
        for e in &self.0 {
            write!(f, "\n  - {}: {}", e.path, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ---------------------------------------------------------------------------
// PersistError
// ---------------------------------------------------------------------------

/// Failure reported by a `RemoteStore` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    /// The server refused specific fields.
    #[error("Server rejected fields: {}", join_field_errors(.0))]
    Rejected(FieldErrors),

    /// Network or generic server failure.
    #[error("{0}")]
    Failed(String),
}

impl PersistError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn rejected<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Rejected(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Rejected(fields) => Some(fields),
            Self::Failed(_) => None,
        }
    }

    /// The message to show verbatim, or `None` when the error carries nothing
    /// presentable and a fallback should be used instead.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Failed(message) if message.trim().is_empty() => None,
            Self::Rejected(fields) if fields.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

fn join_field_errors(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(path, message)| format!("{path}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid autosave config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("debounce_ms must be greater than zero")]
    ZeroDebounce,

    #[error("Invalid value for {var}: \"{value}\"")]
    InvalidEnv { var: String, value: String },
}

// ---------------------------------------------------------------------------
// AutosaveError: top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AutosaveError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("No itinerary day matches {}", .date.as_deref().unwrap_or("an empty date"))]
    DayUnresolved { date: Option<String> },

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to serialize draft: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Autosave controller disposed")]
    Disposed,

    #[error("Autosave must be started from within a Tokio runtime")]
    NoRuntime,
}

/// Convenience alias; the default error type is `AutosaveError`.
pub type Result<T, E = AutosaveError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
