//! Reconciler-facing types: the remote store trait and save outcomes.

use async_trait::async_trait;

use crate::error::PersistError;
use crate::types::{PersistedRecord, RemoteId};

use super::handoff::CreateHandoff;

// ============================================================================
// RemoteStore: user-provided persistence layer
// ============================================================================

/// Create/update calls against the backend that owns the record.
///
/// Implementations wrap the REST client. Errors distinguish field rejections
/// (`PersistError::Rejected`) from everything else.
#[async_trait]
pub trait RemoteStore<E: Send + Sync>: Send + Sync {
    /// Persist a record that has no remote identity yet.
    async fn create(&self, draft: &E) -> Result<PersistedRecord, PersistError>;

    /// Overwrite the record identified by `id`. Last write wins.
    async fn update(&self, id: &RemoteId, draft: &E) -> Result<PersistedRecord, PersistError>;

    /// Attach a hand-off payload to a freshly created record.
    async fn attach_handoff(
        &self,
        _id: &RemoteId,
        _handoff: &CreateHandoff,
    ) -> Result<(), PersistError> {
        Ok(())
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// What the dispatcher did with one save attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Created(PersistedRecord),
    Updated(PersistedRecord),
    /// Another create is in flight; nothing was sent.
    Deferred,
}

/// What a controller save attempt ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(PersistedRecord),
    Updated(PersistedRecord),
    /// The draft matches the last acknowledged snapshot.
    Unchanged,
    /// A save is already in flight; a follow-up runs once it completes.
    Deferred,
}

impl SaveOutcome {
    pub fn record(&self) -> Option<&PersistedRecord> {
        match self {
            Self::Created(record) | Self::Updated(record) => Some(record),
            Self::Unchanged | Self::Deferred => None,
        }
    }
}

impl From<DispatchOutcome> for SaveOutcome {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Created(record) => Self::Created(record),
            DispatchOutcome::Updated(record) => Self::Updated(record),
            DispatchOutcome::Deferred => Self::Deferred,
        }
    }
}

/// What started a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Debounce,
    Manual,
}

impl SaveTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debounce => "debounce",
            Self::Manual => "manual",
        }
    }
}
