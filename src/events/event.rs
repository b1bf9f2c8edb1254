//! AutosaveEvent: what a controller reports to its subscribers.

use chrono::{DateTime, Utc};

use crate::error::FieldErrors;
use crate::types::{RemoteId, SaveStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum AutosaveEvent {
    StatusChanged { from: SaveStatus, to: SaveStatus },
    /// A save was acknowledged by the server.
    Saved {
        id: RemoteId,
        created: bool,
        at: DateTime<Utc>,
    },
    /// One notification per failed attempt.
    SaveFailed {
        message: String,
        field_errors: Option<FieldErrors>,
    },
}

impl AutosaveEvent {
    /// The status this event moved to, if it is a status change.
    pub fn status(&self) -> Option<SaveStatus> {
        match self {
            Self::StatusChanged { to, .. } => Some(*to),
            _ => None,
        }
    }
}
