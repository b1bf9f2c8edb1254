//! Debounced create-or-update auto-save for itinerary records, with
//! date-driven itinerary day resolution.

pub mod config;
pub mod error;
pub mod types;

pub mod day;
pub mod draft;
pub mod events;
pub mod reconcile;

pub use config::AutosaveConfig;
pub use day::{DayAssignment, DayResolution, ItineraryDay};
pub use draft::{ActivityDetails, ActivityDraft, ActivityKind, AutosaveEntity, PackageDraft};
pub use error::{AutosaveError, PersistError, Result, ValidationErrors};
pub use events::{AutosaveEvent, StatusSignal};
pub use reconcile::{AutosaveHandle, CreateHandoff, GateDecision, RemoteStore, SaveOutcome};
pub use types::{PersistedRecord, RemoteId, SaveStatus};
