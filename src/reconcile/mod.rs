//! Auto-save reconciliation.
//!
//! # Modules
//!
//! - [`types`]: the [`RemoteStore`] trait and save outcomes.
//! - [`gate`]: the dirty gate ([`GateDecision`]).
//! - [`dispatcher`]: create-or-update with the duplicate-create guard.
//! - [`handoff`]: one-shot payloads for the first create.
//! - [`controller`]: debounce and status state machine ([`AutosaveHandle`]).

pub mod controller;
pub mod dispatcher;
pub mod gate;
pub mod handoff;
pub mod types;

pub use controller::{AutosaveBuilder, AutosaveHandle, AutosaveState};
pub use dispatcher::Dispatcher;
pub use gate::{evaluate, GateDecision, GateInput};
pub use handoff::{CreateHandoff, MediaRef};
pub use types::{DispatchOutcome, RemoteStore, SaveOutcome, SaveTrigger};
