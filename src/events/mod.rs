//! Status signal and save notifications.
//!
//! - [`event`]: [`AutosaveEvent`].
//! - [`emitter`]: the watched [`StatusSignal`] plus callback delivery
//!   ([`AutosaveEmitter`]).

pub mod emitter;
pub mod event;

pub use emitter::{AutosaveEmitter, ListenerId, StatusSignal};
pub use event::AutosaveEvent;
