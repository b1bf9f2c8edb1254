//! Drafts: the editable records the reconciler saves.
//!
//! - [`entity`]: the [`AutosaveEntity`] trait every draft implements.
//! - [`snapshot`]: canonical serialisation and [`SaveSnapshot`].
//! - [`activity`] / [`package`]: the concrete travel drafts.

pub mod activity;
pub mod entity;
pub mod package;
pub mod snapshot;

pub use activity::{ActivityDetails, ActivityDraft, ActivityKind};
pub use entity::AutosaveEntity;
pub use package::PackageDraft;
pub use snapshot::{Canonical, SaveSnapshot};
