use serde::Serialize;

use crate::error::ValidationErrors;

/// A record that can be auto-saved.
///
/// The reconciler serialises the draft for change detection and hands it to
/// the `RemoteStore` as-is. Day linkage methods only matter for drafts used
/// with `DayAssignment::DateDriven`.
pub trait AutosaveEntity: Serialize + Clone + Send + Sync + 'static {
    /// Short label used in log fields ("lodging", "package").
    fn kind(&self) -> &str;

    /// Local schema checks run before any network call.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }

    /// Date that places the draft on an itinerary day.
    fn assignment_date(&self) -> Option<&str> {
        None
    }

    /// Currently linked itinerary day.
    fn day_id(&self) -> Option<&str> {
        None
    }

    fn set_day_id(&mut self, _day_id: Option<String>) {}
}
