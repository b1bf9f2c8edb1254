//! Dirty gate: whether the current draft warrants a save attempt.

use crate::day::DayAssignment;
use crate::draft::{AutosaveEntity, Canonical, SaveSnapshot};
use crate::error::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Ready,
    Invalid(ValidationErrors),
    /// Date-driven draft with no matching itinerary day.
    DayUnresolved {
        date: Option<String>,
    },
    /// Serialises identically to the last acknowledged save.
    Unchanged,
    InFlight,
}

impl GateDecision {
    pub fn should_save(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Blocked by the draft's own content rather than by timing.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::DayUnresolved { .. })
    }
}

pub struct GateInput<'a, E> {
    pub draft: &'a E,
    pub canonical: &'a Canonical,
    pub snapshot: Option<&'a SaveSnapshot>,
    pub in_flight: bool,
    pub assignment: DayAssignment,
}

/// Checks run in order: validation, day linkage, snapshot equality, in-flight.
pub fn evaluate<E: AutosaveEntity>(input: &GateInput<'_, E>) -> GateDecision {
    if let Err(errors) = input.draft.validate() {
        return GateDecision::Invalid(errors);
    }
    if input.assignment == DayAssignment::DateDriven && input.draft.day_id().is_none() {
        return GateDecision::DayUnresolved {
            date: input.draft.assignment_date().map(str::to_string),
        };
    }
    if input.snapshot.is_some_and(|s| s.matches(input.canonical)) {
        return GateDecision::Unchanged;
    }
    if input.in_flight {
        return GateDecision::InFlight;
    }
    GateDecision::Ready
}
