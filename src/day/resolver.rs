//! Date-to-day resolution for itineraries whose activities are placed by a
//! date field (check-in, departure, reservation) rather than an explicit pick.
//!
//! Dates are compared as calendar dates. A timestamp such as
//! `2025-12-31T23:30:00-05:00` resolves to the date it was written with; no
//! offset is ever applied, so the host time zone cannot shift the result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// ItineraryDay
// ============================================================================

/// A day of an itinerary, supplied by the caller and never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub day_number: u32,
}

impl ItineraryDay {
    pub fn new(id: impl Into<String>, date: impl Into<String>, day_number: u32) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            day_number,
        }
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }
}

// ============================================================================
// DayAssignment
// ============================================================================

/// How a draft's day reference is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayAssignment {
    /// The user picks the day; the resolver is never consulted.
    #[default]
    Explicit,
    /// The draft's assignment date decides the day on every change.
    DateDriven,
}

// ============================================================================
// DayResolution
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayResolution {
    Matched(ItineraryDay),
    /// No date entered yet.
    NoCandidate,
    /// A date was entered but no day carries it (or it is not a date).
    Unmatched { date: String },
}

impl DayResolution {
    pub fn day(&self) -> Option<&ItineraryDay> {
        match self {
            Self::Matched(day) => Some(day),
            _ => None,
        }
    }

    pub fn day_id(&self) -> Option<&str> {
        self.day().map(|d| d.id.as_str())
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// Inline warning text for a miss.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Matched(_) | Self::NoCandidate => None,
            Self::Unmatched { date } => Some(format!(
                "{date} is not one of this itinerary's days; choose a date within the trip"
            )),
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Read the calendar date a value was written with.
///
/// Accepts `YYYY-MM-DD` optionally followed by a `T` or space and any time /
/// offset suffix, which is ignored.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10)?;
    if let Some(sep) = trimmed.as_bytes().get(10) {
        if !matches!(sep, b'T' | b't' | b' ') {
            return None;
        }
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// First day (in list order) whose date equals the candidate's calendar date.
///
/// `None` for an absent or unparseable candidate.
pub fn resolve_day<'a>(candidate: Option<&str>, days: &'a [ItineraryDay]) -> Option<&'a ItineraryDay> {
    let target = parse_calendar_date(candidate?)?;
    days.iter().find(|day| day.calendar_date() == Some(target))
}

/// Like [`resolve_day`] but reports why nothing matched.
pub fn resolve(candidate: Option<&str>, days: &[ItineraryDay]) -> DayResolution {
    let Some(raw) = candidate.map(str::trim).filter(|s| !s.is_empty()) else {
        return DayResolution::NoCandidate;
    };
    match resolve_day(Some(raw), days) {
        Some(day) => DayResolution::Matched(day.clone()),
        None => DayResolution::Unmatched {
            date: raw.to_string(),
        },
    }
}
