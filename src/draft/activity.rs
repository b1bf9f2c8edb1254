//! Itinerary activity drafts: flights, lodging, cruises, dining, tours and
//! ground transportation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::day::parse_calendar_date;
use crate::error::ValidationErrors;

use super::entity::AutosaveEntity;

// ============================================================================
// ActivityKind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Flight,
    Lodging,
    Cruise,
    Dining,
    Tour,
    Transportation,
    Other,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Lodging => "lodging",
            Self::Cruise => "cruise",
            Self::Dining => "dining",
            Self::Tour => "tour",
            Self::Transportation => "transportation",
            Self::Other => "other",
        }
    }
}

// ============================================================================
// ActivityDetails
// ============================================================================

/// Kind-specific fields. Dates are `YYYY-MM-DD` strings as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityDetails {
    Flight {
        airline: Option<String>,
        flight_number: Option<String>,
        departure_date: Option<String>,
    },
    Lodging {
        property_name: Option<String>,
        check_in_date: Option<String>,
        check_out_date: Option<String>,
        rooms: Option<u32>,
    },
    Cruise {
        cruise_line: Option<String>,
        ship_name: Option<String>,
        departure_date: Option<String>,
        arrival_date: Option<String>,
        cabin: Option<String>,
    },
    Dining {
        restaurant: Option<String>,
        reservation_date: Option<String>,
        party_size: Option<u32>,
    },
    Tour {
        operator: Option<String>,
        tour_date: Option<String>,
        duration_hours: Option<f64>,
    },
    Transportation {
        provider: Option<String>,
        pickup_date: Option<String>,
        dropoff_date: Option<String>,
    },
    General,
}

impl ActivityDetails {
    /// Empty details for `kind`.
    pub fn empty(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::Flight => Self::Flight {
                airline: None,
                flight_number: None,
                departure_date: None,
            },
            ActivityKind::Lodging => Self::Lodging {
                property_name: None,
                check_in_date: None,
                check_out_date: None,
                rooms: None,
            },
            ActivityKind::Cruise => Self::Cruise {
                cruise_line: None,
                ship_name: None,
                departure_date: None,
                arrival_date: None,
                cabin: None,
            },
            ActivityKind::Dining => Self::Dining {
                restaurant: None,
                reservation_date: None,
                party_size: None,
            },
            ActivityKind::Tour => Self::Tour {
                operator: None,
                tour_date: None,
                duration_hours: None,
            },
            ActivityKind::Transportation => Self::Transportation {
                provider: None,
                pickup_date: None,
                dropoff_date: None,
            },
            ActivityKind::Other => Self::General,
        }
    }

    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::Flight { .. } => ActivityKind::Flight,
            Self::Lodging { .. } => ActivityKind::Lodging,
            Self::Cruise { .. } => ActivityKind::Cruise,
            Self::Dining { .. } => ActivityKind::Dining,
            Self::Tour { .. } => ActivityKind::Tour,
            Self::Transportation { .. } => ActivityKind::Transportation,
            Self::General => ActivityKind::Other,
        }
    }

    /// `(field, value)` of the date that starts the activity.
    pub fn start_date(&self) -> Option<(&'static str, Option<&str>)> {
        match self {
            Self::Flight { departure_date, .. } => Some(("departure_date", departure_date.as_deref())),
            Self::Lodging { check_in_date, .. } => Some(("check_in_date", check_in_date.as_deref())),
            Self::Cruise { departure_date, .. } => Some(("departure_date", departure_date.as_deref())),
            Self::Dining { reservation_date, .. } => {
                Some(("reservation_date", reservation_date.as_deref()))
            }
            Self::Tour { tour_date, .. } => Some(("tour_date", tour_date.as_deref())),
            Self::Transportation { pickup_date, .. } => Some(("pickup_date", pickup_date.as_deref())),
            Self::General => None,
        }
    }

    /// `(field, value)` of the date that ends the activity, for kinds that have one.
    pub fn end_date(&self) -> Option<(&'static str, Option<&str>)> {
        match self {
            Self::Lodging { check_out_date, .. } => Some(("check_out_date", check_out_date.as_deref())),
            Self::Cruise { arrival_date, .. } => Some(("arrival_date", arrival_date.as_deref())),
            Self::Transportation { dropoff_date, .. } => {
                Some(("dropoff_date", dropoff_date.as_deref()))
            }
            _ => None,
        }
    }

    fn validate_into(&self, errors: &mut ValidationErrors) {
        let start = self
            .start_date()
            .and_then(|(field, value)| check_date(field, value, errors));
        if let Some((end_field, end_value)) = self.end_date() {
            let end = check_date(end_field, end_value, errors);
            if let (Some(start), Some(end)) = (start, end) {
                if end < start {
                    errors.push(
                        format!("details.{end_field}"),
                        "End date must be on or after the start date",
                    );
                }
            }
        }

        match self {
            Self::Dining {
                party_size: Some(0),
                ..
            } => errors.push("details.party_size", "Party size must be at least 1"),
            Self::Lodging { rooms: Some(0), .. } => {
                errors.push("details.rooms", "At least one room is required")
            }
            Self::Tour {
                duration_hours: Some(hours),
                ..
            } if !hours.is_finite() || *hours <= 0.0 => {
                errors.push("details.duration_hours", "Duration must be a positive number of hours")
            }
            _ => {}
        }
    }
}

/// Parse an optional date field, recording an error for malformed input.
fn check_date(field: &str, value: Option<&str>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty())?;
    let parsed = parse_calendar_date(raw);
    if parsed.is_none() {
        errors.push(format!("details.{field}"), "Enter a valid date (YYYY-MM-DD)");
    }
    parsed
}

// ============================================================================
// ActivityDraft
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub kind: ActivityKind,
    pub title: String,
    pub itinerary_id: Option<String>,
    pub day_id: Option<String>,
    /// Booking package this activity belongs to.
    pub package_id: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub details: ActivityDetails,
}

impl ActivityDraft {
    pub fn new(kind: ActivityKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            itinerary_id: None,
            day_id: None,
            package_id: None,
            price: None,
            currency: None,
            notes: None,
            details: ActivityDetails::empty(kind),
        }
    }

    pub fn lodging(title: impl Into<String>) -> Self {
        Self::new(ActivityKind::Lodging, title)
    }

    pub fn with_itinerary(mut self, itinerary_id: impl Into<String>) -> Self {
        self.itinerary_id = Some(itinerary_id.into());
        self
    }

    pub fn with_details(mut self, details: ActivityDetails) -> Self {
        self.details = details;
        self
    }

    /// Set the start date field of the current details, whatever the kind.
    pub fn set_start_date(&mut self, date: Option<&str>) {
        let date = date.map(str::to_string);
        match &mut self.details {
            ActivityDetails::Flight { departure_date, .. }
            | ActivityDetails::Cruise { departure_date, .. } => *departure_date = date,
            ActivityDetails::Lodging { check_in_date, .. } => *check_in_date = date,
            ActivityDetails::Dining { reservation_date, .. } => *reservation_date = date,
            ActivityDetails::Tour { tour_date, .. } => *tour_date = date,
            ActivityDetails::Transportation { pickup_date, .. } => *pickup_date = date,
            ActivityDetails::General => {}
        }
    }
}

impl AutosaveEntity for ActivityDraft {
    fn kind(&self) -> &str {
        self.kind.as_str()
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        if self.details.kind() != self.kind {
            errors.push("details", "Details do not match the activity kind");
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                errors.push("price", "Price must be a non-negative amount");
            }
        }
        self.details.validate_into(&mut errors);
        errors.into_result()
    }

    fn assignment_date(&self) -> Option<&str> {
        self.details.start_date().and_then(|(_, value)| value)
    }

    fn day_id(&self) -> Option<&str> {
        self.day_id.as_deref()
    }

    fn set_day_id(&mut self, day_id: Option<String>) {
        self.day_id = day_id;
    }
}
