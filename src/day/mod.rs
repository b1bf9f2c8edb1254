pub mod resolver;

pub use resolver::{
    parse_calendar_date, resolve, resolve_day, DayAssignment, DayResolution, ItineraryDay,
};
