use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

use super::entity::AutosaveEntity;

/// A booking package: the commercial wrapper that activities link into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDraft {
    pub name: String,
    pub itinerary_id: Option<String>,
    pub booking_reference: Option<String>,
    pub traveler_count: u32,
    pub total_price: Option<f64>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

impl PackageDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            itinerary_id: None,
            booking_reference: None,
            traveler_count: 1,
            total_price: None,
            currency: None,
            notes: None,
        }
    }
}

impl AutosaveEntity for PackageDraft {
    fn kind(&self) -> &str {
        "package"
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "Package name is required");
        }
        if self.traveler_count == 0 {
            errors.push("traveler_count", "At least one traveler is required");
        }
        if let Some(total) = self.total_price {
            if !total.is_finite() || total < 0.0 {
                errors.push("total_price", "Total price must be a non-negative amount");
            }
        }
        if let Some(reference) = &self.booking_reference {
            if reference.chars().any(char::is_whitespace) {
                errors.push("booking_reference", "Booking reference cannot contain spaces");
            }
        }
        errors.into_result()
    }
}
