use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::{Availability, Location, Vessel};

/// A vessel at a location on a date, with its slot availability.
///
/// Serializes with a derived `has_availability` flag next to `available`;
/// the flag is ignored when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reservation {
    /// `reservation:<locationId>:<vesselId>` unless set explicitly.
    pub id: String,
    pub date: NaiveDate,
    pub location: Location,
    pub vessel: Vessel,
    pub available: Availability,
    /// True when the booking belongs to the logged-in member.
    pub is_own: bool,
}

impl Reservation {
    /// Builds a reservation with a derived id and `is_own = false`.
    #[must_use]
    pub fn new(date: NaiveDate, location: Location, vessel: Vessel, available: Availability) -> Self {
        Self {
            id: derived_id(&location.id, &vessel.id),
            date,
            location,
            vessel,
            available,
            is_own: false,
        }
    }

    /// Replaces the derived id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Marks the reservation as the member's own booking.
    #[must_use]
    pub fn owned(mut self) -> Self {
        self.is_own = true;
        self
    }

    #[must_use]
    pub fn has_availability(&self) -> bool {
        self.available.has_availability()
    }
}

impl Serialize for Reservation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Reservation", 7)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("date", &self.date)?;
        state.serialize_field("location", &self.location)?;
        state.serialize_field("vessel", &self.vessel)?;
        state.serialize_field("available", &self.available)?;
        state.serialize_field("has_availability", &self.has_availability())?;
        state.serialize_field("is_own", &self.is_own)?;
        state.end()
    }
}

// The derived id is deliberately date-free.
fn derived_id(location_id: &str, vessel_id: &str) -> String {
    format!("reservation:{location_id}:{vessel_id}")
}
