//! Normalized entities built from scraped portal markup.
//!
//! - [`Location`] - a club marina
//! - [`Vessel`] / [`VesselDetails`] - a boat and the attributes parsed from its description
//! - [`Reservation`] - a vessel at a location on a date with its [`Availability`]
//! - [`Classification`] - the vessel-use category a query is scoped to
//!
//! Entities are plain values with explicit constructors; nothing here performs
//! I/O.

mod availability;
mod classification;
mod location;
mod reservation;
mod vessel;

pub use availability::Availability;
pub use classification::Classification;
pub use location::Location;
pub use reservation::Reservation;
pub use vessel::{EngineManufacturer, Vessel, VesselDetails, VesselManufacturer, VesselType};

use chrono::NaiveDate;

/// Scope for date-based portal queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// First date to query; today when absent.
    pub date: Option<NaiveDate>,
    /// Vessel category; [`Classification::FishingCruising`] when absent.
    pub classification: Option<Classification>,
    /// Last date of a range query; only the listing endpoint honours it.
    pub date_end: Option<NaiveDate>,
}

impl QueryOptions {
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// The query date, defaulting to the local calendar date.
    #[must_use]
    pub fn date_or_today(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    #[must_use]
    pub fn classification_or_default(&self) -> Classification {
        self.classification.unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_options_defaults() {
        let opts = QueryOptions::default();
        assert_eq!(opts.classification_or_default(), Classification::FishingCruising);
        assert_eq!(opts.date_or_today(), chrono::Local::now().date_naive());
    }

    #[test]
    fn test_query_options_on_sets_date() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 3).unwrap();
        assert_eq!(QueryOptions::on(date).date_or_today(), date);
    }
}
