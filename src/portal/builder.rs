//! Turns extracted records into domain entities.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::extract::{ClassificationRecord, LocationRecord, MemberReservationRecord, VesselEntry};
use crate::model::{Classification, Location, Reservation, Vessel};

impl From<LocationRecord> for Location {
    fn from(record: LocationRecord) -> Self {
        Location::new(record.id, record.name, record.description, record.details)
    }
}

/// Distinct vessels of a fleet listing, in listing order.
///
/// Only entries with both an id and a name qualify; the first occurrence of
/// an id wins.
pub(crate) fn build_vessels(entries: &[VesselEntry]) -> Vec<Vessel> {
    let mut seen = HashSet::new();
    let mut vessels = Vec::new();

    for entry in entries {
        let (Some(id), Some(name)) = (&entry.id, &entry.name) else {
            continue;
        };
        if !seen.insert(id.as_str()) {
            continue;
        }
        vessels.push(Vessel::new(
            id.clone(),
            Some(name.clone()),
            entry.description.as_deref(),
        ));
    }

    vessels
}

/// Number of listing entries [`build_vessels`] drops for a missing id or
/// name. Repeat entries of one vessel are not counted.
pub(crate) fn incomplete_vessel_entries(entries: &[VesselEntry]) -> usize {
    entries
        .iter()
        .filter(|entry| entry.id.is_none() || entry.name.is_none())
        .count()
}

/// Looks `id` up in a vessel list, falling back to a placeholder.
pub(crate) fn vessel_or_placeholder(vessels: &[Vessel], id: &str) -> Vessel {
    vessels
        .iter()
        .find(|vessel| vessel.id == id)
        .cloned()
        .unwrap_or_else(|| {
            debug!(vessel_id = %id, "vessel missing from listing; using placeholder");
            Vessel::placeholder(id)
        })
}

/// Keeps only recognized classification codes, deduplicated, in portal order.
pub(crate) fn recognized_classifications(records: &[ClassificationRecord]) -> Vec<Classification> {
    let mut recognized = Vec::new();
    for record in records {
        match Classification::from_code(&record.id) {
            Some(classification) if !recognized.contains(&classification) => {
                recognized.push(classification);
            }
            Some(_) => {}
            None => warn!(code = %record.id, name = %record.name, "dropping unknown classification"),
        }
    }
    recognized
}

/// Builds the member's own booking from a reservations-page record.
///
/// Names come from the row label since the page carries no location or
/// vessel details.
pub(crate) fn member_reservation(record: MemberReservationRecord) -> Reservation {
    let location = match record.location_name {
        Some(name) => Location::new(record.location_id, name, String::new(), None),
        None => Location::placeholder(record.location_id),
    };
    let vessel = Vessel::new(record.vessel_id, record.vessel_name, None);

    let reservation = Reservation::new(record.date, location, vessel, record.slot).owned();
    match record.reservation_id {
        Some(id) => reservation.with_id(id),
        None => reservation,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Availability, VesselType};

    fn entry(id: Option<&str>, name: Option<&str>, description: Option<&str>) -> VesselEntry {
        VesselEntry {
            id: id.map(str::to_string),
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            date: NaiveDate::from_ymd_opt(2023, 7, 8),
        }
    }

    #[test]
    fn test_location_from_record() {
        let location = Location::from(LocationRecord {
            id: "1".to_string(),
            name: "Tampa".to_string(),
            description: "Davis Island".to_string(),
            details: Some("Marjorie Park".to_string()),
        });
        assert_eq!(location.id, "1");
        assert_eq!(location.details.as_deref(), Some("Marjorie Park"));
    }

    #[test]
    fn test_build_vessels_requires_id_and_name_and_dedups() {
        let entries = vec![
            entry(Some("345"), Some("Reel Time"), Some("21' Bay Boat")),
            entry(Some("345"), Some("Reel Time"), Some("21' Bay Boat")),
            entry(Some("346"), None, None),
            entry(None, Some("Ghost"), None),
            entry(Some("347"), Some("Sea Breeze"), Some("22' Bennington Pontoon")),
        ];
        let vessels = build_vessels(&entries);
        let ids: Vec<&str> = vessels.iter().map(|vessel| vessel.id.as_str()).collect();
        assert_eq!(ids, ["345", "347"]);

        let details = vessels[1].details.as_ref().unwrap();
        assert_eq!(details.vessel_type, VesselType::Pontoon);
        assert_eq!(details.length, Some(22));
    }

    #[test]
    fn test_incomplete_vessel_entries_ignores_repeats() {
        let entries = vec![
            entry(Some("345"), Some("Reel Time"), None),
            entry(Some("345"), Some("Reel Time"), None),
            entry(Some("345"), Some("Reel Time"), None),
            entry(Some("346"), None, None),
        ];
        assert_eq!(build_vessels(&entries).len(), 1);
        assert_eq!(incomplete_vessel_entries(&entries), 1);
    }

    #[test]
    fn test_vessel_or_placeholder() {
        let vessels = build_vessels(&[entry(Some("345"), Some("Reel Time"), None)]);
        assert_eq!(
            vessel_or_placeholder(&vessels, "345").name.as_deref(),
            Some("Reel Time")
        );
        assert_eq!(vessel_or_placeholder(&vessels, "999"), Vessel::placeholder("999"));
    }

    #[test]
    fn test_recognized_classifications_filters_unknown() {
        let records = vec![
            ClassificationRecord {
                id: "9".to_string(),
                name: "Sailing".to_string(),
            },
            ClassificationRecord {
                id: "6".to_string(),
                name: "Fishing & Cruising".to_string(),
            },
            ClassificationRecord {
                id: "6".to_string(),
                name: "Fishing & Cruising".to_string(),
            },
        ];
        assert_eq!(
            recognized_classifications(&records),
            vec![Classification::FishingCruising]
        );
        assert!(recognized_classifications(&[]).is_empty());
    }

    #[test]
    fn test_member_reservation_is_owned() {
        let record = MemberReservationRecord {
            reservation_id: Some("R-77".to_string()),
            location_id: "1".to_string(),
            vessel_id: "345".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 7, 8).unwrap(),
            slot: Availability::Pm,
            location_name: Some("Tampa".to_string()),
            vessel_name: None,
        };
        let reservation = member_reservation(record);
        assert!(reservation.is_own);
        assert_eq!(reservation.id, "R-77");
        assert_eq!(reservation.location.name, "Tampa");
        assert_eq!(reservation.vessel, Vessel::placeholder("345"));
        assert_eq!(reservation.available, Availability::Pm);
    }

    #[test]
    fn test_member_reservation_without_id_uses_derived_id() {
        let record = MemberReservationRecord {
            reservation_id: None,
            location_id: "1".to_string(),
            vessel_id: "345".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 7, 8).unwrap(),
            slot: Availability::Full,
            location_name: None,
            vessel_name: Some("Reel Time".to_string()),
        };
        let reservation = member_reservation(record);
        assert_eq!(reservation.id, "reservation:1:345");
        assert_eq!(reservation.location, Location::placeholder("1"));
    }
}
