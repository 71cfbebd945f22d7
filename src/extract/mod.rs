//! Markup extraction for portal responses.
//!
//! The portal answers with HTML fragments, some of them wrapped in an XML
//! envelope. This module turns those bodies into flat records; it does no I/O
//! and knows nothing about sessions.
//!
//! - [`envelope`] - recovers the HTML carried inside the XML envelope
//! - [`records`] - selector/regex extraction of locations, classifications,
//!   vessel rows, reservation buttons and member bookings
//!
//! Extraction tolerates partial data: an element without the fields a record
//! needs is skipped and counted in [`Extracted::skipped`] rather than failing
//! the whole response.

pub mod envelope;
mod error;
pub mod records;

pub use envelope::{html_payload, unwrap_envelope};
pub use error::ExtractError;
pub use records::{
    ClassificationRecord, LocationRecord, MemberReservationRecord, SlotFlags, VesselEntry,
    extract_classifications, extract_locations, extract_member_reservations, extract_slots,
    extract_vessel_entries,
};

/// Records extracted from a body plus the number of elements dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    /// Valid records in document order.
    pub items: Vec<T>,
    /// Candidate elements skipped for missing fields.
    pub skipped: usize,
}

impl<T> Default for Extracted<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> Extracted<T> {
    pub(crate) fn skip(&mut self) {
        self.skipped += 1;
    }
}
