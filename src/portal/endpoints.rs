//! Legacy portal endpoints.
//!
//! Paths are owned by the third-party site and change without notice; keep
//! them here so a markup or routing change is a one-file fix.

/// Production portal origin.
pub const DEFAULT_BASE_URL: &str = "https://boatreservations.freedomboatclub.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Landing page; used to seed cookies.
    Home,
    /// JSON login: `{ email, password, remember_user }`.
    Login,
    /// Availability page listing the member's locations.
    AvailabilityPage,
    /// Per-vessel availability check (urlencoded POST, HTML buttons back).
    CheckAvailability,
    /// Vessel classifications for a location (urlencoded POST).
    Classifications,
    /// All vessels at a location for a date (urlencoded POST, XML envelope back).
    FleetListing,
    /// The member's own bookings.
    MemberReservations,
}

impl Endpoint {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/rest-api/login/",
            Self::AvailabilityPage => "/reservations/availability.php",
            Self::CheckAvailability => "/ajax/check_availability.php",
            Self::Classifications => "/ajax/classifications.php",
            Self::FleetListing => "/ajax/boats.php",
            Self::MemberReservations => "/reservations/my_reservations.php",
        }
    }

    /// Page an action is posted from; sent as `Referer`.
    #[must_use]
    pub fn referer(self) -> Self {
        match self {
            Self::CheckAvailability | Self::Classifications | Self::FleetListing => {
                Self::AvailabilityPage
            }
            Self::Login => Self::Home,
            other => other,
        }
    }
}
