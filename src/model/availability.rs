//! Slot availability for one vessel on one date.

use serde::{Deserialize, Serialize};

/// Bookable state of a vessel's half-day slots.
///
/// The portal splits a day into a morning (AM) and an afternoon (PM) slot.
/// Weekdays usually expose a single whole-day slot, which counts as both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    /// Only the morning slot is bookable.
    Am,
    /// Only the afternoon slot is bookable.
    Pm,
    /// Both slots (or the whole-day slot) are bookable.
    Full,
    /// Nothing is bookable.
    None,
    /// Mixed availability across several vessels or dates.
    Some,
}

impl Availability {
    /// Derives availability from the two slot flags.
    ///
    /// Precedence: both → `Full`, AM only → `Am`, PM only → `Pm`,
    /// neither → `None`.
    #[must_use]
    pub fn from_slots(am: bool, pm: bool) -> Self {
        match (am, pm) {
            (true, true) => Self::Full,
            (true, false) => Self::Am,
            (false, true) => Self::Pm,
            (false, false) => Self::None,
        }
    }

    /// Returns true for anything other than [`Availability::None`].
    #[must_use]
    pub fn has_availability(self) -> bool {
        self != Self::None
    }

    /// Folds several availabilities into one summary value.
    ///
    /// An empty input or all-`None` input is `None`; identical values collapse
    /// to that value; anything mixed is `Some`.
    #[must_use]
    pub fn summarize<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return Self::None;
        };
        if iter.all(|value| value == first) {
            first
        } else {
            Self::Some
        }
    }

    /// Stable label matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
            Self::Full => "FULL",
            Self::None => "NONE",
            Self::Some => "SOME",
        }
    }

    /// Parses the label used in member reservation markup (`AM`, `PM`, `FULL`).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "AM" => Some(Self::Am),
            "PM" => Some(Self::Pm),
            "FULL" | "FULL DAY" | "WHOLE DAY" => Some(Self::Full),
            "NONE" => Some(Self::None),
            "SOME" => Some(Self::Some),
            _ => None,
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
