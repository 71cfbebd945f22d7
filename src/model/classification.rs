//! Vessel-use categories defined by the portal.

use serde::{Deserialize, Serialize};

/// A vessel classification the client knows how to query.
///
/// The portal exposes more categories than are listed here; codes that do not
/// map to a variant are dropped by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Fishing and cruising boats (portal code `6`).
    #[default]
    FishingCruising,
}

impl Classification {
    /// All recognized classifications.
    pub const ALL: [Self; 1] = [Self::FishingCruising];

    /// The portal's numeric code for this classification.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::FishingCruising => "6",
        }
    }

    /// Maps a portal code to a classification, `None` when unrecognized.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|classification| classification.code() == code.trim())
    }
}

impl std::str::FromStr for Classification {
    type Err = String;

    /// Accepts either the portal code (`6`) or the variant name
    /// (`FISHING_CRUISING`, case-insensitive).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(classification) = Self::from_code(value) {
            return Ok(classification);
        }
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "FISHING_CRUISING" => Ok(Self::FishingCruising),
            other => Err(format!("unknown classification '{other}'")),
        }
    }
}
