//! Vessels and the details recovered from their free-text descriptions.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::patterns::compile_static_regex;

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)\b(\d{1,3})\s*(?:'|’|-?ft\b|-?foot\b|feet\b)")
});
static ENGINE_HP_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)\b(\d{2,4})\s*-?\s*hp\b"));
static BIMINI_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?i)\bbimini\b"));
static LIVEWELL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)\blive\s*-?\s*well\b"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineManufacturer {
    Mercury,
    Yamaha,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VesselManufacturer {
    Bennington,
    Mercury,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VesselType {
    Bay,
    Kayak,
    Pontoon,
    Paddleboard,
    #[default]
    Unknown,
}

/// Attributes pattern-matched out of a vessel description.
///
/// Every field has a documented default (`false`, `None` or `Unknown`), so a
/// description that matches nothing still yields a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VesselDetails {
    pub bimini: bool,
    pub engine_hp: Option<u32>,
    pub engine_manufacturer: EngineManufacturer,
    /// Overall length in feet.
    pub length: Option<u32>,
    pub livewell: bool,
    pub manufacturer: VesselManufacturer,
    pub vessel_type: VesselType,
}

impl VesselDetails {
    /// Best-effort parse of a listing description such as
    /// `"21' Bay Boat, Yamaha 150 HP, Bimini, Livewell"`.
    #[must_use]
    pub fn from_description(description: &str) -> Self {
        let lower = description.to_ascii_lowercase();

        Self {
            bimini: BIMINI_RE.is_match(description),
            engine_hp: first_number(&ENGINE_HP_RE, description),
            engine_manufacturer: engine_manufacturer(&lower),
            length: first_number(&LENGTH_RE, description),
            livewell: LIVEWELL_RE.is_match(description),
            manufacturer: vessel_manufacturer(&lower),
            vessel_type: vessel_type(&lower),
        }
    }
}

fn first_number(regex: &Regex, haystack: &str) -> Option<u32> {
    regex
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn engine_manufacturer(lower: &str) -> EngineManufacturer {
    if lower.contains("yamaha") {
        EngineManufacturer::Yamaha
    } else if lower.contains("mercury") || lower.contains("merc ") {
        EngineManufacturer::Mercury
    } else {
        EngineManufacturer::Unknown
    }
}

fn vessel_manufacturer(lower: &str) -> VesselManufacturer {
    if lower.contains("bennington") {
        VesselManufacturer::Bennington
    } else if lower.contains("mercury") && !lower.contains("hp") {
        // "Mercury 115 HP" names the engine, not the hull.
        VesselManufacturer::Mercury
    } else {
        VesselManufacturer::Unknown
    }
}

fn vessel_type(lower: &str) -> VesselType {
    let has_word = |word: &str| {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|w| w == word)
    };

    if lower.contains("paddleboard") || lower.contains("paddle board") || has_word("sup") {
        VesselType::Paddleboard
    } else if lower.contains("kayak") {
        VesselType::Kayak
    } else if lower.contains("pontoon") || lower.contains("tritoon") {
        VesselType::Pontoon
    } else if has_word("bay") {
        VesselType::Bay
    } else {
        VesselType::Unknown
    }
}

/// A boat in the club fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: String,
    pub name: Option<String>,
    pub details: Option<VesselDetails>,
}

impl Vessel {
    /// Builds a vessel, deriving details from `description` when present.
    #[must_use]
    pub fn new(id: impl Into<String>, name: Option<String>, description: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name,
            details: description.map(VesselDetails::from_description),
        }
    }

    /// Minimal vessel used when the fleet listing has no entry for `id`.
    #[must_use]
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            details: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_details_from_full_description() {
        let details =
            VesselDetails::from_description("21' Bay Boat, Yamaha 150 HP, Bimini Top, Livewell");
        assert_eq!(details.length, Some(21));
        assert_eq!(details.engine_hp, Some(150));
        assert_eq!(details.engine_manufacturer, EngineManufacturer::Yamaha);
        assert_eq!(details.vessel_type, VesselType::Bay);
        assert!(details.bimini);
        assert!(details.livewell);
        assert_eq!(details.manufacturer, VesselManufacturer::Unknown);
    }

    #[test]
    fn test_details_pontoon_with_feet_suffix() {
        let details = VesselDetails::from_description("Bennington 22 ft Pontoon, Mercury 115hp");
        assert_eq!(details.length, Some(22));
        assert_eq!(details.engine_hp, Some(115));
        assert_eq!(details.manufacturer, VesselManufacturer::Bennington);
        assert_eq!(details.engine_manufacturer, EngineManufacturer::Mercury);
        assert_eq!(details.vessel_type, VesselType::Pontoon);
        assert!(!details.bimini);
        assert!(!details.livewell);
    }

    #[test]
    fn test_details_unmatched_fall_back_to_defaults() {
        let details = VesselDetails::from_description("Mystery craft");
        assert_eq!(details, VesselDetails::default());
        assert_eq!(details.vessel_type, VesselType::Unknown);
        assert_eq!(details.engine_manufacturer, EngineManufacturer::Unknown);
    }

    #[test]
    fn test_details_live_well_spelled_apart() {
        assert!(VesselDetails::from_description("Center console, live well").livewell);
    }

    #[test]
    fn test_vessel_new_derives_details_only_with_description() {
        let with = Vessel::new("12", Some("Reel Time".to_string()), Some("19' Bay"));
        assert_eq!(with.details.and_then(|d| d.length), Some(19));

        let without = Vessel::new("12", None, None);
        assert!(without.details.is_none());
    }

    #[test]
    fn test_placeholder_has_only_id() {
        let vessel = Vessel::placeholder("99");
        assert_eq!(vessel.id, "99");
        assert!(vessel.name.is_none());
        assert!(vessel.details.is_none());
    }

    #[test]
    fn test_enum_serialization_labels() {
        let json = serde_json::to_string(&VesselType::Paddleboard).unwrap();
        assert_eq!(json, "\"PADDLEBOARD\"");
        let json = serde_json::to_string(&EngineManufacturer::Unknown).unwrap();
        assert_eq!(json, "\"UNKNOWN\"");
    }
}
