//! Record extraction from the portal's HTML fragments.
//!
//! The legacy pages carry no ids in `id`/`data-*` attributes; instead every
//! clickable element calls a page function with the record id as its first
//! argument (`selectLocation(12)`, `checkAvailability(345, '2023-07-08')`).
//! Selectors find those elements by the function name in `onclick`, the
//! regexes below pull the arguments back out, and the element text supplies
//! the human-readable label.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::model::Availability;
use crate::patterns::{compile_static_regex, compile_static_selector, normalize_whitespace};

use super::Extracted;

static LOCATION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"[onclick*="selectLocation"]"#));
static CLASSIFICATION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"[onclick*="selectClassification"]"#));
static VESSEL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"[onclick*="checkAvailability"]"#));
static VESSEL_NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".vessel-name, .boat-name"));
static VESSEL_DESCRIPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".vessel-description, .boat-description"));
static RESERVE_BUTTON_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"[onclick*="makeReservation"]"#));
static MEMBER_RESERVATION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"[onclick*="viewReservation"]"#));

/// First call argument when it is numeric, quoted or not: `fn(12`, `fn('12'`.
static FIRST_ARG_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"\(\s*['"]?(\d+)['"]?\s*[,)]"#));
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\b(\d{4}-\d{2}-\d{2})\b"));
static DETAILS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^(.*?)\s*\(([^()]*)\)\s*$"));
static AM_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)\bam\b|\bmorning\b"));
static PM_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)\bpm\b|\bafternoon\b"));
static MEMBER_RESERVATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"viewReservation\(\s*['"]?(\d+)['"]?\s*,\s*['"]?(\d+)['"]?\s*,\s*['"](\d{4}-\d{2}-\d{2})['"]\s*(?:,\s*['"]([A-Za-z ]+)['"])?"#,
    )
});

/// Separator between the name and description halves of a label.
const LABEL_SEPARATOR: &str = " - ";

/// A location row from the availability page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub details: Option<String>,
}

/// A classification candidate as offered by the portal, not yet filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRecord {
    pub id: String,
    pub name: String,
}

/// A vessel row from the fleet listing. Every field is optional; callers
/// decide which are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VesselEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Bookable half-day slots found in an availability-check fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotFlags {
    pub am: bool,
    pub pm: bool,
}

impl SlotFlags {
    #[must_use]
    pub fn availability(self) -> Availability {
        Availability::from_slots(self.am, self.pm)
    }
}

/// One of the member's own bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReservationRecord {
    pub reservation_id: Option<String>,
    pub location_id: String,
    pub vessel_id: String,
    pub date: NaiveDate,
    pub slot: Availability,
    pub location_name: Option<String>,
    pub vessel_name: Option<String>,
}

/// Extracts the location list from the availability page.
///
/// A label `Tampa - Davis Island (Marjorie Park)` yields name `Tampa`,
/// description `Davis Island` and details `Marjorie Park`. Elements without a
/// numeric id or a name are skipped.
#[must_use]
pub fn extract_locations(html: &str) -> Extracted<LocationRecord> {
    let document = Html::parse_fragment(html);
    let mut out = Extracted::default();

    for element in document.select(&LOCATION_SELECTOR) {
        let Some(id) = onclick_id(element) else {
            debug!("skipping location element without id");
            out.skip();
            continue;
        };
        let label = element_text(element);
        let (base, details) = split_details(&label);
        let (name, description) = split_label(base);
        if name.is_empty() {
            debug!(id = %id, "skipping location element without name");
            out.skip();
            continue;
        }

        out.items.push(LocationRecord {
            id,
            name: name.to_string(),
            description: description.unwrap_or_default().to_string(),
            details,
        });
    }

    out
}

/// Extracts classification candidates from the classification fragment.
#[must_use]
pub fn extract_classifications(html: &str) -> Extracted<ClassificationRecord> {
    let document = Html::parse_fragment(html);
    let mut out = Extracted::default();

    for element in document.select(&CLASSIFICATION_SELECTOR) {
        let id = onclick_id(element);
        let name = element_text(element);
        match id {
            Some(id) if !name.is_empty() => out.items.push(ClassificationRecord { id, name }),
            _ => {
                debug!(name = %name, "skipping classification element without id or name");
                out.skip();
            }
        }
    }

    out
}

/// Extracts vessel rows from the (already unwrapped) fleet listing.
///
/// The name and description come from `.vessel-name` / `.vessel-description`
/// children when present, otherwise from splitting the row label.
#[must_use]
pub fn extract_vessel_entries(html: &str) -> Vec<VesselEntry> {
    let document = Html::parse_fragment(html);

    document
        .select(&VESSEL_SELECTOR)
        .map(|element| {
            let onclick = element.value().attr("onclick").unwrap_or_default();
            let date = ISO_DATE_RE
                .captures(onclick)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .or_else(|| element.value().attr("data-date"))
                .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());

            let child_name = first_child_text(element, &VESSEL_NAME_SELECTOR);
            let child_description = first_child_text(element, &VESSEL_DESCRIPTION_SELECTOR);
            let (name, description) = if child_name.is_some() || child_description.is_some() {
                (child_name, child_description)
            } else {
                let label = element_text(element);
                let (name, description) = split_label(&label);
                (non_empty(name), description.and_then(non_empty))
            };

            VesselEntry {
                id: onclick_id(element),
                name,
                description,
                date,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Am,
    Pm,
    WholeDay,
}

/// Reads the reservation buttons of an availability-check fragment.
///
/// Weekends show two buttons (AM and PM), weekdays a single whole-day button
/// that sets both flags. A button that is `disabled` is not bookable; a slot
/// without a button is not bookable either.
#[must_use]
pub fn extract_slots(html: &str) -> SlotFlags {
    let document = Html::parse_fragment(html);
    let buttons: Vec<(SlotKind, bool)> = document
        .select(&RESERVE_BUTTON_SELECTOR)
        .map(|element| (slot_kind(element), is_bookable(element)))
        .collect();

    let positional =
        buttons.len() == 2 && buttons.iter().all(|(kind, _)| *kind == SlotKind::WholeDay);

    let mut flags = SlotFlags::default();
    for (index, (kind, bookable)) in buttons.into_iter().enumerate() {
        if !bookable {
            continue;
        }
        let kind = if positional {
            if index == 0 { SlotKind::Am } else { SlotKind::Pm }
        } else {
            kind
        };
        match kind {
            SlotKind::Am => flags.am = true,
            SlotKind::Pm => flags.pm = true,
            SlotKind::WholeDay => {
                flags.am = true;
                flags.pm = true;
            }
        }
    }

    flags
}

/// Extracts the member's own bookings from the reservations page.
#[must_use]
pub fn extract_member_reservations(html: &str) -> Extracted<MemberReservationRecord> {
    let document = Html::parse_fragment(html);
    let mut out = Extracted::default();

    for element in document.select(&MEMBER_RESERVATION_SELECTOR) {
        let onclick = element.value().attr("onclick").unwrap_or_default();
        let Some(caps) = MEMBER_RESERVATION_RE.captures(onclick) else {
            debug!(onclick = %onclick, "skipping reservation element with unparsable onclick");
            out.skip();
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(&caps[3], "%Y-%m-%d") else {
            debug!(date = %&caps[3], "skipping reservation element with invalid date");
            out.skip();
            continue;
        };
        let slot = caps
            .get(4)
            .and_then(|m| Availability::from_label(m.as_str()))
            .unwrap_or(Availability::Full);

        let label = element_text(element);
        let (location_name, vessel_name) = split_label(&label);

        out.items.push(MemberReservationRecord {
            reservation_id: element
                .value()
                .attr("data-reservation-id")
                .map(str::trim)
                .and_then(non_empty),
            location_id: caps[1].to_string(),
            vessel_id: caps[2].to_string(),
            date,
            slot,
            location_name: non_empty(location_name),
            vessel_name: vessel_name.and_then(non_empty),
        });
    }

    out
}

fn onclick_id(element: ElementRef<'_>) -> Option<String> {
    let onclick = element.value().attr("onclick")?;
    FIRST_ARG_ID_RE
        .captures(onclick)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn first_child_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(element_text)
        .and_then(|text| non_empty(&text))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Splits a trailing `( ... )` off a label.
fn split_details(label: &str) -> (&str, Option<String>) {
    match DETAILS_RE.captures(label) {
        Some(caps) => {
            let base = caps.get(1).map_or("", |m| m.as_str());
            let details = caps.get(2).and_then(|m| non_empty(m.as_str()));
            (base, details)
        }
        None => (label, None),
    }
}

/// Splits on the first ` - ` into name and optional description.
fn split_label(label: &str) -> (&str, Option<&str>) {
    match label.split_once(LABEL_SEPARATOR) {
        Some((name, description)) => (name.trim(), Some(description.trim())),
        None => (label.trim(), None),
    }
}

fn slot_kind(element: ElementRef<'_>) -> SlotKind {
    let attrs = element.value();
    let label = [
        element_text(element),
        attrs.attr("value").unwrap_or_default().to_string(),
        attrs.attr("title").unwrap_or_default().to_string(),
    ]
    .join(" ");

    let from_text = |text: &str| {
        let am = AM_LABEL_RE.is_match(text);
        let pm = PM_LABEL_RE.is_match(text);
        match (am, pm) {
            (true, false) => Some(SlotKind::Am),
            (false, true) => Some(SlotKind::Pm),
            _ => None,
        }
    };

    from_text(&label)
        .or_else(|| from_text(attrs.attr("onclick").unwrap_or_default()))
        .unwrap_or(SlotKind::WholeDay)
}

fn is_bookable(element: ElementRef<'_>) -> bool {
    let attrs = element.value();
    attrs.attr("disabled").is_none() && !attrs.classes().any(|class| class == "disabled")
}
