//! Best-effort city/state extraction from free-text postal addresses.
//!
//! Handles the shapes lead exports commonly produce:
//! - `210 25th Ave N Suite 810, Nashville, TN 37203, United States`
//! - `1300 Burtonwood Cir, Charlotte, NC 28212`
//! - `Charlotte, NC`
//! - `Phoenix AZ 85001` (no commas)
//!
//! Parsing never fails; anything unrecognized yields `None` fields.

use regex::Regex;
use std::sync::OnceLock;

/// Placeholder some exports use for a missing address.
const NULL_PLACEHOLDER: &str = "\\N";

const STATE_CODES: &[(&str, &str)] = &[
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

/// A resolved (or partially resolved) location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Location {
    fn new(city: Option<&str>, state: &str) -> Self {
        Self {
            city: city.map(str::to_string),
            state: Some(state.to_uppercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none()
    }
}

/// A whole segment that is a state code, optionally followed by a ZIP.
fn state_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([a-z]{2})(?:\s+\d{5}(?:-\d{4})?)?$").expect("valid state segment regex")
    })
}

fn country_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:united states|usa|us)\b").expect("valid country regex")
    })
}

/// `<words> <ST> [zip]` at the end of an address without commas.
fn space_separated_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([a-z][a-z\s]*?)\s+([a-z]{2})(?:\s+\d{5}(?:-\d{4})?)?\s*$")
            .expect("valid space-separated address regex")
    })
}

fn match_state_segment(segment: &str) -> Option<String> {
    state_segment_re()
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// Parse a free-text address into a best-effort city and state.
pub fn parse_address(address: Option<&str>) -> Location {
    let Some(address) = address else {
        return Location::default();
    };
    if address.trim().is_empty() || address == NULL_PLACEHOLDER {
        return Location::default();
    }

    if let Some(location) = parse_comma_separated(address) {
        return location;
    }

    if let Some(caps) = space_separated_re().captures(address) {
        let city = caps[1].trim();
        if !city.is_empty() {
            return Location::new(Some(city), &caps[2]);
        }
    }

    Location::default()
}

fn parse_comma_separated(address: &str) -> Option<Location> {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return None;
    }

    // Street, City, ST ZIP[, Country]: the state segment sits before the last one
    if parts.len() >= 3 {
        for i in (0..parts.len() - 1).rev() {
            if let Some(state) = match_state_segment(parts[i]) {
                let city = if i > 0 { Some(parts[i - 1]) } else { None };
                return Some(Location::new(city, &state));
            }
        }
    }

    let last = parts[parts.len() - 1];
    // ST ZIP, Country: only reachable with two segments, longer inputs were scanned above
    if country_re().is_match(last) {
        let state = match_state_segment(parts[parts.len() - 2])?;
        let city = parts.len().checked_sub(3).map(|i| parts[i]);
        return Some(Location::new(city, &state));
    }

    let mut chars = last.chars();
    let state = match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
            format!("{}{}", a, b)
        }
        _ => return None,
    };
    let city = parts[parts.len() - 2];
    if city.is_empty() {
        return None;
    }
    Some(Location::new(Some(city), &state))
}

/// Normalize a state name to its 2-letter code.
///
/// Two-character input is uppercased as-is. Full names are looked up
/// case-insensitively; unknown names come back uppercased.
pub fn normalize_state_name(state: &str) -> String {
    let trimmed = state.trim();
    if trimmed.chars().count() == 2 {
        return trimmed.to_uppercase();
    }
    let lower = trimmed.to_lowercase();
    STATE_CODES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| trimmed.to_uppercase())
}

/// Combine explicit city/state values with whatever the address yields.
///
/// Explicit non-empty values win; gaps are filled from the parsed address and
/// the state is normalized to a code.
pub fn resolve_location(
    city: Option<&str>,
    state: Option<&str>,
    address: Option<&str>,
) -> Location {
    let mut city = city.filter(|c| !c.trim().is_empty()).map(str::to_string);
    let mut state = state.filter(|s| !s.trim().is_empty()).map(str::to_string);

    if city.is_none() || state.is_none() {
        let parsed = parse_address(address);
        city = city.or(parsed.city);
        state = state.or(parsed.state);
    }

    Location {
        city,
        state: state.map(|s| normalize_state_name(&s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn loc(city: Option<&str>, state: Option<&str>) -> Location {
        Location {
            city: city.map(str::to_string),
            state: state.map(str::to_string),
        }
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert_eq!(parse_address(None), Location::default());
        assert_eq!(parse_address(Some("")), Location::default());
        assert_eq!(parse_address(Some("   ")), Location::default());
        assert_eq!(parse_address(Some("\\N")), Location::default());
    }

    #[test]
    fn street_city_state_zip() {
        assert_eq!(
            parse_address(Some("1300 Burtonwood Cir, Charlotte, NC 28212")),
            loc(Some("Charlotte"), Some("NC"))
        );
    }

    #[test]
    fn full_address_with_country() {
        assert_eq!(
            parse_address(Some("210 25th Ave N Suite 810, Nashville, TN 37203, United States")),
            loc(Some("Nashville"), Some("TN"))
        );
    }

    #[test]
    fn city_and_state_only() {
        assert_eq!(parse_address(Some("Charlotte, NC")), loc(Some("Charlotte"), Some("NC")));
        assert_eq!(
            parse_address(Some("Charlotte, nc 28212")),
            loc(Some("Charlotte"), Some("NC"))
        );
    }

    #[test]
    fn state_and_country_without_street() {
        assert_eq!(parse_address(Some("Austin, TX 78701, USA")), loc(Some("Austin"), Some("TX")));
    }

    #[test]
    fn state_zip_and_country_only() {
        assert_eq!(parse_address(Some("TX 78701, USA")), loc(None, Some("TX")));
        assert_eq!(parse_address(Some("nc, United States")), loc(None, Some("NC")));
        assert_eq!(parse_address(Some("Texas, USA")), Location::default());
    }

    #[test]
    fn space_separated_fallback() {
        assert_eq!(parse_address(Some("Phoenix AZ 85001")), loc(Some("Phoenix"), Some("AZ")));
        assert_eq!(parse_address(Some("Phoenix AZ")), loc(Some("Phoenix"), Some("AZ")));
    }

    #[test]
    fn unparseable_address() {
        assert_eq!(parse_address(Some("12345")), Location::default());
        assert_eq!(parse_address(Some("Somewhere, 90210")), Location::default());
    }

    #[test]
    fn normalize_full_names() {
        assert_eq!(normalize_state_name("North Carolina"), "NC");
        assert_eq!(normalize_state_name("west virginia"), "WV");
        assert_eq!(normalize_state_name("nc"), "NC");
        assert_eq!(normalize_state_name("Atlantis"), "ATLANTIS");
    }

    #[test]
    fn normalize_is_idempotent() {
        for (_, code) in STATE_CODES {
            assert_eq!(normalize_state_name(code), *code);
            assert_eq!(normalize_state_name(&normalize_state_name(code)), *code);
        }
    }

    #[test]
    fn resolve_prefers_explicit_fields() {
        let resolved = resolve_location(
            Some("Raleigh"),
            Some("North Carolina"),
            Some("1 Main St, Charlotte, NC 28202"),
        );
        assert_eq!(resolved, loc(Some("Raleigh"), Some("NC")));
    }

    #[test]
    fn resolve_fills_gaps_from_address() {
        let resolved = resolve_location(None, Some("tn"), Some("1 Main St, Memphis, TN 38103"));
        assert_eq!(resolved, loc(Some("Memphis"), Some("TN")));

        let resolved = resolve_location(Some(""), None, None);
        assert!(resolved.is_empty());
    }

    proptest! {
        #[test]
        fn street_city_state_zip_country_resolves(
            number in 1u32..99999,
            street in "[A-Z][a-z]{2,10} (St|Ave|Blvd|Cir)",
            city in "[A-Z][a-z]{2,12}( [A-Z][a-z]{2,8})?",
            state in "[A-Z]{2}",
            zip in "[0-9]{5}",
        ) {
            let address = format!("{} {}, {}, {} {}, United States", number, street, city, state, zip);
            let parsed = parse_address(Some(&address));
            prop_assert_eq!(parsed.city.as_deref(), Some(city.as_str()));
            prop_assert_eq!(parsed.state.as_deref(), Some(state.as_str()));
        }
    }
}
