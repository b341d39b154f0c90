//! Mapping of raw lead exports onto canonical company records.
//!
//! Exports come from several scrapers with different key names; the first
//! non-empty value among the known aliases wins.

use serde_json::{Map, Value};

use super::StoreError;
use crate::address::resolve_location;
use crate::models::Company;

pub type RawItem = Map<String, Value>;

/// Validate an import file: it must be a JSON array of objects.
pub fn parse_import(text: &str) -> Result<Vec<RawItem>, StoreError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(StoreError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject { index }),
        })
        .collect()
}

/// First non-empty string among `keys`. Numbers are accepted and stringified.
fn first_text(item: &RawItem, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Non-zero number, also accepting numeric strings.
fn number(item: &RawItem, key: &str) -> Option<f64> {
    match item.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| *n != 0.0 && n.is_finite())
}

/// Build a new record from one raw import item.
pub fn company_from_raw(item: &RawItem) -> Company {
    let title = first_text(item, &["title", "name"]).unwrap_or_else(|| "Unknown Company".to_string());
    let mut company = Company::new(title);

    company.phone = first_text(item, &["phone", "phoneNumber", "internationalPhoneNumber"]);
    company.website = first_text(item, &["website"]);
    company.email = first_text(item, &["email"]);
    company.contact_name = first_text(item, &["contactName"]);

    let address = first_text(item, &["address"]);
    let location = resolve_location(
        first_text(item, &["city"]).as_deref(),
        first_text(item, &["state"]).as_deref(),
        address.as_deref(),
    );
    company.city = location.city;
    company.state = location.state;

    company.rating = number(item, "rating");
    company.total_ratings = number(item, "totalRatings")
        .filter(|n| *n > 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
        .map(|n| n as u64);
    company.business_status = first_text(item, &["businessStatus", "status"]);
    company.google_maps_url = first_text(item, &["googleMapsUrl"]);
    company.place_id = first_text(item, &["placeId"]);
    company.original_data = Value::Object(item.clone());

    company
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawItem {
        match value {
            Value::Object(map) => map,
            _ => panic!("test item must be an object"),
        }
    }

    #[test]
    fn parse_rejects_non_arrays() {
        assert!(matches!(parse_import("{\"title\": \"Acme\"}"), Err(StoreError::NotAnArray)));
        assert!(matches!(parse_import("[{}, 3]"), Err(StoreError::NotAnObject { index: 1 })));
        assert!(matches!(parse_import("[{"), Err(StoreError::Json(_))));
        assert_eq!(parse_import("[]").unwrap().len(), 0);
    }

    #[test]
    fn new_format_fields() {
        let item = raw(json!({
            "title": "Queen City Plumbing",
            "phone": "(704) 555-0100",
            "address": "1300 Burtonwood Cir, Charlotte, NC 28212",
            "rating": 4.6,
            "totalRatings": 128,
            "businessStatus": "OPERATIONAL",
            "googleMapsUrl": "https://maps.google.com/?cid=1",
            "placeId": "ChIJ123",
            "extra": "ignored"
        }));
        let company = company_from_raw(&item);

        assert_eq!(company.title.as_deref(), Some("Queen City Plumbing"));
        assert_eq!(company.phone.as_deref(), Some("(704) 555-0100"));
        assert_eq!(company.city.as_deref(), Some("Charlotte"));
        assert_eq!(company.state.as_deref(), Some("NC"));
        assert_eq!(company.rating, Some(4.6));
        assert_eq!(company.total_ratings, Some(128));
        assert_eq!(company.business_status.as_deref(), Some("OPERATIONAL"));
        assert_eq!(company.place_id.as_deref(), Some("ChIJ123"));
        assert_eq!(company.notes, "");
        assert!(company.disposition.is_none());
        assert_eq!(company.original_data, Value::Object(item));
    }

    #[test]
    fn old_format_fallbacks() {
        let company = company_from_raw(&raw(json!({
            "name": "Desert Roofing",
            "phone": "",
            "phoneNumber": null,
            "internationalPhoneNumber": "+1 602-555-0199",
            "status": "CLOSED_TEMPORARILY",
            "city": "Phoenix",
            "state": "Arizona",
            "rating": 0
        })));

        assert_eq!(company.title.as_deref(), Some("Desert Roofing"));
        assert_eq!(company.phone.as_deref(), Some("+1 602-555-0199"));
        assert_eq!(company.business_status.as_deref(), Some("CLOSED_TEMPORARILY"));
        assert_eq!(company.city.as_deref(), Some("Phoenix"));
        assert_eq!(company.state.as_deref(), Some("AZ"));
        assert_eq!(company.rating, None);
    }

    #[test]
    fn missing_title_and_address() {
        let company = company_from_raw(&raw(json!({"address": "\\N"})));
        assert_eq!(company.title.as_deref(), Some("Unknown Company"));
        assert!(company.city.is_none());
        assert!(company.state.is_none());
    }

    #[test]
    fn review_counts_must_be_whole_and_positive() {
        let count = |v: Value| company_from_raw(&raw(json!({"title": "Acme", "totalRatings": v}))).total_ratings;
        assert_eq!(count(json!(-5)), None);
        assert_eq!(count(json!(12.5)), None);
        assert_eq!(count(json!("40")), Some(40));
        assert_eq!(count(json!(7.0)), Some(7));
    }
}
