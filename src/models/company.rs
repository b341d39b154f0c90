use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outcome of the last call placed to a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    NotAvailable,
    NotInterested,
    Voicemail,
    WrongNumber,
    CallBack,
    Sold,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAvailable => "not-available",
            Self::NotInterested => "not-interested",
            Self::Voicemail => "voicemail",
            Self::WrongNumber => "wrong-number",
            Self::CallBack => "call-back",
            Self::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "not-available" => Some(Self::NotAvailable),
            "not-interested" => Some(Self::NotInterested),
            "voicemail" => Some(Self::Voicemail),
            "wrong-number" => Some(Self::WrongNumber),
            "call-back" | "callback" => Some(Self::CallBack),
            "sold" => Some(Self::Sold),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotAvailable => "Not Available",
            Self::NotInterested => "Not Interested",
            Self::Voicemail => "Voicemail",
            Self::WrongNumber => "Wrong Number",
            Self::CallBack => "Call Back",
            Self::Sold => "Sold",
        }
    }

    /// Dispositions in dialer shortcut order (1-6).
    pub fn all() -> &'static [Disposition] {
        &[
            Self::NotAvailable,
            Self::NotInterested,
            Self::Voicemail,
            Self::WrongNumber,
            Self::CallBack,
            Self::Sold,
        ]
    }

    /// Whether setting this disposition moves the dialer to the next lead.
    pub fn auto_advances(&self) -> bool {
        matches!(self, Self::Voicemail | Self::WrongNumber)
    }
}

/// Status label shown for a lead, "Not Called" when no disposition is set.
pub fn status_label(disposition: Option<Disposition>) -> &'static str {
    disposition.map(|d| d.label()).unwrap_or("Not Called")
}

/// A sales lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub disposition: Option<Disposition>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub total_ratings: Option<u64>,
    #[serde(default)]
    pub business_status: Option<String>,
    #[serde(default)]
    pub google_maps_url: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub original_data: Value,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.unwrap_or_default())
}

impl Company {
    pub fn new(title: String) -> Self {
        Self {
            id: Self::generate_id(),
            title: Some(title),
            phone: None,
            website: None,
            email: None,
            contact_name: None,
            city: None,
            state: None,
            disposition: None,
            notes: String::new(),
            rating: None,
            total_ratings: None,
            business_status: None,
            google_maps_url: None,
            place_id: None,
            original_data: Value::Null,
        }
    }

    pub fn generate_id() -> String {
        format!("company_{}", Uuid::new_v4().simple())
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Company")
    }

    /// A string field of the source object, if present and non-empty.
    pub fn original_str(&self, key: &str) -> Option<&str> {
        self.original_data
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// The source address, ignoring the `\N` placeholder.
    pub fn original_address(&self) -> Option<&str> {
        self.original_str("address").filter(|a| *a != "\\N")
    }

    pub fn location(&self) -> Option<String> {
        match (&self.city, &self.state) {
            (Some(c), Some(s)) => Some(format!("{}, {}", c, s)),
            (Some(c), None) => Some(c.clone()),
            (None, Some(s)) => Some(s.clone()),
            (None, None) => None,
        }
    }

    pub fn field(&self, field: EditableField) -> Option<&str> {
        match field {
            EditableField::Phone => self.phone.as_deref(),
            EditableField::Website => self.website.as_deref(),
            EditableField::Email => self.email.as_deref(),
            EditableField::Contact => self.contact_name.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: EditableField, value: Option<String>) {
        let slot = match field {
            EditableField::Phone => &mut self.phone,
            EditableField::Website => &mut self.website,
            EditableField::Email => &mut self.email,
            EditableField::Contact => &mut self.contact_name,
        };
        *slot = value;
    }
}

/// Contact fields that can be edited after import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Phone,
    Website,
    Email,
    Contact,
}

impl EditableField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Website => "website",
            Self::Email => "email",
            Self::Contact => "contact",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "phone" => Some(Self::Phone),
            "website" | "url" => Some(Self::Website),
            "email" => Some(Self::Email),
            "contact" | "contactname" | "contact_name" => Some(Self::Contact),
            _ => None,
        }
    }

    pub fn all() -> &'static [EditableField] {
        &[Self::Phone, Self::Website, Self::Email, Self::Contact]
    }
}

/// Status part of a directory filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    NotCalled,
    Is(Disposition),
}

impl StatusFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(Self::All),
            "not-called" | "not_called" | "uncalled" => Some(Self::NotCalled),
            other => Disposition::parse(other).map(Self::Is),
        }
    }

    pub fn matches(&self, disposition: Option<Disposition>) -> bool {
        match self {
            Self::All => true,
            Self::NotCalled => disposition.is_none(),
            Self::Is(d) => disposition == Some(*d),
        }
    }
}

/// Directory filter: status, city and state must all match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub status: StatusFilter,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl CompanyFilter {
    pub fn matches(&self, company: &Company) -> bool {
        self.status.matches(company.disposition)
            && self
                .city
                .as_ref()
                .map_or(true, |c| company.city.as_ref() == Some(c))
            && self
                .state
                .as_ref()
                .map_or(true, |s| company.state.as_ref() == Some(s))
    }

    pub fn is_empty(&self) -> bool {
        self.status == StatusFilter::All && self.city.is_none() && self.state.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disposition_wire_names() {
        for d in Disposition::all() {
            let encoded = serde_json::to_value(d).unwrap();
            assert_eq!(encoded, json!(d.as_str()));
            assert_eq!(Disposition::parse(d.as_str()), Some(*d));
        }
        assert_eq!(Disposition::parse("WRONG_NUMBER"), Some(Disposition::WrongNumber));
        assert_eq!(Disposition::parse("maybe"), None);
    }

    #[test]
    fn unknown_disposition_is_rejected() {
        let result: Result<Company, _> =
            serde_json::from_value(json!({"id": "c1", "disposition": "hung-up"}));
        assert!(result.is_err());
    }

    #[test]
    fn null_notes_become_empty() {
        let company: Company =
            serde_json::from_value(json!({"id": "c1", "title": "Acme", "notes": null})).unwrap();
        assert_eq!(company.notes, "");
        assert!(company.disposition.is_none());
        assert_eq!(company.original_data, Value::Null);
    }

    #[test]
    fn camel_case_fields() {
        let mut company = Company::new("Acme".to_string());
        company.contact_name = Some("Pat".to_string());
        company.google_maps_url = Some("https://maps.example/acme".to_string());
        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["contactName"], json!("Pat"));
        assert_eq!(value["googleMapsUrl"], json!("https://maps.example/acme"));
        assert_eq!(value["notes"], json!(""));
    }

    #[test]
    fn ratings_survive_json_exactly() {
        for rating in [4.090909090909091, 0.09090909090909091, 0.15384615384615385, 7.0 / 13.0] {
            let mut company = Company::new("Acme".to_string());
            company.rating = Some(rating);
            company.original_data = json!({"title": "Acme", "rating": rating});

            let text = serde_json::to_string(&company).unwrap();
            let decoded: Company = serde_json::from_str(&text).unwrap();
            assert_eq!(decoded.rating.map(f64::to_bits), Some(rating.to_bits()));
            assert_eq!(decoded, company);
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Company::new("A".to_string());
        let b = Company::new("B".to_string());
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("company_"));
    }

    #[test]
    fn original_address_skips_placeholder() {
        let mut company = Company::new("Acme".to_string());
        company.original_data = json!({"address": "\\N"});
        assert!(company.original_address().is_none());
        company.original_data = json!({"address": "Charlotte, NC"});
        assert_eq!(company.original_address(), Some("Charlotte, NC"));
    }

    #[test]
    fn filter_matches_all_parts() {
        let mut company = Company::new("Acme".to_string());
        company.city = Some("Charlotte".to_string());
        company.state = Some("NC".to_string());

        let filter = CompanyFilter {
            status: StatusFilter::NotCalled,
            city: Some("Charlotte".to_string()),
            state: None,
        };
        assert!(filter.matches(&company));

        company.disposition = Some(Disposition::Sold);
        assert!(!filter.matches(&company));

        let sold = CompanyFilter {
            status: StatusFilter::parse("sold").unwrap(),
            state: Some("SC".to_string()),
            ..Default::default()
        };
        assert!(!sold.matches(&company));
    }
}
