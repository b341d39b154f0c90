use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Company;

/// Named integer settings stored next to the company list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Index of the last lead viewed in the dialer.
    DialerPosition,
    /// Number of call links opened.
    CallClicks,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DialerPosition => "dialerPosition",
            Self::CallClicks => "googleVoiceClicks",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dialerPosition" => Some(Self::DialerPosition),
            "googleVoiceClicks" => Some(Self::CallClicks),
            _ => None,
        }
    }

    pub fn all() -> &'static [SettingKey] {
        &[Self::DialerPosition, Self::CallClicks]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "lenient_int")]
    pub dialer_position: Option<i64>,
    #[serde(default, rename = "googleVoiceClicks", deserialize_with = "lenient_int")]
    pub call_clicks: Option<i64>,
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> Option<i64> {
        match key {
            SettingKey::DialerPosition => self.dialer_position,
            SettingKey::CallClicks => self.call_clicks,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: i64) {
        match key {
            SettingKey::DialerPosition => self.dialer_position = Some(value),
            SettingKey::CallClicks => self.call_clicks = Some(value),
        }
    }

    /// Keys with a value, in a stable order.
    pub fn present(&self) -> Vec<(SettingKey, i64)> {
        SettingKey::all()
            .iter()
            .filter_map(|key| self.get(*key).map(|v| (*key, v)))
            .collect()
    }
}

/// Older backups store counters as strings ("12"); accept both forms.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Full backup of the record set and settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub companies: Vec<Company>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl Snapshot {
    pub fn new(companies: Vec<Company>, settings: Settings) -> Self {
        Self {
            companies,
            settings,
            export_date: Some(Utc::now()),
            version: None,
        }
    }
}
