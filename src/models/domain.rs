use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use validator::Validate;

/// Errors raised when converting models to and from key/value maps
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where an event was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    Eventbrite,
    Meetup,
    CommunityWeb,
}

impl EventOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOrigin::Eventbrite => "eventbrite",
            EventOrigin::Meetup => "meetup",
            EventOrigin::CommunityWeb => "community_web",
        }
    }
}

impl std::fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single community event, normalized from one of the sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(with = "iso_datetime")]
    pub date: DateTime<FixedOffset>,
    pub location: String,
    pub category: String,
    pub source: EventOrigin,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Event {
    /// Convert the event into a plain key/value map.
    ///
    /// The date is written as an RFC 3339 string.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Rebuild an event from a key/value map produced by [`Event::to_map`]
    /// or by hand. Naive ISO-8601 dates are read as UTC.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

/// Parse an ISO-8601 timestamp, with or without a UTC offset.
///
/// Timestamps without an offset are taken to be UTC.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

mod iso_datetime {
    use chrono::{DateTime, FixedOffset};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso8601(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 date: {}", raw)))
    }
}

/// Per-user event filters and notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserPreferences {
    #[validate(length(min = 1))]
    pub user_id: String,
    /// Empty means any category
    #[serde(default)]
    pub categories: Vec<String>,
    /// Empty means any location
    #[serde(default)]
    pub locations: Vec<String>,
    /// Kilometres. Not used by matching yet.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    #[serde(default = "default_notification_preferences")]
    pub notification_preferences: BTreeMap<String, bool>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

fn default_max_distance() -> f64 { 50.0 }

fn default_notification_preferences() -> BTreeMap<String, bool> {
    BTreeMap::from([("email".to_string(), true), ("dashboard".to_string(), true)])
}

impl UserPreferences {
    /// Preferences with no filters and the default notification channels
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            categories: Vec::new(),
            locations: Vec::new(),
            max_distance: default_max_distance(),
            notification_preferences: default_notification_preferences(),
            email: None,
        }
    }

    /// Check if an event passes the category and location filters
    pub fn matches_event(&self, event: &Event) -> bool {
        crate::core::filters::matches_preferences(event, self)
    }

    /// Whether the user asked for email notifications
    pub fn wants_email(&self) -> bool {
        self.notification_preferences
            .get("email")
            .copied()
            .unwrap_or(false)
    }

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}
