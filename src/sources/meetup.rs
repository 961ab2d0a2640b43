use crate::config::ApiSourceSettings;
use crate::models::{Event, EventOrigin};
use crate::sources::api::{record_id, required_str, str_at, ApiClient, SourceSetupError};
use crate::sources::{
    clean_text, standardize_location, validate_required_fields, EventSource, FetchError, FetchReport,
    ParseError,
};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;

const BASE_URL: &str = "https://api.meetup.com";
const API_KEY_VAR: &str = "MEETUP_API_KEY";
const DOMAIN_MARKER: &str = "meetup.com";

/// Event source for the Meetup.com API
pub struct MeetupSource {
    api: ApiClient,
}

impl MeetupSource {
    pub fn new(settings: &ApiSourceSettings) -> Result<Self, SourceSetupError> {
        Ok(Self {
            api: ApiClient::new(settings, API_KEY_VAR, BASE_URL)?,
        })
    }

    /// Map one raw Meetup record onto an [`Event`]
    pub fn parse_record(&self, record: &Value) -> Result<Event, ParseError> {
        let id = record_id(record)?;
        let title = required_str(record, "/name")?;

        // Epoch milliseconds
        let millis = record
            .get("time")
            .and_then(Value::as_i64)
            .ok_or_else(|| ParseError::MissingField("/time".to_string()))?;
        let date = DateTime::from_timestamp_millis(millis)
            .ok_or(ParseError::InvalidTimestamp(millis))?
            .fixed_offset();

        let venue = str_at(record, "/venue/name").unwrap_or("TBD");
        let city = str_at(record, "/venue/city").unwrap_or("Unknown");
        let category = str_at(record, "/group/category/name").unwrap_or("Other");

        Ok(Event {
            id,
            title: clean_text(Some(title)),
            description: clean_text(str_at(record, "/description")),
            date,
            location: standardize_location(&format!("{} - {}", venue, city)),
            category: category.trim().to_lowercase(),
            source: EventOrigin::Meetup,
            url: str_at(record, "/link").map(String::from),
            image_url: str_at(record, "/group/key_photo/photo_link").map(String::from),
        })
    }
}

#[async_trait]
impl EventSource for MeetupSource {
    fn name(&self) -> &'static str {
        EventOrigin::Meetup.as_str()
    }

    async fn fetch_events(&self) -> Result<FetchReport, FetchError> {
        let records = self
            .api
            .get_events("/find/upcoming_events", &[("page", "20"), ("fields", "group_key_photo")])
            .await?;

        let mut report = FetchReport::default();
        for record in &records {
            report.push(self.parse_record(record), |event| self.validate_event(event));
            self.api.throttle().await;
        }

        Ok(report)
    }

    fn validate_event(&self, event: &Event) -> bool {
        if !validate_required_fields(event) {
            return false;
        }

        event
            .url
            .as_deref()
            .is_some_and(|url| url.contains(DOMAIN_MARKER))
    }
}
