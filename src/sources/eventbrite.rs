use crate::config::ApiSourceSettings;
use crate::models::{parse_iso8601, Event, EventOrigin};
use crate::sources::api::{record_id, required_str, str_at, ApiClient, SourceSetupError};
use crate::sources::{
    clean_text, standardize_location, validate_required_fields, EventSource, FetchError, FetchReport,
    ParseError,
};
use async_trait::async_trait;
use serde_json::Value;

const BASE_URL: &str = "https://www.eventbriteapi.com/v3";
const API_KEY_VAR: &str = "EVENTBRITE_API_KEY";
const DOMAIN_MARKER: &str = "eventbrite";

/// Event source for the Eventbrite API
pub struct EventbriteSource {
    api: ApiClient,
}

impl EventbriteSource {
    pub fn new(settings: &ApiSourceSettings) -> Result<Self, SourceSetupError> {
        Ok(Self {
            api: ApiClient::new(settings, API_KEY_VAR, BASE_URL)?,
        })
    }

    /// Map one raw Eventbrite record onto an [`Event`]
    pub fn parse_record(&self, record: &Value) -> Result<Event, ParseError> {
        let id = record_id(record)?;
        let title = required_str(record, "/name/text")?;
        let description = required_str(record, "/description/text")?;

        // Prefer the local start time, fall back to UTC
        let date = match (str_at(record, "/start/local"), str_at(record, "/start/utc")) {
            (Some(raw), _) | (None, Some(raw)) => {
                parse_iso8601(raw).ok_or_else(|| ParseError::InvalidDate(raw.to_string()))?
            }
            (None, None) => return Err(ParseError::MissingField("/start".to_string())),
        };

        let venue = str_at(record, "/venue/name").unwrap_or("TBD");
        let city = str_at(record, "/venue/address/city").unwrap_or("Unknown");
        let category = str_at(record, "/category/name").unwrap_or("Other");

        Ok(Event {
            id,
            title: clean_text(Some(title)),
            description: clean_text(Some(description)),
            date,
            location: standardize_location(&format!("{} - {}", venue, city)),
            category: category.trim().to_lowercase(),
            source: EventOrigin::Eventbrite,
            url: str_at(record, "/url").map(String::from),
            image_url: str_at(record, "/logo/url").map(String::from),
        })
    }
}

#[async_trait]
impl EventSource for EventbriteSource {
    fn name(&self) -> &'static str {
        EventOrigin::Eventbrite.as_str()
    }

    async fn fetch_events(&self) -> Result<FetchReport, FetchError> {
        let records = self
            .api
            .get_events(
                "/events/search/",
                &[("expand", "venue,category"), ("status", "live"), ("sort_by", "date")],
            )
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
