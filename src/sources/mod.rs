//! Event sources
//!
//! Each source turns one external feed into normalized [`Event`]s. A fetch
//! either fails as a whole ([`FetchError`]) or returns a [`FetchReport`] that
//! carries the events that parsed and validated, plus the per-item errors
//! that were skipped along the way.

pub mod api;
pub mod eventbrite;
pub mod meetup;
pub mod web_scraper;

pub use api::{ApiClient, SourceSetupError};
pub use eventbrite::EventbriteSource;
pub use meetup::MeetupSource;
pub use web_scraper::CommunityWebScraper;

use crate::models::Event;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// Errors that abort a whole fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Errors that skip a single card or record
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Unable to parse date: {0}")]
    InvalidDate(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Date parsing not implemented: {0}")]
    Unsupported(&'static str),
}

/// Result of one fetch that reached the source
#[derive(Debug, Default)]
pub struct FetchReport {
    pub events: Vec<Event>,
    /// Items that failed to parse and were skipped
    pub errors: Vec<ParseError>,
    /// Items that parsed but failed validation
    pub rejected: usize,
}

impl FetchReport {
    /// Record the outcome of parsing one item
    pub fn push(&mut self, parsed: Result<Event, ParseError>, is_valid: impl FnOnce(&Event) -> bool) {
        match parsed {
            Ok(event) if is_valid(&event) => self.events.push(event),
            Ok(event) => {
                tracing::debug!("Rejected invalid event {:?}", event.title);
                self.rejected += 1;
            }
            Err(e) => self.errors.push(e),
        }
    }
}

/// A feed of community events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Source tag used in logs
    fn name(&self) -> &'static str;

    /// Fetch, parse and validate the current events of this source
    async fn fetch_events(&self) -> Result<FetchReport, FetchError>;

    /// Check that an event is complete enough to keep
    fn validate_event(&self, event: &Event) -> bool {
        validate_required_fields(event)
    }

    /// Parse a source-specific date string
    fn parse_date(&self, _raw: &str) -> Result<DateTime<FixedOffset>, ParseError> {
        Err(ParseError::Unsupported(self.name()))
    }

    /// Fetch events, logging failures instead of returning them
    async fn fetch_or_empty(&self) -> Vec<Event> {
        match self.fetch_events().await {
            Ok(report) => {
                for error in &report.errors {
                    tracing::warn!("Error parsing {} event: {}", self.name(), error);
                }
                tracing::info!(
                    "Fetched {} events from {} ({} skipped, {} rejected)",
                    report.events.len(),
                    self.name(),
                    report.errors.len(),
                    report.rejected
                );
                report.events
            }
            Err(e) => {
                tracing::error!("Error fetching {} events: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}

/// Base validation: title and location must be present
///
/// The date is always present by construction.
pub fn validate_required_fields(event: &Event) -> bool {
    !event.title.trim().is_empty() && !event.location.trim().is_empty()
}

/// Normalize a location for matching
pub fn standardize_location(location: &str) -> String {
    location.trim().to_lowercase()
}

/// Collapse whitespace runs into single spaces and trim the ends
pub fn clean_text(text: Option<&str>) -> String {
    text.map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}
