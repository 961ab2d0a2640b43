use crate::config::ScraperSettings;
use crate::models::{Event, EventOrigin};
use crate::sources::{
    clean_text, standardize_location, validate_required_fields, EventSource, FetchError, FetchReport,
    ParseError, SourceSetupError,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const CARD: &str = "div.event-card";
const TITLE: &str = "h2.event-title";
const DESCRIPTION: &str = "p.event-description";
const DATE: &str = "span.event-date";
const LOCATION: &str = "span.event-location";
const CATEGORY: &str = "span.event-category";
const LINK: &str = "a.event-link";

/// Accepted date layouts, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%B %d, %Y %I:%M %p"];

/// Minimum length of a cleaned description
const MIN_DESCRIPTION_LEN: usize = 10;

struct CardSelectors {
    card: Selector,
    title: Selector,
    description: Selector,
    date: Selector,
    location: Selector,
    category: Selector,
    link: Selector,
}

impl CardSelectors {
    fn new() -> Result<Self, SourceSetupError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| SourceSetupError::InvalidSelector(format!("{}: {}", css, e)))
        };

        Ok(Self {
            card: parse(CARD)?,
            title: parse(TITLE)?,
            description: parse(DESCRIPTION)?,
            date: parse(DATE)?,
            location: parse(LOCATION)?,
            category: parse(CATEGORY)?,
            link: parse(LINK)?,
        })
    }
}

/// Scrapes event cards from a community events page
pub struct CommunityWebScraper {
    client: reqwest::Client,
    url: String,
    selectors: CardSelectors,
}

impl CommunityWebScraper {
    pub fn new(settings: &ScraperSettings) -> Result<Self, SourceSetupError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            selectors: CardSelectors::new()?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parse every event card of a page
    ///
    /// Cards that fail to parse are collected as errors; the rest of the
    /// page is still processed.
    pub fn parse_document(&self, html: &str) -> FetchReport {
        let document = Html::parse_document(html);
        let mut report = FetchReport::default();

        for card in document.select(&self.selectors.card) {
            report.push(self.parse_card(card), |event| self.validate_event(event));
        }

        report
    }

    /// Parse a single `div.event-card` element
    pub fn parse_card(&self, card: ElementRef<'_>) -> Result<Event, ParseError> {
        let text_of = |selector: &Selector, css: &str| -> Result<String, ParseError> {
            card.select(selector)
                .next()
                .map(|element| element.text().collect::<String>())
                .ok_or_else(|| ParseError::MissingElement(css.to_string()))
        };

        let title = text_of(&self.selectors.title, TITLE)?;
        let description = text_of(&self.selectors.description, DESCRIPTION)?;
        let date = text_of(&self.selectors.date, DATE)?;
        let location = text_of(&self.selectors.location, LOCATION)?;
        let category = text_of(&self.selectors.category, CATEGORY)?;

        let url = card
            .select(&self.selectors.link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(String::from);

        Ok(Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: clean_text(Some(&title)),
            description: clean_text(Some(&description)),
            date: self.parse_date(&date)?,
            location: standardize_location(&location),
            category: category.trim().to_lowercase(),
            source: EventOrigin::CommunityWeb,
            url,
            image_url: None,
        })
    }
}

#[async_trait]
impl EventSource for CommunityWebScraper {
    fn name(&self) -> &'static str {
        EventOrigin::CommunityWeb.as_str()
    }

    async fn fetch_events(&self) -> Result<FetchReport, FetchError> {
        tracing::debug!("Fetching community page: {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url: self.url.clone(),
            });
        }

        let html = response.text().await?;
        Ok(self.parse_document(&html))
    }

    fn validate_event(&self, event: &Event) -> bool {
        if !validate_required_fields(event) {
            return false;
        }

        event.description.chars().count() >= MIN_DESCRIPTION_LEN
    }

    /// Dates without an offset are read as UTC
    fn parse_date(&self, raw: &str) -> Result<DateTime<FixedOffset>, ParseError> {
        let raw = raw.trim();

        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc().fixed_offset())
            .ok_or_else(|| ParseError::InvalidDate(raw.to_string()))
    }
}
