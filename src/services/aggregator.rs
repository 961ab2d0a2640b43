use crate::config::Settings;
use crate::core::EventProcessor;
use crate::models::UserPreferences;
use crate::sources::{
    CommunityWebScraper, EventSource, EventbriteSource, MeetupSource, SourceSetupError,
};
use std::future::Future;
use std::time::Duration;

/// Counters for one fetch-and-notify cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub notified: usize,
}

/// Drives the fetch → update → match → notify cycle
///
/// Sources, users and emails are all handled one after another.
pub struct Aggregator {
    sources: Vec<Box<dyn EventSource>>,
    processor: EventProcessor,
    users: Vec<UserPreferences>,
}

impl Aggregator {
    pub fn new(
        sources: Vec<Box<dyn EventSource>>,
        processor: EventProcessor,
        users: Vec<UserPreferences>,
    ) -> Self {
        Self {
            sources,
            processor,
            users,
        }
    }

    /// Build sources, processor and users from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, SourceSetupError> {
        let sources = build_sources(settings)?;
        let processor = EventProcessor::new(&settings.smtp, settings.email.clone());

        Ok(Self::new(sources, processor, settings.valid_users()))
    }

    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Fetch every source, replace the cache and notify matching users
    pub async fn run_cycle(&mut self) -> CycleSummary {
        tracing::info!("Fetching and processing events...");

        let mut events = Vec::new();
        for source in &self.sources {
            events.extend(source.fetch_or_empty().await);
        }

        let fetched = events.len();
        self.processor.update_events(events);

        let mut notified = 0;
        for user in &self.users {
            let matching = self.processor.get_matching_events(user);
            tracing::debug!("User {} matches {} events", user.user_id, matching.len());

            if !matching.is_empty()
                && user.wants_email()
                && self.processor.send_email_notification(user, &matching).await
            {
                notified += 1;
            }
        }

        tracing::info!("Cycle complete: {} events cached, {} users notified", fetched, notified);
        CycleSummary { fetched, notified }
    }

    /// Run a cycle whenever the cache is stale until `shutdown` resolves
    ///
    /// The cache starts empty, so the first check always runs a cycle.
    pub async fn run_until<F>(&mut self, poll_interval: Duration, max_age: chrono::Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            if self.processor.should_update_cache(max_age) {
                self.run_cycle().await;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down event aggregator");
                    break;
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    /// Run until Ctrl-C
    pub async fn run_forever(&mut self, poll_interval: Duration, max_age: chrono::Duration) {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        };

        self.run_until(poll_interval, max_age, shutdown).await;
    }
}

/// Construct the configured sources
///
/// The community page is always scraped. API sources are added when enabled,
/// and an enabled source without an API key is a startup error.
pub fn build_sources(settings: &Settings) -> Result<Vec<Box<dyn EventSource>>, SourceSetupError> {
    let mut sources: Vec<Box<dyn EventSource>> =
        vec![Box::new(CommunityWebScraper::new(&settings.scraper)?)];

    if settings.eventbrite.enabled {
        sources.push(Box::new(EventbriteSource::new(&settings.eventbrite)?));
    }

    if settings.meetup.enabled {
        sources.push(Box::new(MeetupSource::new(&settings.meetup)?));
    }

    Ok(sources)
}
