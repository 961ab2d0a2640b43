use crate::config::{EmailSettings, SmtpSettings};
use crate::core::formatting::format_email_body;
use crate::models::{Event, UserPreferences};
use crate::services::mailer::{Mailer, NotificationError, OutgoingEmail, SmtpMailer};
use chrono::{DateTime, Duration, Utc};

/// Why a notification was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoEvents,
    NoRecipient,
}

/// Outcome of a notification attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped(SkipReason),
}

/// Holds the latest batch of fetched events and notifies users about matches
///
/// The cache is replaced wholesale on every update; nothing is merged or
/// deduplicated between cycles.
pub struct EventProcessor {
    events: Vec<Event>,
    last_update: Option<DateTime<Utc>>,
    mailer: Box<dyn Mailer>,
    sender: String,
    email: EmailSettings,
}

impl EventProcessor {
    /// Create a processor that delivers over SMTP
    pub fn new(smtp: &SmtpSettings, email: EmailSettings) -> Self {
        Self::with_mailer(Box::new(SmtpMailer::new(smtp)), smtp.username.clone(), email)
    }

    /// Create a processor with a custom mailer
    pub fn with_mailer(mailer: Box<dyn Mailer>, sender: impl Into<String>, email: EmailSettings) -> Self {
        Self {
            events: Vec::new(),
            last_update: None,
            mailer,
            sender: sender.into(),
            email,
        }
    }

    /// Replace the cached events and stamp the update time
    pub fn update_events(&mut self, events: Vec<Event>) {
        self.events = events;
        self.last_update = Some(Utc::now());
    }

    /// Cached events matching the given preferences, in cache order
    pub fn get_matching_events(&self, preferences: &UserPreferences) -> Vec<Event> {
        if self.events.is_empty() {
            return Vec::new();
        }

        self.events
            .iter()
            .filter(|event| preferences.matches_event(event))
            .cloned()
            .collect()
    }

    /// Check whether the cache is missing or older than `max_age`
    pub fn should_update_cache(&self, max_age: Duration) -> bool {
        self.should_update_cache_at(Utc::now(), max_age)
    }

    /// Same as [`EventProcessor::should_update_cache`], evaluated at `now`
    pub fn should_update_cache_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.last_update {
            None => true,
            Some(last_update) => now - last_update > max_age,
        }
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn cached_len(&self) -> usize {
        self.events.len()
    }

    /// Email the given events to the user
    ///
    /// Nothing is sent, and the mailer is never touched, when `events` is
    /// empty or the user has no address.
    pub async fn notify(
        &self,
        preferences: &UserPreferences,
        events: &[Event],
    ) -> Result<Delivery, NotificationError> {
        if events.is_empty() {
            return Ok(Delivery::Skipped(SkipReason::NoEvents));
        }

        let Some(recipient) = preferences.email.as_deref().filter(|e| !e.is_empty()) else {
            return Ok(Delivery::Skipped(SkipReason::NoRecipient));
        };

        let email = OutgoingEmail {
            from: self.sender.clone(),
            to: recipient.to_string(),
            subject: self.email.subject.clone(),
            html_body: format_email_body(events, self.email.escape_html),
        };

        self.mailer.send(email).await?;

        tracing::info!("Sent {} events to user {}", events.len(), preferences.user_id);
        Ok(Delivery::Sent)
    }

    /// Email the given events to the user, logging and swallowing failures
    ///
    /// Returns true only when a message was handed to the mailer successfully.
    pub async fn send_email_notification(&self, preferences: &UserPreferences, events: &[Event]) -> bool {
        match self.notify(preferences, events).await {
            Ok(Delivery::Sent) => true,
            Ok(Delivery::Skipped(reason)) => {
                tracing::debug!("Skipping notification for user {}: {:?}", preferences.user_id, reason);
                false
            }
            Err(e) => {
                tracing::error!("Error sending email notification to user {}: {}", preferences.user_id, e);
                false
            }
        }
    }
}
