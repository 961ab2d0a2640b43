// Unit tests for Community Events

use chrono::{Duration, TimeZone, Utc};
use community_events::core::{format_email_body, matches_preferences, EventProcessor};
use community_events::config::EmailSettings;
use community_events::services::{Mailer, NotificationError, OutgoingEmail};
use community_events::sources::{clean_text, standardize_location, validate_required_fields};
use community_events::{Event, EventOrigin, UserPreferences};

struct NullMailer;

#[async_trait::async_trait]
impl Mailer for NullMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), NotificationError> {
        Ok(())
    }
}

fn create_event(id: &str, category: &str, location: &str) -> Event {
    Event {
        id: id.to_string(),
        title: format!("Event {}", id),
        description: "A community gathering".to_string(),
        date: Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap().fixed_offset(),
        location: location.to_string(),
        category: category.to_string(),
        source: EventOrigin::CommunityWeb,
        url: None,
        image_url: None,
    }
}

fn create_preferences(categories: &[&str], locations: &[&str]) -> UserPreferences {
    let mut preferences = UserPreferences::new("test_user");
    preferences.categories = categories.iter().map(|c| c.to_string()).collect();
    preferences.locations = locations.iter().map(|l| l.to_string()).collect();
    preferences
}

fn create_processor() -> EventProcessor {
    EventProcessor::with_mailer(Box::new(NullMailer), "sender@example.com", EmailSettings::default())
}

#[test]
fn test_clean_text() {
    assert_eq!(clean_text(Some("  Hello   World  ")), "Hello World");
    assert_eq!(clean_text(Some("line\n\tbreak")), "line break");
    assert_eq!(clean_text(Some("")), "");
    assert_eq!(clean_text(None), "");
}

#[test]
fn test_standardize_location() {
    assert_eq!(standardize_location("  Downtown  "), "downtown");
    assert_eq!(standardize_location("MIDTOWN"), "midtown");
}

#[test]
fn test_required_fields() {
    assert!(validate_required_fields(&create_event("1", "music", "downtown")));
    assert!(!validate_required_fields(&create_event("2", "music", "  ")));

    let mut untitled = create_event("3", "music", "downtown");
    untitled.title = String::new();
    assert!(!validate_required_fields(&untitled));
}

#[test]
fn test_empty_preferences_match_everything() {
    let preferences = create_preferences(&[], &[]);

    assert!(matches_preferences(&create_event("1", "music", "downtown"), &preferences));
    assert!(matches_preferences(&create_event("2", "", ""), &preferences));
}

#[test]
fn test_category_and_location_must_both_match() {
    let preferences = create_preferences(&["music", "arts"], &["downtown"]);

    assert!(matches_preferences(&create_event("1", "music", "downtown"), &preferences));
    assert!(!matches_preferences(&create_event("2", "sports", "downtown"), &preferences));
    assert!(!matches_preferences(&create_event("3", "music", "uptown"), &preferences));
}

#[test]
fn test_matching_is_exact() {
    let preferences = create_preferences(&["music"], &["downtown"]);

    assert!(!matches_preferences(&create_event("1", "Music", "downtown"), &preferences));
    assert!(!matches_preferences(&create_event("2", "music", "downtown tech hub"), &preferences));
}

#[test]
fn test_matching_preserves_cache_order() {
    let mut processor = create_processor();
    processor.update_events(vec![
        create_event("1", "music", "downtown"),
        create_event("2", "sports", "downtown"),
        create_event("3", "music", "midtown"),
        create_event("4", "music", "downtown"),
    ]);

    let matches = processor.get_matching_events(&create_preferences(&["music"], &[]));
    let ids: Vec<_> = matches.iter().map(|e| e.id.as_str()).collect();

    assert_eq!(ids, vec!["1", "3", "4"]);
}

#[test]
fn test_update_replaces_cache() {
    let mut processor = create_processor();
    processor.update_events(vec![create_event("1", "music", "downtown")]);
    processor.update_events(vec![create_event("2", "arts", "midtown"), create_event("3", "arts", "midtown")]);

    assert_eq!(processor.cached_len(), 2);

    let everything = processor.get_matching_events(&create_preferences(&[], &[]));
    assert!(everything.iter().all(|e| e.id != "1"));
}

#[test]
fn test_cache_staleness() {
    let mut processor = create_processor();
    assert!(processor.should_update_cache(Duration::hours(1)));

    processor.update_events(vec![]);
    let updated = processor.last_update().unwrap();

    assert!(!processor.should_update_cache_at(updated + Duration::minutes(30), Duration::hours(1)));
    assert!(!processor.should_update_cache_at(updated + Duration::hours(1), Duration::hours(1)));
    assert!(processor.should_update_cache_at(updated + Duration::minutes(61), Duration::hours(1)));
}

#[test]
fn test_email_body_lists_every_event() {
    let mut event = create_event("1", "music", "downtown");
    event.url = Some("http://example.com/event1".to_string());
    let events = vec![event, create_event("2", "arts", "midtown")];

    let body = format_email_body(&events, true);

    assert!(body.contains("Event 1"));
    assert!(body.contains("Event 2"));
    assert!(body.contains("January 01, 2024 06:30 PM"));
    assert!(body.contains("http://example.com/event1"));
}

#[test]
fn test_event_map_round_trip() {
    let mut event = create_event("1", "music", "downtown");
    event.image_url = Some("http://example.com/img.jpg".to_string());

    let restored = Event::from_map(event.to_map()).unwrap();
    assert_eq!(restored, event);
}

#[test]
fn test_notify_skips_without_recipient() {
    use community_events::{Delivery, SkipReason};

    let processor = create_processor();
    let events = vec![create_event("1", "music", "downtown")];
    let preferences = create_preferences(&[], &[]);

    let delivery = tokio_test::block_on(processor.notify(&preferences, &events)).unwrap();
    assert_eq!(delivery, Delivery::Skipped(SkipReason::NoRecipient));

    let delivery = tokio_test::block_on(processor.notify(&preferences, &[])).unwrap();
    assert_eq!(delivery, Delivery::Skipped(SkipReason::NoEvents));
}
