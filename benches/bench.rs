// Criterion benchmarks for Community Events

use chrono::{TimeZone, Utc};
use community_events::config::EmailSettings;
use community_events::core::{format_email_body, matches_preferences, EventProcessor};
use community_events::services::{Mailer, NotificationError, OutgoingEmail};
use community_events::{Event, EventOrigin, UserPreferences};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const CATEGORIES: &[&str] = &["music", "arts", "technology", "sports", "food"];
const LOCATIONS: &[&str] = &["downtown", "midtown", "uptown", "harbor"];

struct NullMailer;

#[async_trait::async_trait]
impl Mailer for NullMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), NotificationError> {
        Ok(())
    }
}

fn create_event(id: usize) -> Event {
    Event {
        id: id.to_string(),
        title: format!("Event {}", id),
        description: "Monthly gathering for the local community & friends".to_string(),
        date: Utc
            .with_ymd_and_hms(2024, 1, 1 + (id % 28) as u32, 18, 30, 0)
            .unwrap()
            .fixed_offset(),
        location: LOCATIONS[id % LOCATIONS.len()].to_string(),
        category: CATEGORIES[id % CATEGORIES.len()].to_string(),
        source: EventOrigin::CommunityWeb,
        url: Some(format!("http://example.com/event{}", id)),
        image_url: None,
    }
}

fn create_preferences() -> UserPreferences {
    let mut preferences = UserPreferences::new("current_user");
    preferences.categories = vec!["music".to_string(), "arts".to_string(), "technology".to_string()];
    preferences.locations = vec!["downtown".to_string(), "midtown".to_string()];
    preferences
}

fn bench_matches_preferences(c: &mut Criterion) {
    let event = create_event(1);
    let preferences = create_preferences();

    c.bench_function("matches_preferences", |b| {
        b.iter(|| matches_preferences(black_box(&event), black_box(&preferences)));
    });
}

fn bench_matching(c: &mut Criterion) {
    let preferences = create_preferences();

    let mut group = c.benchmark_group("matching");

    for event_count in [10, 50, 100, 500, 1000].iter() {
        let mut processor =
            EventProcessor::with_mailer(Box::new(NullMailer), "bench@example.com", EmailSettings::default());
        processor.update_events((0..*event_count).map(create_event).collect());

        group.bench_with_input(
            BenchmarkId::new("get_matching_events", event_count),
            event_count,
            |b, _| {
                b.iter(|| processor.get_matching_events(black_box(&preferences)));
            },
        );
    }

    group.finish();
}

fn bench_email_body(c: &mut Criterion) {
    let events: Vec<Event> = (0..20).map(create_event).collect();

    let mut group = c.benchmark_group("email_body");
    group.bench_function("escaped_20_events", |b| {
        b.iter(|| format_email_body(black_box(&events), true));
    });
    group.bench_function("raw_20_events", |b| {
        b.iter(|| format_email_body(black_box(&events), false));
    });
    group.finish();
}

criterion_group!(benches, bench_matches_preferences, bench_matching, bench_email_body);

criterion_main!(benches);
