use community_events::config::{LoggingSettings, Settings};
use community_events::services::Aggregator;
use tracing::{error, info, warn};

fn init_logging(logging: &LoggingSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "json" => subscriber.json().init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.init(),
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    match &settings {
        Ok(settings) => init_logging(&settings.logging),
        Err(_) => init_logging(&LoggingSettings::default()),
    }

    info!("Starting the Community Event Aggregator...");

    let settings = settings.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    let mut aggregator = Aggregator::from_settings(&settings).unwrap_or_else(|e| {
        error!("Failed to initialize event sources: {}", e);
        panic!("Source configuration error: {}", e);
    });

    info!("Event sources initialized: {:?}", aggregator.source_names());

    if aggregator.user_count() == 0 {
        warn!("No valid users configured, events will be fetched but nobody is notified");
    }

    aggregator
        .run_forever(settings.poll_interval(), settings.max_cache_age())
        .await;
}
