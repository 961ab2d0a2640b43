use crate::core::formatting::EMAIL_SUBJECT;
use crate::models::UserPreferences;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub eventbrite: ApiSourceSettings,
    #[serde(default)]
    pub meetup: ApiSourceSettings,
    #[serde(default)]
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub users: Vec<UserPreferences>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    #[serde(default = "default_community_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            url: default_community_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings shared by the Eventbrite and Meetup sources
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSourceSettings {
    #[serde(default)]
    pub enabled: bool,
    pub api_key: Option<String>,
    /// Falls back to the public API endpoint of the source
    pub base_url: Option<String>,
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSourceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: None,
            throttle_ms: default_throttle_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Escape event text before it is interpolated into the HTML body
    #[serde(default = "default_true")]
    pub escape_html: bool,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            escape_html: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_cache_age_hours")]
    pub max_cache_age_hours: i64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_cache_age_hours: default_max_cache_age_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_community_url() -> String { "http://example.com/events".to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_timeout_secs() -> u64 { 30 }
fn default_throttle_ms() -> u64 { 100 }
fn default_smtp_host() -> String { "smtp.gmail.com".to_string() }
fn default_smtp_port() -> u16 { 587 }
fn default_subject() -> String { EMAIL_SUBJECT.to_string() }
fn default_true() -> bool { true }
fn default_poll_interval_secs() -> u64 { 60 }
fn default_max_cache_age_hours() -> i64 { 1 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Flat environment variables that override nested settings keys
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("COMMUNITY_EVENTS_URL", "scraper.url"),
    ("SMTP_HOST", "smtp.host"),
    ("SMTP_PORT", "smtp.port"),
    ("SMTP_USERNAME", "smtp.username"),
    ("SMTP_PASSWORD", "smtp.password"),
    ("EVENTBRITE_API_KEY", "eventbrite.api_key"),
    ("MEETUP_API_KEY", "meetup.api_key"),
];

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with EVENTS__)
    /// 5. Flat variables such as SMTP_HOST or MEETUP_API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., EVENTS__SMTP__PORT -> smtp.port
            .add_source(
                Environment::with_prefix("EVENTS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("EVENTS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Configured users that pass validation
    ///
    /// Invalid entries are logged and left out.
    pub fn valid_users(&self) -> Vec<UserPreferences> {
        self.users
            .iter()
            .filter(|user| match user.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Skipping invalid user preferences {:?}: {}", user.user_id, e);
                    false
                }
            })
            .cloned()
            .collect()
    }

    pub fn max_cache_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.scheduler.max_cache_age_hours)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scheduler.poll_interval_secs)
    }
}

/// Apply the flat environment variables on top of the loaded config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}
