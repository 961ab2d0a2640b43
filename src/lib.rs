//! Community Events - aggregates events from community pages and event APIs
//!
//! Events are fetched from every configured source, cached in memory, matched
//! against each user's category and location preferences, and the matches are
//! emailed to the user.

pub mod config;
pub mod core;
pub mod models;
pub mod services;
pub mod sources;

// Re-export commonly used types
pub use crate::config::Settings;
pub use crate::core::{Delivery, EventProcessor, SkipReason};
pub use crate::models::{Event, EventOrigin, UserPreferences};
pub use crate::services::{Aggregator, Mailer};
pub use crate::sources::{EventSource, FetchError, FetchReport, ParseError};
