// Model exports
pub mod domain;

pub use domain::{Event, EventOrigin, ModelError, UserPreferences, parse_iso8601};
