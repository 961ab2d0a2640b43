// Core event processing exports
pub mod filters;
pub mod formatting;
pub mod processor;

pub use filters::matches_preferences;
pub use formatting::{format_email_body, EMAIL_DATE_FORMAT, EMAIL_SUBJECT};
pub use processor::{Delivery, EventProcessor, SkipReason};
