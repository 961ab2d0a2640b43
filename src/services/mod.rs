// Service exports
pub mod aggregator;
pub mod mailer;

pub use aggregator::{build_sources, Aggregator, CycleSummary};
pub use mailer::{Mailer, NotificationError, OutgoingEmail, SmtpMailer};
